use crate::battle::decision::{DecisionProvider, Intent, ScriptedProvider};
use crate::battle::engine::Battle;
use crate::battle::rng::ScriptedRng;
use crate::battle::state::{BattleEvent, BattleState};
use crate::config::BattleConfig;
use crate::dex::Dex;
use crate::errors::BattleResult;
use crate::player::{CombatantId, Side, SideId};
use crate::pokemon::Combatant;
use schema::StatusKind;

/// A builder for creating test combatants with common defaults.
///
/// # Example
/// ```ignore
/// let pikachu = TestCombatantBuilder::new("Pikachu", 50)
///     .with_moves(&["Thunderbolt"])
///     .with_status(StatusKind::Paralysis)
///     .build();
/// ```
pub struct TestCombatantBuilder {
    species: String,
    level: u8,
    moves: Vec<String>,
    status: Option<StatusKind>,
    current_hp: Option<u16>,
}

impl TestCombatantBuilder {
    /// Creates a new builder for a given species and level. Knows Tackle by default.
    pub fn new(species: &str, level: u8) -> Self {
        Self {
            species: species.to_string(),
            level,
            moves: vec!["Tackle".to_string()],
            status: None,
            current_hp: None,
        }
    }

    pub fn with_moves(mut self, moves: &[&str]) -> Self {
        self.moves = moves.iter().map(|name| name.to_string()).collect();
        self
    }

    /// The listener for this status is attached when the battle starts.
    pub fn with_status(mut self, status: StatusKind) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn build(self) -> Combatant {
        let dex = match Dex::standard() {
            Ok(dex) => dex,
            Err(err) => panic!("Failed to load the standard dex: {}", err),
        };
        let move_names: Vec<&str> = self.moves.iter().map(String::as_str).collect();
        let mut combatant = match Combatant::build(&dex, &self.species, self.level, &move_names) {
            Ok(combatant) => combatant,
            Err(err) => panic!("Failed to build {}: {}", self.species, err),
        };
        if let Some(hp) = self.current_hp {
            combatant.set_hp(hp);
        }
        if let Some(status) = self.status {
            assert!(combatant.apply_status(status), "{} already has a status", self.species);
        }
        combatant
    }
}

/// Creates a standard 1v1 battle state for testing.
pub fn create_test_battle(p1_combatant: Combatant, p2_combatant: Combatant) -> BattleState {
    create_team_battle(vec![p1_combatant], vec![p2_combatant])
}

pub fn create_team_battle(p1_team: Vec<Combatant>, p2_team: Vec<Combatant>) -> BattleState {
    let player1 = Side::new(SideId::Player1, "Red", p1_team).unwrap();
    let player2 = Side::new(SideId::Player2, "Blue", p2_team).unwrap();
    BattleState::new("test_battle", player1, player2)
}

/// A `ScriptedRng` with a long list of middling values (50).
/// Useful for tests where the specific outcome is not important, preventing panics from exhaustion.
pub fn predictable_rng() -> ScriptedRng {
    ScriptedRng::new_for_test(vec![50; 100])
}

/// `values` first, then the predictable filler.
pub fn scripted_rng(values: &[u32]) -> ScriptedRng {
    let mut outcomes = values.to_vec();
    outcomes.extend([50; 100]);
    ScriptedRng::new_for_test(outcomes)
}

/// A battle driven by scripted intents for both sides. Once a script runs
/// out, the side plays its first legal choice.
pub fn scripted_battle(
    state: BattleState,
    p1_intents: Vec<Intent>,
    p2_intents: Vec<Intent>,
    rng: ScriptedRng,
) -> Battle {
    battle_with_providers(
        state,
        Box::new(ScriptedProvider::new(p1_intents)),
        Box::new(ScriptedProvider::new(p2_intents)),
        rng,
        BattleConfig::default(),
    )
}

pub fn battle_with_providers(
    state: BattleState,
    player1: Box<dyn DecisionProvider>,
    player2: Box<dyn DecisionProvider>,
    rng: ScriptedRng,
    config: BattleConfig,
) -> Battle {
    Battle::new(state, player1, player2, Box::new(rng), config)
}

pub fn p1(team_index: usize) -> CombatantId {
    CombatantId::new(SideId::Player1, team_index)
}

pub fn p2(team_index: usize) -> CombatantId {
    CombatantId::new(SideId::Player2, team_index)
}

/// The hp/fainted invariant, checked for every combatant on both sides.
pub fn assert_hp_invariants(state: &BattleState) {
    for (id, combatant) in state.all_combatants() {
        assert!(combatant.hp() <= combatant.hp_max(), "{id:?} over max hp");
        assert_eq!(combatant.hp() == 0, combatant.is_fainted(), "{id:?} hp/faint mismatch");
    }
}

pub fn count_events(events: &[BattleEvent], predicate: impl Fn(&BattleEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

/// Helper function to assert that a Result is Ok and return the value.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
