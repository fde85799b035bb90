use crate::battle::rng::RandomSource;
use crate::pokemon::Combatant;
use schema::{MoveCategory, MoveData, PokemonType};

/// Same-type attack bonus.
pub const STAB_MULTIPLIER: f64 = 1.5;

/// Product of the chart multipliers against every type of the defender.
pub fn type_effectiveness(move_type: PokemonType, defender: &Combatant) -> f64 {
    PokemonType::effectiveness_against(move_type, &defender.types)
}

pub fn stab_multiplier(move_type: PokemonType, attacker: &Combatant) -> f64 {
    if move_type != PokemonType::Typeless && attacker.has_type(move_type) {
        STAB_MULTIPLIER
    } else {
        1.0
    }
}

/// Roll accuracy. A draw in `1..=100` must not exceed the move's accuracy.
pub fn move_hits(move_data: &MoveData, rng: &mut dyn RandomSource) -> bool {
    rng.chance(move_data.accuracy, "accuracy")
}

/// Attacking and defending stat values for the move's category, stage-adjusted.
fn attack_defense_pair(attacker: &Combatant, defender: &Combatant, category: MoveCategory) -> (u16, u16) {
    match category {
        MoveCategory::Special => (
            attacker.stats.special_attack.effective(),
            defender.stats.special_defense.effective(),
        ),
        MoveCategory::Physical | MoveCategory::Status => (
            attacker.stats.attack.effective(),
            defender.stats.defense.effective(),
        ),
    }
}

/// `floor(power * attack / defense * effectiveness * stab * variance)`.
///
/// At least 1 whenever the move has power and the matchup is not immune;
/// exactly 0 otherwise. `variance` is expected in `[0.85, 1.0]`.
pub fn calculate_damage(
    attacker: &Combatant,
    defender: &Combatant,
    move_data: &MoveData,
    effectiveness: f64,
    variance: f64,
) -> u16 {
    let power = match move_data.power {
        Some(power) if power > 0 => power,
        _ => return 0,
    };
    if effectiveness <= 0.0 {
        return 0;
    }

    let (attack, defense) = attack_defense_pair(attacker, defender, move_data.category);
    let ratio = attack as f64 / defense.max(1) as f64;
    let stab = stab_multiplier(move_data.move_type, attacker);
    let raw = (power as f64 * ratio * effectiveness * stab * variance).floor();

    raw.clamp(1.0, u16::MAX as f64) as u16
}
