use crate::battle::actions::ActionKind;
use crate::battle::decision::Intent;
use crate::errors::BattleStateError;
use crate::player::{CombatantId, Side, SideId};
use crate::pokemon::Combatant;
use schema::{StatKind, StatusKind};
use serde::{Deserialize, Serialize};

/// Orchestrator state machine.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    /// Built but lead switch-ins not yet reported.
    NotStarted,
    AwaitingChoices,
    Draining,
    TurnBoundary,
    BattleOver,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// One side has no combatant left standing.
    Knockout,
    /// Both sides ran out in the same resolution step.
    DoubleKnockout,
    /// The configured turn cap was reached.
    TurnLimit,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleOutcome {
    /// `None` for a draw.
    pub winner: Option<SideId>,
    pub turns: u32,
    pub reason: EndReason,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    BattleStarted,
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded {
        turn_number: u32,
    },

    // Choices
    ChoiceMade {
        side: SideId,
        intent: Intent,
    },
    ChoiceRejected {
        side: SideId,
        reason: String,
    },

    // Switching
    CombatantSwitched {
        side: SideId,
        previous: Option<usize>,
        incoming: CombatantId,
    },

    // Moves
    MoveUsed {
        user: CombatantId,
        move_name: String,
    },
    MoveMissed {
        user: CombatantId,
        move_name: String,
    },
    MoveHadNoEffect {
        user: CombatantId,
        target: CombatantId,
        move_name: String,
    },
    AttackTypeEffectiveness {
        multiplier: f64,
    },
    MoveCancelled {
        user: CombatantId,
        reason: ActionFailureReason,
    },

    // Damage and Healing
    DamageDealt {
        target: CombatantId,
        damage: u16,
        remaining_hp: u16,
    },
    Healed {
        target: CombatantId,
        amount: u16,
        new_hp: u16,
    },
    Fainted {
        target: CombatantId,
    },

    // Stat Changes
    StatStageChanged {
        target: CombatantId,
        stat: StatKind,
        old_stage: i8,
        new_stage: i8,
    },
    StatChangeBlocked {
        target: CombatantId,
        stat: StatKind,
        rising: bool,
    },

    // Status
    StatusApplied {
        target: CombatantId,
        status: StatusKind,
    },
    StatusCured {
        target: CombatantId,
        status: StatusKind,
    },
    StatusDamage {
        target: CombatantId,
        status: StatusKind,
        damage: u16,
        remaining_hp: u16,
    },

    // Action bookkeeping
    ActionFailed {
        side: SideId,
        reason: ActionFailureReason,
    },
    ActionResolved {
        side: SideId,
        kind: ActionKind,
    },

    // Battle End
    PlayerDefeated {
        side: SideId,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable string using battle context.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self, battle_state: &BattleState) -> Option<String> {
        let name = |id: &CombatantId| battle_state.display_name(*id);
        match self {
            BattleEvent::BattleStarted => Some(format!(
                "{} vs. {}!",
                battle_state.side(SideId::Player1).name,
                battle_state.side(SideId::Player2).name
            )),
            BattleEvent::TurnStarted { turn_number } => Some(format!("=== Turn {} ===", turn_number)),
            BattleEvent::TurnEnded { .. } => None,

            BattleEvent::ChoiceMade { .. } => None,
            BattleEvent::ChoiceRejected { side, reason } => Some(format!(
                "{} made an illegal choice: {}",
                battle_state.side(*side).name,
                reason
            )),

            BattleEvent::CombatantSwitched { side, previous, incoming } => {
                let player_name = &battle_state.side(*side).name;
                match previous {
                    Some(previous) => Some(format!(
                        "{} recalled {} and sent out {}!",
                        player_name,
                        name(&CombatantId::new(*side, *previous)),
                        name(incoming)
                    )),
                    None => Some(format!("{} sent out {}!", player_name, name(incoming))),
                }
            }

            BattleEvent::MoveUsed { user, move_name } => Some(format!("{} used {}!", name(user), move_name)),
            BattleEvent::MoveMissed { user, .. } => Some(format!("{}'s attack missed!", name(user))),
            BattleEvent::MoveHadNoEffect { target, .. } => {
                Some(format!("It doesn't affect {}...", name(target)))
            }
            BattleEvent::AttackTypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m < 1.0 && m > 0.0 => Some("It's not very effective...".to_string()),
                0.0 => Some("It had no effect!".to_string()),
                _ => None,
            },
            BattleEvent::MoveCancelled { user, reason } => {
                Some(format!("{} {}", name(user), Self::format_action_failure_reason(reason)))
            }

            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", name(target), damage))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }
            BattleEvent::Fainted { target } => Some(format!("{} fainted!", name(target))),

            BattleEvent::StatStageChanged { target, stat, old_stage, new_stage } => {
                let direction = if new_stage > old_stage { "rose" } else { "fell" };
                Some(format!("{}'s {} {}!", name(target), stat, direction))
            }
            BattleEvent::StatChangeBlocked { target, stat, rising } => {
                let direction = if *rising { "higher" } else { "lower" };
                Some(format!("{}'s {} won't go any {}!", name(target), stat, direction))
            }

            BattleEvent::StatusApplied { target, status } => {
                Some(format!("{} {}", name(target), Self::format_status_applied(*status)))
            }
            BattleEvent::StatusCured { target, status } => {
                Some(format!("{} {}", name(target), Self::format_status_removed(*status)))
            }
            BattleEvent::StatusDamage { target, status, damage, .. } => Some(format!(
                "{} is hurt by its {}! ({} damage)",
                name(target),
                status,
                damage
            )),

            BattleEvent::ActionFailed { reason, .. } => Some(Self::format_action_failure_reason(reason)),
            BattleEvent::ActionResolved { .. } => None,

            BattleEvent::PlayerDefeated { side } => Some(format!(
                "{} has no combatants left!",
                battle_state.side(*side).name
            )),
            BattleEvent::BattleEnded { outcome } => match (outcome.winner, outcome.reason) {
                (Some(side), _) => Some(format!("{} has won the battle!", battle_state.side(side).name)),
                (None, EndReason::TurnLimit) => Some(format!(
                    "The battle was called a draw after {} turns!",
                    outcome.turns
                )),
                (None, _) => Some("The battle ended in a draw!".to_string()),
            },
        }
    }

    // --- Private Helper Functions ---

    fn format_status_applied(status: StatusKind) -> &'static str {
        match status {
            StatusKind::Sleep => "fell asleep!",
            StatusKind::Poison => "was poisoned!",
            StatusKind::Toxic => "was badly poisoned!",
            StatusKind::Burn => "was burned!",
            StatusKind::Freeze => "was frozen solid!",
            StatusKind::Paralysis => "is paralyzed! It may be unable to move!",
        }
    }

    fn format_status_removed(status: StatusKind) -> String {
        match status {
            StatusKind::Sleep => "woke up!".to_string(),
            StatusKind::Freeze => "thawed out!".to_string(),
            _ => format!("was cured of its {}!", status),
        }
    }

    fn format_action_failure_reason(reason: &ActionFailureReason) -> String {
        match reason {
            ActionFailureReason::IsAsleep => "is fast asleep.".to_string(),
            ActionFailureReason::IsFrozen => "is frozen solid!".to_string(),
            ActionFailureReason::IsParalyzed => "is fully paralyzed!".to_string(),
            ActionFailureReason::AlreadyActive => "That combatant is already in battle!".to_string(),
            ActionFailureReason::AlreadyHasStatus => "But it failed!".to_string(),
            ActionFailureReason::NoPpRemaining => "But there was no PP left for the move!".to_string(),
            ActionFailureReason::NoTarget => "But there was no target...".to_string(),
            ActionFailureReason::HpFull => "But its HP is already full!".to_string(),
            _ => "But it failed!".to_string(),
        }
    }
}

/// Why an action resolved as a reported no-op.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFailureReason {
    IsAsleep,
    IsFrozen,
    IsParalyzed,
    UserFainted,
    /// The queued user is no longer in the slot it acted from.
    UserNotActive,
    TargetFainted,
    NoTarget,
    MoveDisabled,
    NoPpRemaining,
    AlreadyHasStatus,
    AlreadyActive,
    SwitchTargetUnavailable,
    NothingToCure,
    HpFull,
}

/// Event bus for collecting and managing battle events.
///
/// ```rust,ignore
/// event_bus.print_debug();                                   // Just print events
/// event_bus.print_formatted(&battle_state);                  // Human-readable format
/// println!("{}", event_bus);                                 // Display trait
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Events pushed at or after `start`.
    pub fn events_since(&self, start: usize) -> &[BattleEvent] {
        self.events.get(start..).unwrap_or(&[])
    }

    pub fn extend(&mut self, other: EventBus) {
        self.events.extend(other.events);
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events using their formatted text (when available) along with battle context.
    /// Silent events are skipped.
    pub fn print_formatted(&self, battle_state: &BattleState) {
        for line in self.formatted_lines(battle_state) {
            println!("  {}", line);
        }
    }

    pub fn formatted_lines(&self, battle_state: &BattleState) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.format(battle_state))
            .collect()
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Everything that changes during a battle. Exclusively owned by the
/// orchestrator and lent by mutable reference to actions and listeners.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BattleState {
    pub battle_id: String,
    pub sides: [Side; 2],
    pub turn_number: u32,
    pub phase: BattlePhase,
}

impl BattleState {
    pub fn new(id: impl Into<String>, player1: Side, player2: Side) -> Self {
        Self {
            battle_id: id.into(),
            sides: [player1, player2],
            turn_number: 0,
            phase: BattlePhase::NotStarted,
        }
    }

    pub fn side(&self, side: SideId) -> &Side {
        &self.sides[side.to_index()]
    }

    pub fn side_mut(&mut self, side: SideId) -> &mut Side {
        &mut self.sides[side.to_index()]
    }

    pub fn combatant(&self, id: CombatantId) -> Result<&Combatant, BattleStateError> {
        self.side(id.side).combatant(id.team_index)
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, BattleStateError> {
        self.side_mut(id.side).combatant_mut(id.team_index)
    }

    pub fn is_active(&self, id: CombatantId) -> bool {
        self.side(id.side).is_active(id.team_index)
    }

    /// Every combatant of both sides, in (side, team index) order.
    pub fn all_combatants(&self) -> impl Iterator<Item = (CombatantId, &Combatant)> {
        self.sides.iter().flat_map(|side| {
            side.team()
                .iter()
                .enumerate()
                .map(move |(index, combatant)| (CombatantId::new(side.id, index), combatant))
        })
    }

    pub fn display_name(&self, id: CombatantId) -> String {
        match self.combatant(id) {
            Ok(combatant) => format!("{}'s {}", self.side(id.side).name, combatant.species),
            Err(_) => format!("{}'s #{}", self.side(id.side).name, id.team_index),
        }
    }
}
