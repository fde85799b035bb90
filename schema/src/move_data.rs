use crate::{PokemonType, StatKind, StatusKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// Which side of the field a move's effects land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MoveTarget {
    User,
    #[default]
    Opponent,
}

/// A declared effect of a move. Damaging moves roll `chance` after a hit;
/// status moves use 100 for their primary effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveEffect {
    /// Raise or lower a stat by a number of stages.
    StatChange { stat: StatKind, stages: i8, chance: u8 },
    /// Inflict a major status.
    Inflict { status: StatusKind, chance: u8 },
    /// Restore a percentage of max HP.
    Heal(u8),
    /// Remove whatever major status the target carries.
    CureStatus,
}

impl MoveEffect {
    /// Percent chance (1-100) that this effect triggers.
    pub fn chance(&self) -> u8 {
        match self {
            MoveEffect::StatChange { chance, .. } | MoveEffect::Inflict { chance, .. } => *chance,
            MoveEffect::Heal(_) | MoveEffect::CureStatus => 100,
        }
    }
}

fn default_accuracy() -> u8 {
    100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub name: String,
    pub move_type: PokemonType,
    pub power: Option<u16>,
    pub category: MoveCategory,
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    pub max_pp: u8,
    #[serde(default)]
    pub priority: i8,
    #[serde(default)]
    pub target: MoveTarget,
    #[serde(default)]
    pub effects: Vec<MoveEffect>,
}

impl MoveData {
    /// True when the move computes damage rather than only applying effects.
    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status && self.power.is_some_and(|power| power > 0)
    }

    /// The fallback move used when nothing else is usable. Never stored in a move list.
    pub fn struggle() -> Self {
        MoveData {
            name: "Struggle".to_string(),
            move_type: PokemonType::Typeless,
            power: Some(50),
            category: MoveCategory::Physical,
            accuracy: 100,
            max_pp: 0,
            priority: 0,
            target: MoveTarget::Opponent,
            effects: vec![],
        }
    }
}
