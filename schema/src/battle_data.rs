use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

/// The five battle stats that carry a boost stage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum StatKind {
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            StatKind::Attack => "Attack",
            StatKind::Defense => "Defense",
            StatKind::SpecialAttack => "Special Attack",
            StatKind::SpecialDefense => "Special Defense",
            StatKind::Speed => "Speed",
        };
        write!(f, "{}", display_name)
    }
}

/// A major status that a move can inflict. At most one can be carried at a time.
/// Fainting is not inflicted by moves, so it has no variant here.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum StatusKind {
    Poison,
    Toxic,
    Burn,
    Paralysis,
    Sleep,
    Freeze,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            StatusKind::Poison => "poison",
            StatusKind::Toxic => "bad poison",
            StatusKind::Burn => "burn",
            StatusKind::Paralysis => "paralysis",
            StatusKind::Sleep => "sleep",
            StatusKind::Freeze => "freeze",
        };
        write!(f, "{}", display_name)
    }
}
