use crate::player::SideId;
use thiserror::Error;

/// Main error type for the battle engine.
///
/// Only invariant violations and data-service failures surface here. Illegal
/// player choices are [`ChoiceError`]s that the orchestrator recovers from by
/// re-prompting, and expected no-ops (misses, immunities, duplicate statuses)
/// are reported as battle events rather than errors.
#[derive(Debug, Error)]
pub enum BattleEngineError {
    /// Error related to move or species data lookup
    #[error("dex error: {0}")]
    Dex(#[from] DexError),
    /// A programming-contract violation inside the battle
    #[error("battle state error: {0}")]
    BattleState(#[from] BattleStateError),
}

/// Errors raised by the move/species data service.
#[derive(Debug, Error)]
pub enum DexError {
    /// The specified move was not found in the dex
    #[error("move not found: {0}")]
    MoveNotFound(String),
    /// The specified species was not found in the dex
    #[error("species not found: {0}")]
    SpeciesNotFound(String),
    /// Data file could not be parsed
    #[error("malformed dex data in {source_name}: {details}")]
    MalformedData { source_name: String, details: String },
    /// Data file could not be read
    #[error("could not read dex data: {0}")]
    Io(#[from] std::io::Error),
}

/// Contract violations: indices that do not exist, or a battle missing an
/// active combatant. These abort the battle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    #[error("side {side:?} has no active slot {slot}")]
    InvalidSlot { side: SideId, slot: usize },
    #[error("side {side:?} has no team member at index {team_index}")]
    InvalidTeamIndex { side: SideId, team_index: usize },
    #[error("combatant {name} has no move at index {move_index}")]
    InvalidMoveIndex { name: String, move_index: usize },
    #[error("side {0:?} has no active combatant")]
    NoActiveCombatant(SideId),
    #[error("a team must contain at least one combatant")]
    EmptyTeam,
}

/// A rejected player choice. Recoverable: the provider is asked again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("move index {0} does not exist")]
    UnknownMove(usize),
    #[error("move {0} is disabled")]
    MoveDisabled(String),
    #[error("move {0} has no PP remaining")]
    NoPpRemaining(String),
    #[error("team member {0} cannot be switched in")]
    SwitchUnavailable(usize),
    #[error("a move must be chosen while another move is usable")]
    StruggleNotAllowed,
    #[error("only a switch is allowed when replacing a fainted combatant")]
    ReplacementRequired,
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using DexError
pub type DexResult<T> = Result<T, DexError>;
