//! Pokemon Battle Engine
//!
//! A turn-based battle resolution engine: a priority event queue orders every
//! switch, move, damage and status action of a turn, and per-status listeners
//! react after each resolved action.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod config;
pub mod dex;
pub mod errors;
pub mod player;
pub mod pokemon;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    BaseStats, MoveCategory, MoveData, MoveEffect, MoveTarget, PokemonType, SpeciesData, StatKind, StatusKind,
};

// --- From this crate's modules (`src/`) ---

// Core battle engine and state.
pub use battle::decision::{DecisionProvider, FirstUsableMove, Intent, RandomProvider, ScriptedProvider};
pub use battle::engine::Battle;
pub use battle::observer::{BattleObserver, JsonLinesObserver, TracingObserver};
pub use battle::rng::{RandomSource, ScriptedRng, SeededRng};
pub use battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleState, EndReason, EventBus};

// Core runtime types for a battle.
pub use player::{CombatantId, Side, SideId};
pub use pokemon::{Combatant, Status};

// Configuration and data access.
pub use config::BattleConfig;
pub use dex::{DataService, Dex};

// Crate-specific error and result types.
pub use errors::{BattleEngineError, BattleResult, BattleStateError, ChoiceError, DexError, DexResult};
