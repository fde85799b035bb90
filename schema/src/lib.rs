// Battle Engine Schema - Shared data definitions
// This crate holds the static vocabulary of a battle: elemental types and the
// effectiveness chart, move and species data shapes, and the stat and status
// kinds they refer to. Everything here is plain data that the dex service
// deserializes and the engine reads; nothing here mutates battle state.

// Re-export the main types
pub use battle_data::*;
pub use move_data::*;
pub use pokemon_types::*;
pub use species_data::*;

pub mod battle_data;
pub mod move_data;
pub mod pokemon_types;
pub mod species_data;
