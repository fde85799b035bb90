//! Tunable battle rules.
//!
//! Every probability the listeners and orchestrator use lives here so that a
//! battle can be reconfigured without touching engine code. The defaults are
//! the standard rules; a RON document can override any subset of fields.

use crate::errors::{DexError, DexResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Percent chance that paralysis cancels a queued move.
    pub paralysis_skip_chance: u8,
    /// Percent of base speed kept while paralyzed.
    pub paralysis_speed_percent: u8,
    /// Percent chance that a frozen combatant thaws when it tries to move.
    pub freeze_thaw_chance: u8,
    /// Inclusive range of moves a combatant sleeps through.
    pub sleep_turns_min: u8,
    pub sleep_turns_max: u8,
    /// Residual damage for poison and burn is `hp_max / residual_divisor`.
    pub residual_divisor: u16,
    /// Toxic damage is `hp_max * counter / toxic_divisor`.
    pub toxic_divisor: u16,
    /// Safety cap; the battle ends in a draw once this many turns have passed.
    pub max_turns: u32,
    /// How many illegal choices a provider may make for one request.
    pub max_choice_attempts: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            paralysis_skip_chance: 60,
            paralysis_speed_percent: 25,
            freeze_thaw_chance: 20,
            sleep_turns_min: 1,
            sleep_turns_max: 3,
            residual_divisor: 8,
            toxic_divisor: 16,
            max_turns: 500,
            max_choice_attempts: 16,
        }
    }
}

impl BattleConfig {
    /// Parse a config from RON text. Missing fields keep their defaults.
    pub fn from_ron_str(text: &str) -> DexResult<Self> {
        ron::from_str(text).map_err(|err| DexError::MalformedData {
            source_name: "battle config".to_string(),
            details: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> DexResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }
}
