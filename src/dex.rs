//! Read-only move and species data service.
//!
//! Tables are RON documents: a list of [`MoveData`] and a list of
//! [`SpeciesData`]. A [`Dex`] is built once before a battle and handed to the
//! engine behind the [`DataService`] trait; nothing mutates it afterwards.

use crate::errors::{DexError, DexResult};
use schema::{MoveData, SpeciesData};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const STANDARD_MOVES: &str = include_str!("../data/moves.ron");
const STANDARD_SPECIES: &str = include_str!("../data/species.ron");

/// Lookup interface the engine consumes. Implementations must be immutable
/// for the duration of a battle.
pub trait DataService {
    fn lookup_move(&self, name: &str) -> DexResult<&MoveData>;
    fn lookup_species(&self, name: &str) -> DexResult<&SpeciesData>;
}

/// Transform a name by removing spaces and hyphens and converting to lowercase,
/// so "Thunder Wave", "thunderwave" and "THUNDER-WAVE" all resolve alike.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct Dex {
    moves: HashMap<String, MoveData>,
    species: HashMap<String, SpeciesData>,
}

impl Dex {
    /// The bundled move and species tables.
    pub fn standard() -> DexResult<Self> {
        Self::from_ron_strs(STANDARD_MOVES, STANDARD_SPECIES)
    }

    /// Build a dex from RON text for the move list and the species list.
    pub fn from_ron_strs(moves_text: &str, species_text: &str) -> DexResult<Self> {
        let moves: Vec<MoveData> = parse_table("moves", moves_text)?;
        let species: Vec<SpeciesData> = parse_table("species", species_text)?;
        Ok(Self::from_tables(moves, species))
    }

    /// Load `moves.ron` and `species.ron` from a data directory.
    pub fn load_from_dir(data_path: &Path) -> DexResult<Self> {
        let moves_text = fs::read_to_string(data_path.join("moves.ron"))?;
        let species_text = fs::read_to_string(data_path.join("species.ron"))?;
        Self::from_ron_strs(&moves_text, &species_text)
    }

    pub fn from_tables(moves: Vec<MoveData>, species: Vec<SpeciesData>) -> Self {
        let moves: HashMap<String, MoveData> = moves
            .into_iter()
            .map(|data| (normalize_name(&data.name), data))
            .collect();
        let species: HashMap<String, SpeciesData> = species
            .into_iter()
            .map(|data| (normalize_name(&data.name), data))
            .collect();
        debug!(moves = moves.len(), species = species.len(), "dex loaded");
        Self { moves, species }
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    /// All species names, sorted.
    pub fn species_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.species.values().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl DataService for Dex {
    fn lookup_move(&self, name: &str) -> DexResult<&MoveData> {
        self.moves
            .get(&normalize_name(name))
            .ok_or_else(|| DexError::MoveNotFound(name.to_string()))
    }

    fn lookup_species(&self, name: &str) -> DexResult<&SpeciesData> {
        self.species
            .get(&normalize_name(name))
            .ok_or_else(|| DexError::SpeciesNotFound(name.to_string()))
    }
}

fn parse_table<T: DeserializeOwned>(source_name: &str, text: &str) -> DexResult<Vec<T>> {
    ron::from_str(text).map_err(|err| DexError::MalformedData {
        source_name: source_name.to_string(),
        details: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{MoveCategory, MoveTarget, PokemonType};

    #[test]
    fn test_standard_dex_loads() {
        let dex = Dex::standard().unwrap();
        assert!(dex.move_count() > 20);
        assert!(dex.species_count() > 15);
    }

    #[test]
    fn test_lookup_ignores_spacing_and_case() {
        let dex = Dex::standard().unwrap();
        let a = dex.lookup_move("Thunder Wave").unwrap();
        let b = dex.lookup_move("thunderwave").unwrap();
        let c = dex.lookup_move("THUNDER-WAVE").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.category, MoveCategory::Status);
    }

    #[test]
    fn test_self_targeting_moves_are_declared() {
        let dex = Dex::standard().unwrap();
        assert_eq!(dex.lookup_move("Swords Dance").unwrap().target, MoveTarget::User);
        assert_eq!(dex.lookup_move("Growl").unwrap().target, MoveTarget::Opponent);
        assert_eq!(dex.lookup_move("Quick Attack").unwrap().priority, 1);
    }

    #[test]
    fn test_species_types() {
        let dex = Dex::standard().unwrap();
        let quagsire = dex.lookup_species("Quagsire").unwrap();
        assert_eq!(quagsire.types, vec![PokemonType::Water, PokemonType::Ground]);
    }

    #[test]
    fn test_missing_entries_are_errors() {
        let dex = Dex::standard().unwrap();
        assert!(matches!(dex.lookup_move("Splash Dance"), Err(DexError::MoveNotFound(_))));
        assert!(matches!(dex.lookup_species("Missingno"), Err(DexError::SpeciesNotFound(_))));
    }

    #[test]
    fn test_malformed_table() {
        let result = Dex::from_ron_strs("[ (name: \"Tackle\") ]", "[]");
        assert!(matches!(result, Err(DexError::MalformedData { .. })));
    }
}
