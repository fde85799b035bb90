use crate::PokemonType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub speed: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
}

impl SpeciesData {
    pub fn primary_type(&self) -> PokemonType {
        self.types.first().copied().unwrap_or(PokemonType::Typeless)
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }
}
