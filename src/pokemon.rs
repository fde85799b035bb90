use crate::dex::DataService;
use crate::errors::DexResult;
use schema::{BaseStats, MoveData, PokemonType, SpeciesData, StatKind, StatusKind};
use serde::{Deserialize, Serialize};

pub const MIN_STAGE: i8 = -6;
pub const MAX_STAGE: i8 = 6;

/// Moves a combatant can know at once.
pub const MAX_MOVES: usize = 4;

/// A base value plus a boost stage in `[MIN_STAGE, MAX_STAGE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    base: u16,
    stage: i8,
}

impl Stat {
    pub fn new(base: u16) -> Self {
        Stat { base, stage: 0 }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn stage(&self) -> i8 {
        self.stage
    }

    /// Replace the base value. Listeners use this for status penalties.
    pub fn set_base(&mut self, base: u16) {
        self.base = base;
    }

    /// Stage-adjusted value, integer-truncated.
    /// Positive stages scale by (2+stage)/2, negative ones by 2/(2-stage).
    pub fn effective(&self) -> u16 {
        let base = self.base as u32;
        let value = if self.stage >= 0 {
            base * (2 + self.stage as u32) / 2
        } else {
            base * 2 / (2 + self.stage.unsigned_abs() as u32)
        };
        value.min(u16::MAX as u32) as u16
    }

    /// Shift the stage by `delta`, clamped. Returns the change actually applied.
    pub fn boost(&mut self, delta: i8) -> i8 {
        let old = self.stage;
        self.stage = old.saturating_add(delta).clamp(MIN_STAGE, MAX_STAGE);
        self.stage - old
    }

    pub fn reset_stage(&mut self) {
        self.stage = 0;
    }
}

/// The five non-HP stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub attack: Stat,
    pub defense: Stat,
    pub special_attack: Stat,
    pub special_defense: Stat,
    pub speed: Stat,
}

impl StatBlock {
    pub fn get(&self, kind: StatKind) -> &Stat {
        match kind {
            StatKind::Attack => &self.attack,
            StatKind::Defense => &self.defense,
            StatKind::SpecialAttack => &self.special_attack,
            StatKind::SpecialDefense => &self.special_defense,
            StatKind::Speed => &self.speed,
        }
    }

    pub fn get_mut(&mut self, kind: StatKind) -> &mut Stat {
        match kind {
            StatKind::Attack => &mut self.attack,
            StatKind::Defense => &mut self.defense,
            StatKind::SpecialAttack => &mut self.special_attack,
            StatKind::SpecialDefense => &mut self.special_defense,
            StatKind::Speed => &mut self.speed,
        }
    }

    fn reset_stages(&mut self) {
        for stat in [
            &mut self.attack,
            &mut self.defense,
            &mut self.special_attack,
            &mut self.special_defense,
            &mut self.speed,
        ] {
            stat.reset_stage();
        }
    }
}

/// Major status. `Fainted` overrides everything else and mirrors `hp == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Healthy,
    Poisoned,
    Burned,
    Paralyzed,
    Asleep,
    Frozen,
    Toxic,
    Fainted,
}

impl Status {
    pub fn from_kind(kind: StatusKind) -> Self {
        match kind {
            StatusKind::Poison => Status::Poisoned,
            StatusKind::Toxic => Status::Toxic,
            StatusKind::Burn => Status::Burned,
            StatusKind::Paralysis => Status::Paralyzed,
            StatusKind::Sleep => Status::Asleep,
            StatusKind::Freeze => Status::Frozen,
        }
    }

    /// The listener-bearing status kind, if any.
    pub fn kind(&self) -> Option<StatusKind> {
        match self {
            Status::Poisoned => Some(StatusKind::Poison),
            Status::Toxic => Some(StatusKind::Toxic),
            Status::Burned => Some(StatusKind::Burn),
            Status::Paralyzed => Some(StatusKind::Paralysis),
            Status::Asleep => Some(StatusKind::Sleep),
            Status::Frozen => Some(StatusKind::Freeze),
            Status::Healthy | Status::Fainted => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub data: MoveData,
    pub pp: u8,
    pub disabled: bool,
}

impl MoveSlot {
    pub fn new(data: MoveData) -> Self {
        MoveSlot {
            pp: data.max_pp,
            data,
            disabled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn max_pp(&self) -> u8 {
        self.data.max_pp
    }

    pub fn is_usable(&self) -> bool {
        !self.disabled && self.pp > 0
    }

    /// Spend one PP. Returns false if none were left.
    pub fn use_move(&mut self) -> bool {
        if self.pp > 0 {
            self.pp -= 1;
            true
        } else {
            false
        }
    }
}

/// Per-battle mutable state of one team member.
///
/// `hp` and `status` are private so the fainted invariant holds: hp is zero
/// exactly when the status is `Fainted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub species: String,
    pub level: u8,
    pub types: Vec<PokemonType>,
    hp: u16,
    hp_max: u16,
    pub stats: StatBlock,
    status: Status,
    pub moves: Vec<MoveSlot>,
}

impl Combatant {
    /// Build a combatant from species data. Only the first `MAX_MOVES` moves are kept.
    pub fn from_species(species: &SpeciesData, level: u8, moves: Vec<MoveData>) -> Self {
        let base = &species.base_stats;
        let hp_max = Self::calculate_hp(base.hp, level);
        Combatant {
            species: species.name.clone(),
            level,
            types: species.types.clone(),
            hp: hp_max,
            hp_max,
            stats: Self::calculate_stats(base, level),
            status: Status::Healthy,
            moves: moves.into_iter().take(MAX_MOVES).map(MoveSlot::new).collect(),
        }
    }

    /// Look up a species and its moves by name and build a combatant.
    pub fn build(
        dex: &dyn DataService,
        species: &str,
        level: u8,
        move_names: &[&str],
    ) -> DexResult<Self> {
        let species_data = dex.lookup_species(species)?;
        let moves = move_names
            .iter()
            .map(|name| dex.lookup_move(name).cloned())
            .collect::<DexResult<Vec<_>>>()?;
        Ok(Self::from_species(species_data, level, moves))
    }

    /// `(2 * Base * Level) / 100`, widened so no base and level pair overflows.
    fn scaled_base(base: u8, level: u8) -> u32 {
        2 * base as u32 * level as u32 / 100
    }

    /// HP = (2 * Base * Level) / 100 + Level + 10
    fn calculate_hp(base: u8, level: u8) -> u16 {
        let hp = Self::scaled_base(base, level) + level as u32 + 10;
        u16::try_from(hp).unwrap_or(u16::MAX)
    }

    /// Other stat = (2 * Base * Level) / 100 + 5
    fn calculate_stats(base: &BaseStats, level: u8) -> StatBlock {
        let calc = |value: u8| {
            let stat = Self::scaled_base(value, level) + 5;
            Stat::new(u16::try_from(stat).unwrap_or(u16::MAX))
        };
        StatBlock {
            attack: calc(base.attack),
            defense: calc(base.defense),
            special_attack: calc(base.sp_attack),
            special_defense: calc(base.sp_defense),
            speed: calc(base.speed),
        }
    }

    pub fn hp(&self) -> u16 {
        self.hp
    }

    pub fn hp_max(&self) -> u16 {
        self.hp_max
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_fainted(&self) -> bool {
        self.status == Status::Fainted
    }

    /// Set HP, clamped to `[0, hp_max]`. Zero faints; positive HP revives a
    /// fainted combatant back to `Healthy`.
    pub fn set_hp(&mut self, hp: u16) {
        self.hp = hp.min(self.hp_max);
        if self.hp == 0 {
            self.status = Status::Fainted;
        } else if self.status == Status::Fainted {
            self.status = Status::Healthy;
        }
    }

    /// Subtract damage, saturating at zero. Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let lost = amount.min(self.hp);
        self.set_hp(self.hp - lost);
        lost
    }

    /// Restore HP up to the maximum. Returns the HP actually gained.
    pub fn restore_hp(&mut self, amount: u16) -> u16 {
        let gained = amount.min(self.hp_max - self.hp);
        self.set_hp(self.hp + gained);
        gained
    }

    /// Give this combatant a major status. Fails if it is fainted or already
    /// carries one.
    pub fn apply_status(&mut self, kind: StatusKind) -> bool {
        if self.status != Status::Healthy {
            return false;
        }
        self.status = Status::from_kind(kind);
        true
    }

    /// Remove the current major status. Returns what was cured.
    pub fn cure_status(&mut self) -> Option<StatusKind> {
        let cured = self.status.kind();
        if cured.is_some() {
            self.status = Status::Healthy;
        }
        cured
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status.kind() == Some(kind)
    }

    pub fn stat(&self, kind: StatKind) -> &Stat {
        self.stats.get(kind)
    }

    pub fn stat_mut(&mut self, kind: StatKind) -> &mut Stat {
        self.stats.get_mut(kind)
    }

    pub fn effective_speed(&self) -> u16 {
        self.stats.speed.effective()
    }

    pub fn reset_stages(&mut self) {
        self.stats.reset_stages();
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }

    pub fn move_slot(&self, move_index: usize) -> Option<&MoveSlot> {
        self.moves.get(move_index)
    }

    pub fn move_slot_mut(&mut self, move_index: usize) -> Option<&mut MoveSlot> {
        self.moves.get_mut(move_index)
    }

    /// Indices of moves that are enabled and have PP left.
    pub fn usable_moves(&self) -> Vec<usize> {
        self.moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_usable())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves.iter().any(MoveSlot::is_usable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn pikachu() -> Combatant {
        let species = SpeciesData {
            name: "Pikachu".to_string(),
            types: vec![PokemonType::Electric],
            base_stats: BaseStats {
                hp: 35,
                attack: 55,
                defense: 40,
                sp_attack: 50,
                sp_defense: 50,
                speed: 90,
            },
        };
        Combatant::from_species(&species, 50, vec![MoveData::struggle()])
    }

    #[rstest]
    #[case(0, 100)]
    #[case(1, 150)]
    #[case(2, 200)]
    #[case(6, 400)]
    #[case(-1, 66)]
    #[case(-2, 50)]
    #[case(-6, 25)]
    fn test_effective_stat(#[case] stage: i8, #[case] expected: u16) {
        let mut stat = Stat::new(100);
        stat.boost(stage);
        assert_eq!(stat.effective(), expected);
    }

    #[test]
    fn test_stage_clamps_at_bounds() {
        let mut stat = Stat::new(80);
        assert_eq!(stat.boost(4), 4);
        assert_eq!(stat.boost(4), 2);
        assert_eq!(stat.stage(), MAX_STAGE);
        assert_eq!(stat.boost(-20), -12);
        assert_eq!(stat.stage(), MIN_STAGE);
        assert_eq!(stat.boost(i8::MIN), 0);
        assert_eq!(stat.stage(), MIN_STAGE);
    }

    #[test]
    fn test_stat_calculation_from_base() {
        let pikachu = pikachu();
        // (2*35*50)/100 + 50 + 10
        assert_eq!(pikachu.hp_max(), 95);
        // (2*90*50)/100 + 5
        assert_eq!(pikachu.stats.speed.base(), 95);
        assert_eq!(pikachu.stats.attack.base(), 60);
    }

    #[test]
    fn test_stat_calculation_at_maximum_level_and_base() {
        let species = SpeciesData {
            name: "Maxed".to_string(),
            types: vec![PokemonType::Normal],
            base_stats: BaseStats {
                hp: 255,
                attack: 255,
                defense: 255,
                sp_attack: 255,
                sp_defense: 255,
                speed: 255,
            },
        };

        let maxed = Combatant::from_species(&species, u8::MAX, vec![MoveData::struggle()]);

        // 2 * 255 * 255 / 100 = 1300
        assert_eq!(maxed.hp_max(), 1300 + 255 + 10);
        assert_eq!(maxed.stats.attack.base(), 1305);
        assert_eq!(maxed.stats.speed.base(), 1305);
    }

    #[test]
    fn test_hp_zero_faints_and_positive_revives() {
        let mut pikachu = pikachu();
        assert!(pikachu.apply_status(StatusKind::Burn));
        assert_eq!(pikachu.take_damage(1000), 95);
        assert_eq!(pikachu.hp(), 0);
        assert_eq!(pikachu.status(), Status::Fainted);

        pikachu.set_hp(10);
        assert_eq!(pikachu.status(), Status::Healthy);
        assert_eq!(pikachu.hp(), 10);
    }

    #[test]
    fn test_hp_is_clamped_to_max() {
        let mut pikachu = pikachu();
        pikachu.set_hp(u16::MAX);
        assert_eq!(pikachu.hp(), pikachu.hp_max());
        pikachu.set_hp(50);
        assert_eq!(pikachu.restore_hp(500), 45);
    }

    #[test]
    fn test_single_major_status() {
        let mut pikachu = pikachu();
        assert!(pikachu.apply_status(StatusKind::Burn));
        assert!(!pikachu.apply_status(StatusKind::Paralysis));
        assert_eq!(pikachu.status(), Status::Burned);
        assert_eq!(pikachu.cure_status(), Some(StatusKind::Burn));
        assert_eq!(pikachu.cure_status(), None);
    }

    #[test]
    fn test_fainted_cannot_gain_status() {
        let mut pikachu = pikachu();
        pikachu.set_hp(0);
        assert!(!pikachu.apply_status(StatusKind::Poison));
        assert_eq!(pikachu.cure_status(), None);
        assert_eq!(pikachu.status(), Status::Fainted);
    }

    #[test]
    fn test_pp_and_usable_moves() {
        let mut pikachu = pikachu();
        pikachu.moves[0].pp = 1;
        assert_eq!(pikachu.usable_moves(), vec![0]);
        assert!(pikachu.moves[0].use_move());
        assert!(!pikachu.moves[0].use_move());
        assert!(!pikachu.has_usable_move());
    }
}
