use crate::errors::BattleStateError;
use crate::pokemon::Combatant;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The single active slot of a singles battle.
pub const ACTIVE_SLOT: usize = 0;

/// One of the two sides in a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SideId {
    Player1,
    Player2,
}

impl SideId {
    pub const ALL: [SideId; 2] = [SideId::Player1, SideId::Player2];

    pub fn opponent(&self) -> SideId {
        match self {
            SideId::Player1 => SideId::Player2,
            SideId::Player2 => SideId::Player1,
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            SideId::Player1 => 0,
            SideId::Player2 => 1,
        }
    }
}

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideId::Player1 => write!(f, "Player 1"),
            SideId::Player2 => write!(f, "Player 2"),
        }
    }
}

/// Stable identity of a team member for the whole battle.
/// Listeners and faint bookkeeping key on this, never on live references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId {
    pub side: SideId,
    pub team_index: usize,
}

impl CombatantId {
    pub fn new(side: SideId, team_index: usize) -> Self {
        CombatantId { side, team_index }
    }
}

/// A side's roster. Active slots map to team indices; `in_play` marks which
/// team members are eligible this battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub id: SideId,
    pub name: String,
    team: Vec<Combatant>,
    in_play: Vec<bool>,
    active: Vec<usize>,
}

impl Side {
    /// Create a side with every team member in play and the first one leading.
    pub fn new(id: SideId, name: impl Into<String>, team: Vec<Combatant>) -> Result<Self, BattleStateError> {
        if team.is_empty() {
            return Err(BattleStateError::EmptyTeam);
        }
        let in_play = vec![true; team.len()];
        Ok(Side {
            id,
            name: name.into(),
            team,
            in_play,
            active: vec![0],
        })
    }

    /// Restrict which team members may take part in this battle.
    pub fn set_in_play(&mut self, team_index: usize, in_play: bool) -> Result<(), BattleStateError> {
        let flag = self.in_play.get_mut(team_index).ok_or(BattleStateError::InvalidTeamIndex {
            side: self.id,
            team_index,
        })?;
        *flag = in_play;
        Ok(())
    }

    pub fn team(&self) -> &[Combatant] {
        &self.team
    }

    pub fn combatant(&self, team_index: usize) -> Result<&Combatant, BattleStateError> {
        self.team.get(team_index).ok_or(BattleStateError::InvalidTeamIndex {
            side: self.id,
            team_index,
        })
    }

    pub fn combatant_mut(&mut self, team_index: usize) -> Result<&mut Combatant, BattleStateError> {
        let side = self.id;
        self.team
            .get_mut(team_index)
            .ok_or(BattleStateError::InvalidTeamIndex { side, team_index })
    }

    pub fn slot_count(&self) -> usize {
        self.active.len()
    }

    /// Team index occupying an active slot.
    pub fn active_index(&self, slot: usize) -> Result<usize, BattleStateError> {
        self.active
            .get(slot)
            .copied()
            .ok_or(BattleStateError::InvalidSlot { side: self.id, slot })
    }

    pub fn active_id(&self, slot: usize) -> Result<CombatantId, BattleStateError> {
        Ok(CombatantId::new(self.id, self.active_index(slot)?))
    }

    pub fn active(&self, slot: usize) -> Result<&Combatant, BattleStateError> {
        self.combatant(self.active_index(slot)?)
    }

    pub fn active_mut(&mut self, slot: usize) -> Result<&mut Combatant, BattleStateError> {
        let team_index = self.active_index(slot)?;
        self.combatant_mut(team_index)
    }

    pub fn is_active(&self, team_index: usize) -> bool {
        self.active.contains(&team_index)
    }

    pub fn is_in_play(&self, team_index: usize) -> bool {
        self.in_play.get(team_index).copied().unwrap_or(false)
    }

    /// Put a team member into an active slot. Returns the team index it replaced.
    pub fn set_active(&mut self, slot: usize, team_index: usize) -> Result<usize, BattleStateError> {
        self.combatant(team_index)?;
        let side = self.id;
        let current = self
            .active
            .get_mut(slot)
            .ok_or(BattleStateError::InvalidSlot { side, slot })?;
        let previous = *current;
        *current = team_index;
        Ok(previous)
    }

    /// Whether the team member could legally be switched in right now.
    pub fn can_switch_to(&self, team_index: usize) -> bool {
        self.is_in_play(team_index)
            && !self.is_active(team_index)
            && self.team.get(team_index).is_some_and(|c| !c.is_fainted())
    }

    /// Team indices that could legally be switched in.
    pub fn available_switches(&self) -> Vec<usize> {
        (0..self.team.len()).filter(|&index| self.can_switch_to(index)).collect()
    }

    /// True when no in-play combatant is left standing.
    pub fn is_defeated(&self) -> bool {
        self.team
            .iter()
            .zip(&self.in_play)
            .all(|(combatant, in_play)| !in_play || combatant.is_fainted())
    }

    pub fn remaining(&self) -> usize {
        self.team
            .iter()
            .zip(&self.in_play)
            .filter(|(combatant, in_play)| **in_play && !combatant.is_fainted())
            .count()
    }
}
