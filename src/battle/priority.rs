use crate::player::SideId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Bracket for choice requests; always resolved before anything else.
pub const CHOICE_BRACKET: i8 = 8;
/// Bracket for voluntary switches; ahead of every move.
pub const SWITCH_BRACKET: i8 = 6;
/// Highest and lowest brackets a move may declare.
pub const MAX_MOVE_PRIORITY: i8 = 5;
pub const MIN_MOVE_PRIORITY: i8 = -6;
/// Bracket for replacing a fainted combatant; after every move of the turn.
pub const REPLACEMENT_BRACKET: i8 = -7;

/// Ordering key for queued actions.
///
/// A higher bracket resolves first; within a bracket, higher speed resolves
/// first. `Ord` is arranged so that the key that resolves first compares as
/// the *smallest*, which lets the queue be a plain min-queue. The comparison
/// is pure; exact ties are settled by the queue at dequeue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriorityKey {
    pub bracket: i8,
    pub speed: u16,
}

impl PriorityKey {
    pub fn new(bracket: i8, speed: u16) -> Self {
        Self { bracket, speed }
    }

    pub fn choice() -> Self {
        Self::new(CHOICE_BRACKET, 0)
    }

    pub fn replacement() -> Self {
        Self::new(REPLACEMENT_BRACKET, 0)
    }

    /// Choice key for one side. Player 1 is always asked first, so choice
    /// requests never tie and never consume a tie-break draw.
    pub fn choice_for(side: SideId) -> Self {
        Self::new(CHOICE_BRACKET, side_order(side))
    }

    pub fn replacement_for(side: SideId) -> Self {
        Self::new(REPLACEMENT_BRACKET, side_order(side))
    }

    pub fn switch(speed: u16) -> Self {
        Self::new(SWITCH_BRACKET, speed)
    }

    /// Key for a move; the declared priority is clamped to the move range.
    pub fn for_move(priority: i8, speed: u16) -> Self {
        Self::new(priority.clamp(MIN_MOVE_PRIORITY, MAX_MOVE_PRIORITY), speed)
    }

    /// True when `self` resolves strictly before `other`.
    pub fn resolves_before(&self, other: &PriorityKey) -> bool {
        self < other
    }
}

fn side_order(side: SideId) -> u16 {
    match side {
        SideId::Player1 => 1,
        SideId::Player2 => 0,
    }
}

impl Ord for PriorityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.bracket, other.speed).cmp(&(self.bracket, self.speed))
    }
}

impl PartialOrd for PriorityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PriorityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.bracket, self.speed)
    }
}
