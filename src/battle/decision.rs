//! Decision providers and choice validation.
//!
//! A `Choose` action asks the side's [`DecisionProvider`] for an [`Intent`],
//! checks it against a [`ChoiceRequest`] and re-prompts on illegal answers.
//! The accepted intent becomes a queued move or switch.

use crate::battle::actions::{ActionContext, ChoiceMode, MoveChoice, PendingAction};
use crate::battle::priority::PriorityKey;
use crate::battle::rng::{RandomSource, SeededRng};
use crate::battle::state::{BattleEvent, BattleState};
use crate::errors::{BattleResult, ChoiceError};
use crate::player::{CombatantId, SideId, ACTIVE_SLOT};
use schema::MoveData;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// What a player wants to do with their active combatant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Move(usize),
    Switch(usize),
    Struggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOption {
    pub index: usize,
    pub name: String,
    pub pp: u8,
    pub max_pp: u8,
    pub disabled: bool,
}

impl MoveOption {
    pub fn is_usable(&self) -> bool {
        !self.disabled && self.pp > 0
    }
}

/// Read-only summary handed to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceRequest {
    pub side: SideId,
    pub mode: ChoiceMode,
    pub active: CombatantId,
    pub turn_number: u32,
    pub moves: Vec<MoveOption>,
    pub switches: Vec<usize>,
}

impl ChoiceRequest {
    pub fn build(state: &BattleState, side: SideId, mode: ChoiceMode) -> BattleResult<Self> {
        let side_state = state.side(side);
        let active = side_state.active_id(ACTIVE_SLOT)?;
        let combatant = state.combatant(active)?;
        let moves = combatant
            .moves
            .iter()
            .enumerate()
            .map(|(index, slot)| MoveOption {
                index,
                name: slot.name().to_string(),
                pp: slot.pp,
                max_pp: slot.max_pp(),
                disabled: slot.disabled,
            })
            .collect();
        Ok(Self {
            side,
            mode,
            active,
            turn_number: state.turn_number,
            moves,
            switches: side_state.available_switches(),
        })
    }

    /// Struggle is only legal on a regular turn with no usable move left.
    pub fn struggle_allowed(&self) -> bool {
        self.mode == ChoiceMode::Turn && !self.moves.iter().any(MoveOption::is_usable)
    }

    pub fn validate(&self, intent: Intent) -> Result<(), ChoiceError> {
        match intent {
            Intent::Move(_) | Intent::Struggle if self.mode == ChoiceMode::Replacement => {
                Err(ChoiceError::ReplacementRequired)
            }
            Intent::Move(index) => {
                let option = self.moves.get(index).ok_or(ChoiceError::UnknownMove(index))?;
                if option.disabled {
                    Err(ChoiceError::MoveDisabled(option.name.clone()))
                } else if option.pp == 0 {
                    Err(ChoiceError::NoPpRemaining(option.name.clone()))
                } else {
                    Ok(())
                }
            }
            Intent::Struggle => {
                if self.struggle_allowed() {
                    Ok(())
                } else {
                    Err(ChoiceError::StruggleNotAllowed)
                }
            }
            Intent::Switch(team_index) => {
                if self.switches.contains(&team_index) {
                    Ok(())
                } else {
                    Err(ChoiceError::SwitchUnavailable(team_index))
                }
            }
        }
    }

    /// Every intent that [`validate`](Self::validate) would accept: moves,
    /// then Struggle, then switches.
    pub fn legal_intents(&self) -> Vec<Intent> {
        let mut intents = Vec::new();
        if self.mode == ChoiceMode::Turn {
            intents.extend(
                self.moves
                    .iter()
                    .filter(|option| option.is_usable())
                    .map(|option| Intent::Move(option.index)),
            );
            if self.struggle_allowed() {
                intents.push(Intent::Struggle);
            }
        }
        intents.extend(self.switches.iter().map(|&index| Intent::Switch(index)));
        intents
    }
}

/// Source of a side's choices: a scripted list, an AI, a remote player.
pub trait DecisionProvider {
    fn request_choice(&mut self, request: &ChoiceRequest) -> Intent;

    /// Told when its last answer was illegal. It is asked again unless the
    /// attempt limit has been reached.
    fn on_rejected(&mut self, _request: &ChoiceRequest, _error: &ChoiceError) {}
}

/// Resolve a `Choose` action: obtain a legal intent and queue what it asks for.
pub fn resolve_choice(ctx: &mut ActionContext<'_>, side: SideId, mode: ChoiceMode) -> BattleResult<()> {
    let active_fainted = ctx.state.side(side).active(ACTIVE_SLOT)?.is_fainted();
    let stale = match mode {
        ChoiceMode::Turn => active_fainted,
        ChoiceMode::Replacement => !active_fainted,
    };
    if stale {
        debug!(%side, ?mode, "choice no longer needed");
        return Ok(());
    }

    let request = ChoiceRequest::build(ctx.state, side, mode)?;
    let legal = request.legal_intents();
    let intent = match legal.as_slice() {
        [] => {
            debug!(%side, ?mode, "no legal choice");
            return Ok(());
        }
        [Intent::Struggle] => Intent::Struggle,
        [fallback, ..] => prompt_until_legal(ctx, &request, *fallback),
    };

    ctx.emit(BattleEvent::ChoiceMade { side, intent });
    let combatant = ctx.state.combatant(request.active)?;
    let speed = combatant.effective_speed();
    let (action, key) = match intent {
        Intent::Move(move_index) => {
            let priority = combatant
                .move_slot(move_index)
                .map(|slot| slot.data.priority)
                .unwrap_or_default();
            (
                PendingAction::Move {
                    user: request.active,
                    slot: ACTIVE_SLOT,
                    choice: MoveChoice::Known(move_index),
                },
                PriorityKey::for_move(priority, speed),
            )
        }
        Intent::Struggle => (
            PendingAction::Move {
                user: request.active,
                slot: ACTIVE_SLOT,
                choice: MoveChoice::Struggle,
            },
            PriorityKey::for_move(MoveData::struggle().priority, speed),
        ),
        Intent::Switch(team_index) => (
            PendingAction::SwitchIn {
                side,
                slot: ACTIVE_SLOT,
                team_index,
            },
            PriorityKey::switch(speed),
        ),
    };
    let ticket = ctx.queue.insert(action, key);
    debug!(%side, ?intent, %key, ?ticket, "choice queued");
    Ok(())
}

/// Ask until the provider gives a legal intent. Once `max_choice_attempts`
/// answers have been rejected the side gets `fallback` instead.
fn prompt_until_legal(ctx: &mut ActionContext<'_>, request: &ChoiceRequest, fallback: Intent) -> Intent {
    let side = request.side;
    let max_attempts = ctx.config.max_choice_attempts.max(1);
    let provider = &mut ctx.providers[side.to_index()];
    for attempt in 1..=max_attempts {
        let intent = provider.request_choice(request);
        let error = match request.validate(intent) {
            Ok(()) => return intent,
            Err(error) => error,
        };
        warn!(%side, ?intent, %error, attempt, "choice rejected");
        ctx.bus.push(BattleEvent::ChoiceRejected {
            side,
            reason: error.to_string(),
        });
        provider.on_rejected(request, &error);
    }
    warn!(%side, attempts = max_attempts, ?fallback, "choice attempts exhausted, using first legal intent");
    fallback
}

/// Plays back a fixed list of intents, then falls back to the first legal one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    intents: VecDeque<Intent>,
}

impl ScriptedProvider {
    pub fn new(intents: Vec<Intent>) -> Self {
        Self {
            intents: intents.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.intents.len()
    }
}

impl DecisionProvider for ScriptedProvider {
    fn request_choice(&mut self, request: &ChoiceRequest) -> Intent {
        self.intents
            .pop_front()
            .unwrap_or_else(|| FirstUsableMove.request_choice(request))
    }
}

/// Always the first usable move; Struggle or a switch when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstUsableMove;

impl DecisionProvider for FirstUsableMove {
    fn request_choice(&mut self, request: &ChoiceRequest) -> Intent {
        request.legal_intents().first().copied().unwrap_or(Intent::Struggle)
    }
}

/// Uniformly random legal choices, switching now and then.
#[derive(Debug, Clone)]
pub struct RandomProvider {
    rng: SeededRng,
    switch_percent: u8,
}

impl RandomProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SeededRng::new(seed),
            switch_percent: 10,
        }
    }

    pub fn with_switch_percent(mut self, switch_percent: u8) -> Self {
        self.switch_percent = switch_percent;
        self
    }
}

impl DecisionProvider for RandomProvider {
    fn request_choice(&mut self, request: &ChoiceRequest) -> Intent {
        let (switches, attacks): (Vec<Intent>, Vec<Intent>) = request
            .legal_intents()
            .into_iter()
            .partition(|intent| matches!(intent, Intent::Switch(_)));

        let wants_switch = !switches.is_empty()
            && (attacks.is_empty() || self.rng.chance(self.switch_percent, "provider switch"));
        let pool = if wants_switch { switches } else { attacks };
        let index = self.rng.pick_index(pool.len(), "provider choice");
        pool.get(index).copied().unwrap_or(Intent::Struggle)
    }
}
