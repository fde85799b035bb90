use crate::battle::calculators::{calculate_damage, move_hits, type_effectiveness};
use crate::battle::decision::{resolve_choice, DecisionProvider};
use crate::battle::event_queue::EventQueue;
use crate::battle::listeners::{ListenerRegistry, StatusListener};
use crate::battle::priority::PriorityKey;
use crate::battle::rng::RandomSource;
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, EventBus};
use crate::config::BattleConfig;
use crate::errors::{BattleResult, BattleStateError};
use crate::player::{CombatantId, SideId, ACTIVE_SLOT};
use schema::{MoveData, MoveEffect, MoveTarget, StatKind, StatusKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Discriminant of a [`PendingAction`], for reporting.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Choose,
    SwitchIn,
    Move,
    Damage,
    Effect,
    ApplyStatus,
}

/// A side's active slot, resolved to a team member only when an action executes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub side: SideId,
    pub slot: usize,
}

impl SlotRef {
    pub fn new(side: SideId, slot: usize) -> Self {
        Self { side, slot }
    }

    pub fn resolve(&self, state: &BattleState) -> Result<CombatantId, BattleStateError> {
        state.side(self.side).active_id(self.slot)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceMode {
    /// Regular start-of-turn choice: a move or a switch.
    Turn,
    /// The active combatant fainted; only a switch is accepted.
    Replacement,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveChoice {
    /// Index into the user's move list.
    Known(usize),
    Struggle,
}

/// Non-status changes an [`PendingAction::Effect`] can make.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    StatStage { stat: StatKind, delta: i8 },
    Heal { percent: u8 },
    CureStatus,
}

/// Everything that can sit in the event queue.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PendingAction {
    Choose {
        side: SideId,
        mode: ChoiceMode,
    },
    SwitchIn {
        side: SideId,
        slot: usize,
        team_index: usize,
    },
    Move {
        user: CombatantId,
        slot: usize,
        choice: MoveChoice,
    },
    Damage {
        source: CombatantId,
        target: SlotRef,
        amount: u16,
        /// Effects rolled once the hit lands on a target that is still standing.
        secondary: Vec<MoveEffect>,
    },
    Effect {
        source: SideId,
        target: SlotRef,
        effect: EffectKind,
    },
    ApplyStatus {
        source: SideId,
        target: SlotRef,
        status: StatusKind,
    },
}

/// Side effects applied around a switch. The engine always calls both hooks.
pub trait SwitchInHook {
    fn on_switch_out(&mut self, _outgoing: CombatantId, _state: &mut BattleState) -> BattleResult<()> {
        Ok(())
    }

    fn on_switch_in(
        &mut self,
        _incoming: CombatantId,
        _state: &mut BattleState,
        _bus: &mut EventBus,
    ) -> BattleResult<()> {
        Ok(())
    }
}

/// Default hook: stat stages do not survive leaving the field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetStagesOnSwitch;

impl SwitchInHook for ResetStagesOnSwitch {
    fn on_switch_out(&mut self, outgoing: CombatantId, state: &mut BattleState) -> BattleResult<()> {
        state.combatant_mut(outgoing)?.reset_stages();
        Ok(())
    }
}

/// Everything an executing action may touch.
pub struct ActionContext<'a> {
    pub state: &'a mut BattleState,
    pub queue: &'a mut EventQueue<PendingAction>,
    pub listeners: &'a mut ListenerRegistry,
    pub rng: &'a mut dyn RandomSource,
    pub config: &'a BattleConfig,
    pub bus: &'a mut EventBus,
    pub providers: &'a mut [Box<dyn DecisionProvider>; 2],
    pub switch_hook: &'a mut dyn SwitchInHook,
    /// Key the executing action was dequeued with.
    pub key: PriorityKey,
}

impl ActionContext<'_> {
    pub fn emit(&mut self, event: BattleEvent) {
        self.bus.push(event);
    }

    fn fail(&mut self, side: SideId, reason: ActionFailureReason) {
        debug!(%side, ?reason, "action failed");
        self.bus.push(BattleEvent::ActionFailed { side, reason });
    }
}

impl PendingAction {
    /// Action for one declared move effect aimed at `target`.
    pub fn from_move_effect(effect: &MoveEffect, source: SideId, target: SlotRef) -> Self {
        match effect {
            MoveEffect::StatChange { stat, stages, .. } => PendingAction::Effect {
                source,
                target,
                effect: EffectKind::StatStage {
                    stat: *stat,
                    delta: *stages,
                },
            },
            MoveEffect::Inflict { status, .. } => PendingAction::ApplyStatus {
                source,
                target,
                status: *status,
            },
            MoveEffect::Heal(percent) => PendingAction::Effect {
                source,
                target,
                effect: EffectKind::Heal { percent: *percent },
            },
            MoveEffect::CureStatus => PendingAction::Effect {
                source,
                target,
                effect: EffectKind::CureStatus,
            },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            PendingAction::Choose { .. } => ActionKind::Choose,
            PendingAction::SwitchIn { .. } => ActionKind::SwitchIn,
            PendingAction::Move { .. } => ActionKind::Move,
            PendingAction::Damage { .. } => ActionKind::Damage,
            PendingAction::Effect { .. } => ActionKind::Effect,
            PendingAction::ApplyStatus { .. } => ActionKind::ApplyStatus,
        }
    }

    /// The side that caused this action.
    pub fn side(&self) -> SideId {
        match self {
            PendingAction::Choose { side, .. } | PendingAction::SwitchIn { side, .. } => *side,
            PendingAction::Move { user, .. } => user.side,
            PendingAction::Damage { source, .. } => source.side,
            PendingAction::Effect { source, .. } | PendingAction::ApplyStatus { source, .. } => *source,
        }
    }

    pub fn is_move_by(&self, id: CombatantId) -> bool {
        matches!(self, PendingAction::Move { user, .. } if *user == id)
    }

    pub fn execute(self, ctx: &mut ActionContext<'_>) -> BattleResult<()> {
        match self {
            PendingAction::Choose { side, mode } => resolve_choice(ctx, side, mode),
            PendingAction::SwitchIn { side, slot, team_index } => execute_switch(ctx, side, slot, team_index),
            PendingAction::Move { user, slot, choice } => execute_move(ctx, user, slot, choice),
            PendingAction::Damage {
                source,
                target,
                amount,
                secondary,
            } => execute_damage(ctx, source, target, amount, &secondary),
            PendingAction::Effect { source, target, effect } => execute_effect(ctx, source, target, effect),
            PendingAction::ApplyStatus { source, target, status } => {
                execute_apply_status(ctx, source, target, status)
            }
        }
    }
}

fn execute_switch(ctx: &mut ActionContext<'_>, side: SideId, slot: usize, team_index: usize) -> BattleResult<()> {
    let side_state = ctx.state.side(side);
    side_state.combatant(team_index)?;
    let current = side_state.active_index(slot)?;

    if current == team_index {
        ctx.fail(side, ActionFailureReason::AlreadyActive);
        return Ok(());
    }
    if !side_state.can_switch_to(team_index) {
        ctx.fail(side, ActionFailureReason::SwitchTargetUnavailable);
        return Ok(());
    }

    let outgoing = CombatantId::new(side, current);
    let incoming = CombatantId::new(side, team_index);
    ctx.switch_hook.on_switch_out(outgoing, ctx.state)?;
    ctx.state.side_mut(side).set_active(slot, team_index)?;
    debug!(%side, from = current, to = team_index, "switched");
    ctx.emit(BattleEvent::CombatantSwitched {
        side,
        previous: Some(current),
        incoming,
    });
    ctx.switch_hook.on_switch_in(incoming, ctx.state, ctx.bus)?;
    Ok(())
}

fn execute_move(ctx: &mut ActionContext<'_>, user: CombatantId, slot: usize, choice: MoveChoice) -> BattleResult<()> {
    if ctx.state.side(user.side).active_index(slot)? != user.team_index {
        ctx.fail(user.side, ActionFailureReason::UserNotActive);
        return Ok(());
    }
    let combatant = ctx.state.combatant(user)?;
    if combatant.is_fainted() {
        ctx.fail(user.side, ActionFailureReason::UserFainted);
        return Ok(());
    }

    let move_data = match choice {
        MoveChoice::Known(move_index) => {
            let move_slot = combatant
                .move_slot(move_index)
                .ok_or_else(|| BattleStateError::InvalidMoveIndex {
                    name: combatant.species.clone(),
                    move_index,
                })?;
            if move_slot.disabled {
                ctx.fail(user.side, ActionFailureReason::MoveDisabled);
                return Ok(());
            }
            if move_slot.pp == 0 {
                ctx.fail(user.side, ActionFailureReason::NoPpRemaining);
                return Ok(());
            }
            let data = move_slot.data.clone();
            if let Some(move_slot) = ctx.state.combatant_mut(user)?.move_slot_mut(move_index) {
                move_slot.use_move();
            }
            data
        }
        MoveChoice::Struggle => MoveData::struggle(),
    };

    ctx.emit(BattleEvent::MoveUsed {
        user,
        move_name: move_data.name.clone(),
    });

    let target = match move_data.target {
        MoveTarget::User => SlotRef::new(user.side, slot),
        MoveTarget::Opponent => SlotRef::new(user.side.opponent(), ACTIVE_SLOT),
    };
    let target_id = target.resolve(ctx.state)?;
    if ctx.state.combatant(target_id)?.is_fainted() {
        ctx.fail(user.side, ActionFailureReason::NoTarget);
        return Ok(());
    }

    if move_data.target == MoveTarget::Opponent && !move_hits(&move_data, ctx.rng) {
        ctx.emit(BattleEvent::MoveMissed {
            user,
            move_name: move_data.name.clone(),
        });
        return Ok(());
    }

    if move_data.is_damaging() {
        let effectiveness = type_effectiveness(move_data.move_type, ctx.state.combatant(target_id)?);
        if effectiveness == 0.0 {
            ctx.emit(BattleEvent::MoveHadNoEffect {
                user,
                target: target_id,
                move_name: move_data.name.clone(),
            });
            return Ok(());
        }

        let variance = ctx.rng.damage_variance();
        let attacker = ctx.state.combatant(user)?;
        let amount = calculate_damage(
            attacker,
            ctx.state.combatant(target_id)?,
            &move_data,
            effectiveness,
            variance,
        );
        let follow_up = PriorityKey::for_move(move_data.priority, attacker.effective_speed());
        if effectiveness != 1.0 {
            ctx.emit(BattleEvent::AttackTypeEffectiveness {
                multiplier: effectiveness,
            });
        }
        ctx.queue.insert(
            PendingAction::Damage {
                source: user,
                target,
                amount,
                secondary: move_data.effects,
            },
            follow_up,
        );
    } else {
        for effect in &move_data.effects {
            if ctx.rng.chance(effect.chance(), "move effect") {
                ctx.queue
                    .insert(PendingAction::from_move_effect(effect, user.side, target), ctx.key);
            }
        }
    }
    Ok(())
}

fn execute_damage(
    ctx: &mut ActionContext<'_>,
    source: CombatantId,
    target: SlotRef,
    amount: u16,
    secondary: &[MoveEffect],
) -> BattleResult<()> {
    let target_id = target.resolve(ctx.state)?;
    let combatant = ctx.state.combatant_mut(target_id)?;
    if combatant.is_fainted() {
        ctx.fail(source.side, ActionFailureReason::TargetFainted);
        return Ok(());
    }

    let damage = combatant.take_damage(amount);
    let remaining_hp = combatant.hp();
    let fainted = combatant.is_fainted();
    ctx.emit(BattleEvent::DamageDealt {
        target: target_id,
        damage,
        remaining_hp,
    });

    if !fainted {
        for effect in secondary {
            if ctx.rng.chance(effect.chance(), "secondary effect") {
                ctx.queue
                    .insert(PendingAction::from_move_effect(effect, source.side, target), ctx.key);
            }
        }
    }
    Ok(())
}

fn execute_effect(ctx: &mut ActionContext<'_>, source: SideId, target: SlotRef, effect: EffectKind) -> BattleResult<()> {
    let target_id = target.resolve(ctx.state)?;
    let combatant = ctx.state.combatant_mut(target_id)?;
    if combatant.is_fainted() {
        ctx.fail(source, ActionFailureReason::TargetFainted);
        return Ok(());
    }

    match effect {
        EffectKind::StatStage { stat, delta } => {
            let stat_ref = combatant.stat_mut(stat);
            let old_stage = stat_ref.stage();
            let applied = stat_ref.boost(delta);
            if applied == 0 {
                ctx.emit(BattleEvent::StatChangeBlocked {
                    target: target_id,
                    stat,
                    rising: delta > 0,
                });
            } else {
                ctx.emit(BattleEvent::StatStageChanged {
                    target: target_id,
                    stat,
                    old_stage,
                    new_stage: old_stage + applied,
                });
            }
        }
        EffectKind::Heal { percent } => {
            if combatant.hp() == combatant.hp_max() {
                ctx.fail(source, ActionFailureReason::HpFull);
                return Ok(());
            }
            let amount = ((combatant.hp_max() as u32 * percent as u32) / 100).max(1) as u16;
            let gained = combatant.restore_hp(amount);
            let new_hp = combatant.hp();
            ctx.emit(BattleEvent::Healed {
                target: target_id,
                amount: gained,
                new_hp,
            });
        }
        EffectKind::CureStatus => match combatant.cure_status() {
            Some(status) => ctx.emit(BattleEvent::StatusCured {
                target: target_id,
                status,
            }),
            None => ctx.fail(source, ActionFailureReason::NothingToCure),
        },
    }
    Ok(())
}

fn execute_apply_status(
    ctx: &mut ActionContext<'_>,
    source: SideId,
    target: SlotRef,
    status: StatusKind,
) -> BattleResult<()> {
    let target_id = target.resolve(ctx.state)?;
    let combatant = ctx.state.combatant_mut(target_id)?;
    if combatant.is_fainted() {
        ctx.fail(source, ActionFailureReason::TargetFainted);
        return Ok(());
    }
    if !combatant.apply_status(status) {
        ctx.fail(source, ActionFailureReason::AlreadyHasStatus);
        return Ok(());
    }

    let listener = StatusListener::attach(status, combatant, ctx.rng, ctx.config);
    ctx.listeners.register(target_id, listener);
    ctx.emit(BattleEvent::StatusApplied {
        target: target_id,
        status,
    });
    Ok(())
}
