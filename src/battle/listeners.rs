//! Status listeners.
//!
//! Every major status owns one listener bound to the afflicted combatant's
//! [`CombatantId`]. The engine notifies all registered listeners after each
//! resolved action; a listener may change stats, deal residual damage, cure
//! its own status, or cancel its owner's queued move. Listeners detach
//! themselves once their status is gone, and the engine drops all of a
//! combatant's listeners at once when it faints.

use crate::battle::actions::PendingAction;
use crate::battle::event_queue::{EventQueue, Ticket};
use crate::battle::rng::RandomSource;
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, EventBus};
use crate::config::BattleConfig;
use crate::errors::BattleResult;
use crate::player::CombatantId;
use crate::pokemon::Combatant;
use schema::StatusKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// What a listener may touch while reacting.
pub struct ListenerContext<'a> {
    pub state: &'a mut BattleState,
    pub queue: &'a mut EventQueue<PendingAction>,
    pub rng: &'a mut dyn RandomSource,
    pub config: &'a BattleConfig,
    pub bus: &'a mut EventBus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerVerdict {
    Keep,
    Detach,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum StatusListener {
    Paralysis {
        original_speed: u16,
        /// Last queued move already rolled for; each move is judged once.
        judged: Option<Ticket>,
    },
    Poison,
    Toxic {
        counter: u16,
    },
    Burn {
        original_attack: u16,
    },
    Sleep {
        remaining: u8,
    },
    Freeze,
}

impl StatusListener {
    /// Build the listener for a freshly applied status and make its one-time
    /// changes to the combatant.
    pub fn attach(
        kind: StatusKind,
        combatant: &mut Combatant,
        rng: &mut dyn RandomSource,
        config: &BattleConfig,
    ) -> Self {
        match kind {
            StatusKind::Paralysis => {
                let original_speed = combatant.stats.speed.base();
                let reduced = (original_speed as u32 * config.paralysis_speed_percent as u32 / 100).max(1);
                combatant.stats.speed.set_base(reduced as u16);
                StatusListener::Paralysis {
                    original_speed,
                    judged: None,
                }
            }
            StatusKind::Burn => {
                let original_attack = combatant.stats.attack.base();
                combatant.stats.attack.set_base((original_attack / 2).max(1));
                StatusListener::Burn { original_attack }
            }
            StatusKind::Sleep => {
                let low = config.sleep_turns_min.max(1) as u32;
                let high = (config.sleep_turns_max as u32).max(low);
                let remaining = rng.next_range(low, high, "sleep duration") as u8;
                StatusListener::Sleep { remaining }
            }
            StatusKind::Poison => StatusListener::Poison,
            StatusKind::Toxic => StatusListener::Toxic { counter: 1 },
            StatusKind::Freeze => StatusListener::Freeze,
        }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            StatusListener::Paralysis { .. } => StatusKind::Paralysis,
            StatusListener::Poison => StatusKind::Poison,
            StatusListener::Toxic { .. } => StatusKind::Toxic,
            StatusListener::Burn { .. } => StatusKind::Burn,
            StatusListener::Sleep { .. } => StatusKind::Sleep,
            StatusListener::Freeze => StatusKind::Freeze,
        }
    }

    /// Undo one-time stat changes. Called when the status has been cured.
    fn restore(&self, combatant: &mut Combatant) {
        match self {
            StatusListener::Paralysis { original_speed, .. } => combatant.stats.speed.set_base(*original_speed),
            StatusListener::Burn { original_attack } => combatant.stats.attack.set_base(*original_attack),
            _ => {}
        }
    }

    pub fn on_action_resolved(&mut self, owner: CombatantId, ctx: &mut ListenerContext<'_>) -> BattleResult<ListenerVerdict> {
        let kind = self.kind();
        let combatant = ctx.state.combatant_mut(owner)?;
        if combatant.is_fainted() {
            return Ok(ListenerVerdict::Detach);
        }
        if !combatant.has_status(kind) {
            self.restore(combatant);
            debug!(?owner, status = %kind, "status gone, listener detached");
            return Ok(ListenerVerdict::Detach);
        }
        let active = ctx.state.is_active(owner);

        match self {
            StatusListener::Paralysis { judged, .. } => {
                if let Some(ticket) = queued_move(ctx.queue, owner) {
                    if *judged != Some(ticket) {
                        *judged = Some(ticket);
                        if ctx.rng.chance(ctx.config.paralysis_skip_chance, "paralysis") {
                            cancel_move(ctx, owner, ticket, ActionFailureReason::IsParalyzed);
                        }
                    }
                }
                Ok(ListenerVerdict::Keep)
            }
            StatusListener::Poison | StatusListener::Burn { .. } => {
                let hp_max = ctx.state.combatant(owner)?.hp_max();
                let damage = (hp_max / ctx.config.residual_divisor.max(1)).max(1);
                residual_damage(ctx, owner, kind, damage)?;
                Ok(ListenerVerdict::Keep)
            }
            StatusListener::Toxic { counter } => {
                if !active {
                    *counter = 1;
                    return Ok(ListenerVerdict::Keep);
                }
                let hp_max = ctx.state.combatant(owner)?.hp_max() as u32;
                let damage = (hp_max * *counter as u32 / ctx.config.toxic_divisor.max(1) as u32).max(1);
                *counter = counter.saturating_add(1);
                residual_damage(ctx, owner, kind, damage.min(u16::MAX as u32) as u16)?;
                Ok(ListenerVerdict::Keep)
            }
            StatusListener::Sleep { remaining } => {
                let Some(ticket) = queued_move(ctx.queue, owner) else {
                    return Ok(ListenerVerdict::Keep);
                };
                cancel_move(ctx, owner, ticket, ActionFailureReason::IsAsleep);
                *remaining = remaining.saturating_sub(1);
                trace!(?owner, remaining = *remaining, "sleep counter");
                if *remaining == 0 {
                    cure(ctx, owner)?;
                    return Ok(ListenerVerdict::Detach);
                }
                Ok(ListenerVerdict::Keep)
            }
            StatusListener::Freeze => {
                let Some(ticket) = queued_move(ctx.queue, owner) else {
                    return Ok(ListenerVerdict::Keep);
                };
                if ctx.rng.chance(ctx.config.freeze_thaw_chance, "freeze thaw") {
                    cure(ctx, owner)?;
                    return Ok(ListenerVerdict::Detach);
                }
                cancel_move(ctx, owner, ticket, ActionFailureReason::IsFrozen);
                Ok(ListenerVerdict::Keep)
            }
        }
    }
}

/// Ticket of the owner's queued move, if it has one.
fn queued_move(queue: &EventQueue<PendingAction>, owner: CombatantId) -> Option<Ticket> {
    queue
        .snapshot()
        .into_iter()
        .find(|pending| pending.action.is_move_by(owner))
        .map(|pending| pending.ticket)
}

fn cancel_move(ctx: &mut ListenerContext<'_>, owner: CombatantId, ticket: Ticket, reason: ActionFailureReason) {
    let removed = ctx.queue.remove_if(|queued, _| queued == ticket);
    if !removed.is_empty() {
        debug!(?owner, ?reason, "queued move cancelled");
        ctx.bus.push(BattleEvent::MoveCancelled { user: owner, reason });
    }
}

fn residual_damage(ctx: &mut ListenerContext<'_>, owner: CombatantId, status: StatusKind, damage: u16) -> BattleResult<()> {
    let combatant = ctx.state.combatant_mut(owner)?;
    let damage = combatant.take_damage(damage);
    let remaining_hp = combatant.hp();
    ctx.bus.push(BattleEvent::StatusDamage {
        target: owner,
        status,
        damage,
        remaining_hp,
    });
    Ok(())
}

fn cure(ctx: &mut ListenerContext<'_>, owner: CombatantId) -> BattleResult<()> {
    if let Some(status) = ctx.state.combatant_mut(owner)?.cure_status() {
        ctx.bus.push(BattleEvent::StatusCured { target: owner, status });
    }
    Ok(())
}

/// Active listeners keyed by combatant identity, kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    entries: BTreeMap<CombatantId, Vec<StatusListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, owner: CombatantId, listener: StatusListener) {
        debug!(?owner, status = %listener.kind(), "listener registered");
        self.entries.entry(owner).or_default().push(listener);
    }

    /// Drop every listener bound to `owner`. Returns what was removed.
    pub fn remove_all(&mut self, owner: CombatantId) -> Vec<StatusListener> {
        self.entries.remove(&owner).unwrap_or_default()
    }

    pub fn listeners_for(&self, owner: CombatantId) -> &[StatusListener] {
        self.entries.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, owner: CombatantId, kind: StatusKind) -> bool {
        self.listeners_for(owner).iter().any(|listener| listener.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notify every listener once, ordered by owner and then by registration.
    pub fn notify_all(&mut self, ctx: &mut ListenerContext<'_>) -> BattleResult<()> {
        let owners: Vec<CombatantId> = self.entries.keys().copied().collect();
        for owner in owners {
            let Some(listeners) = self.entries.remove(&owner) else {
                continue;
            };
            let mut kept = Vec::with_capacity(listeners.len());
            for mut listener in listeners {
                if listener.on_action_resolved(owner, ctx)? == ListenerVerdict::Keep {
                    kept.push(listener);
                }
            }
            if !kept.is_empty() {
                self.entries.insert(owner, kept);
            }
        }
        Ok(())
    }
}
