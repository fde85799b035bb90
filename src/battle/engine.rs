//! The turn orchestrator.
//!
//! [`Battle`] owns the state, the event queue and the listener registry. Each
//! turn it seeds one choice request per side, then drains the queue: pop the
//! first-resolving action, execute it, let the status listeners react, and
//! check both sides for newly fainted combatants. The battle ends when a side
//! has nobody left standing or the turn cap is reached.

use crate::battle::actions::{ActionContext, ActionKind, ChoiceMode, PendingAction, ResetStagesOnSwitch, SwitchInHook};
use crate::battle::decision::DecisionProvider;
use crate::battle::event_queue::EventQueue;
use crate::battle::listeners::{ListenerContext, ListenerRegistry, StatusListener};
use crate::battle::observer::BattleObserver;
use crate::battle::priority::PriorityKey;
use crate::battle::rng::RandomSource;
use crate::battle::state::{BattleEvent, BattleOutcome, BattlePhase, BattleState, EndReason, EventBus};
use crate::config::BattleConfig;
use crate::errors::BattleResult;
use crate::player::{CombatantId, SideId, ACTIVE_SLOT};
use schema::StatusKind;
use std::collections::BTreeSet;
use tracing::{debug, info, trace};

pub struct Battle {
    state: BattleState,
    queue: EventQueue<PendingAction>,
    listeners: ListenerRegistry,
    providers: [Box<dyn DecisionProvider>; 2],
    rng: Box<dyn RandomSource>,
    config: BattleConfig,
    switch_hook: Box<dyn SwitchInHook>,
    observers: Vec<Box<dyn BattleObserver>>,
    /// Full event log of the battle.
    bus: EventBus,
    /// How much of `bus` the observers have seen.
    flushed: usize,
    /// Combatants already reported as fainted.
    fainted: BTreeSet<CombatantId>,
    outcome: Option<BattleOutcome>,
}

impl Battle {
    pub fn new(
        state: BattleState,
        player1: Box<dyn DecisionProvider>,
        player2: Box<dyn DecisionProvider>,
        rng: Box<dyn RandomSource>,
        config: BattleConfig,
    ) -> Self {
        Self {
            state,
            queue: EventQueue::new(),
            listeners: ListenerRegistry::new(),
            providers: [player1, player2],
            rng,
            config,
            switch_hook: Box::new(ResetStagesOnSwitch),
            observers: Vec::new(),
            bus: EventBus::new(),
            flushed: 0,
            fainted: BTreeSet::new(),
            outcome: None,
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn BattleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_switch_hook(mut self, hook: Box<dyn SwitchInHook>) -> Self {
        self.switch_hook = hook;
        self
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Direct state access, for setting up scenarios between turns.
    pub fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn queue(&self) -> &EventQueue<PendingAction> {
        &self.queue
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Every event emitted so far.
    pub fn log(&self) -> &EventBus {
        &self.bus
    }

    /// Give a combatant a status outside of a move, attaching its listener.
    /// Returns false if the combatant already has a status.
    pub fn afflict(&mut self, id: CombatantId, kind: StatusKind) -> BattleResult<bool> {
        let combatant = self.state.combatant_mut(id)?;
        if !combatant.apply_status(kind) {
            return Ok(false);
        }
        let listener = StatusListener::attach(kind, combatant, self.rng.as_mut(), &self.config);
        self.listeners.register(id, listener);
        self.bus.push(BattleEvent::StatusApplied { target: id, status: kind });
        self.flush();
        Ok(true)
    }

    /// Report the lead switch-ins. Calling it again is a no-op.
    pub fn start(&mut self) -> BattleResult<EventBus> {
        if self.state.phase != BattlePhase::NotStarted {
            return Ok(EventBus::new());
        }
        let start = self.bus.len();
        info!(battle = %self.state.battle_id, "battle started");
        self.bus.push(BattleEvent::BattleStarted);
        self.attach_existing_statuses()?;

        for side in SideId::ALL {
            let incoming = self.state.side(side).active_id(ACTIVE_SLOT)?;
            self.bus.push(BattleEvent::CombatantSwitched {
                side,
                previous: None,
                incoming,
            });
        }
        self.state.phase = BattlePhase::AwaitingChoices;

        // A fainted lead is replaced before the first turn.
        self.check_faints()?;
        self.drain()?;
        self.flush();
        Ok(self.events_from(start))
    }

    /// Resolve one full turn and return the events it produced.
    pub fn run_turn(&mut self) -> BattleResult<EventBus> {
        let start = self.bus.len();
        if self.state.phase == BattlePhase::NotStarted {
            self.start()?;
        }
        if self.outcome.is_some() {
            return Ok(self.events_from(start));
        }

        self.state.turn_number += 1;
        self.state.phase = BattlePhase::AwaitingChoices;
        let turn_number = self.state.turn_number;
        debug!(turn_number, "turn started");
        self.bus.push(BattleEvent::TurnStarted { turn_number });

        for side in SideId::ALL {
            if !self.state.side(side).active(ACTIVE_SLOT)?.is_fainted() {
                self.queue.insert(
                    PendingAction::Choose {
                        side,
                        mode: ChoiceMode::Turn,
                    },
                    PriorityKey::choice_for(side),
                );
            }
        }

        self.state.phase = BattlePhase::Draining;
        self.drain()?;

        if self.outcome.is_none() {
            self.state.phase = BattlePhase::TurnBoundary;
            self.bus.push(BattleEvent::TurnEnded { turn_number });
            if turn_number >= self.config.max_turns {
                self.finish(BattleOutcome {
                    winner: None,
                    turns: turn_number,
                    reason: EndReason::TurnLimit,
                });
            } else {
                self.state.phase = BattlePhase::AwaitingChoices;
            }
        }
        self.flush();
        Ok(self.events_from(start))
    }

    /// Run turns until the battle is over.
    pub fn run(&mut self) -> BattleResult<BattleOutcome> {
        self.start()?;
        loop {
            if let Some(outcome) = self.outcome {
                return Ok(outcome);
            }
            self.run_turn()?;
        }
    }

    fn drain(&mut self) -> BattleResult<()> {
        while self.outcome.is_none() {
            let Some(queued) = self.queue.pop_min(self.rng.as_mut()) else {
                break;
            };
            let kind = queued.action.kind();
            let side = queued.action.side();
            trace!(ticket = ?queued.ticket, key = %queued.key, ?kind, %side, "executing");

            let mut ctx = ActionContext {
                state: &mut self.state,
                queue: &mut self.queue,
                listeners: &mut self.listeners,
                rng: self.rng.as_mut(),
                config: &self.config,
                bus: &mut self.bus,
                providers: &mut self.providers,
                switch_hook: self.switch_hook.as_mut(),
                key: queued.key,
            };
            queued.action.execute(&mut ctx)?;
            self.bus.push(BattleEvent::ActionResolved { side, kind });
            self.check_faints()?;

            let choices_locked = kind == ActionKind::Choose && !self.choice_pending();
            if self.outcome.is_none() && (kind != ActionKind::Choose || choices_locked) {
                self.notify_listeners()?;
                self.check_faints()?;
            }
            self.flush();
        }
        Ok(())
    }

    fn choice_pending(&self) -> bool {
        self.queue
            .snapshot()
            .iter()
            .any(|pending| pending.action.kind() == ActionKind::Choose)
    }

    fn notify_listeners(&mut self) -> BattleResult<()> {
        if self.listeners.is_empty() {
            return Ok(());
        }
        let mut ctx = ListenerContext {
            state: &mut self.state,
            queue: &mut self.queue,
            rng: self.rng.as_mut(),
            config: &self.config,
            bus: &mut self.bus,
        };
        self.listeners.notify_all(&mut ctx)
    }

    /// Inspect every combatant on both sides. Newly fainted ones are reported,
    /// lose their listeners and their queued moves; then the battle either
    /// ends or asks for replacements.
    fn check_faints(&mut self) -> BattleResult<()> {
        let state = &self.state;
        self.fainted.retain(|id| state.combatant(*id).is_ok_and(|c| c.is_fainted()));
        let newly_fainted: Vec<CombatantId> = self
            .state
            .all_combatants()
            .filter(|(id, combatant)| combatant.is_fainted() && !self.fainted.contains(id))
            .map(|(id, _)| id)
            .collect();

        for id in newly_fainted {
            self.fainted.insert(id);
            self.bus.push(BattleEvent::Fainted { target: id });
            let removed = self.listeners.remove_all(id);
            let cancelled = self.queue.remove_if(|_, action| action.is_move_by(id));
            debug!(?id, listeners = removed.len(), moves = cancelled.len(), "combatant fainted");
        }

        let defeated: Vec<SideId> = SideId::ALL
            .into_iter()
            .filter(|side| self.state.side(*side).is_defeated())
            .collect();
        if !defeated.is_empty() {
            for side in &defeated {
                self.bus.push(BattleEvent::PlayerDefeated { side: *side });
            }
            let (winner, reason) = match defeated.as_slice() {
                [loser] => (Some(loser.opponent()), EndReason::Knockout),
                _ => (None, EndReason::DoubleKnockout),
            };
            self.finish(BattleOutcome {
                winner,
                turns: self.state.turn_number,
                reason,
            });
            return Ok(());
        }

        for side in SideId::ALL {
            let side_state = self.state.side(side);
            let needs_replacement =
                side_state.active(ACTIVE_SLOT)?.is_fainted() && !side_state.available_switches().is_empty();
            if needs_replacement && !self.replacement_pending(side) {
                self.queue.insert(
                    PendingAction::Choose {
                        side,
                        mode: ChoiceMode::Replacement,
                    },
                    PriorityKey::replacement_for(side),
                );
            }
        }
        Ok(())
    }

    fn replacement_pending(&self, side: SideId) -> bool {
        let replacement = PendingAction::Choose {
            side,
            mode: ChoiceMode::Replacement,
        };
        self.queue.snapshot().iter().any(|pending| *pending.action == replacement)
    }

    fn attach_existing_statuses(&mut self) -> BattleResult<()> {
        let statused: Vec<(CombatantId, StatusKind)> = self
            .state
            .all_combatants()
            .filter_map(|(id, combatant)| combatant.status().kind().map(|kind| (id, kind)))
            .filter(|(id, kind)| !self.listeners.has(*id, *kind))
            .collect();
        for (id, kind) in statused {
            let combatant = self.state.combatant_mut(id)?;
            let listener = StatusListener::attach(kind, combatant, self.rng.as_mut(), &self.config);
            self.listeners.register(id, listener);
        }
        Ok(())
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        info!(winner = ?outcome.winner, turns = outcome.turns, reason = ?outcome.reason, "battle over");
        self.state.phase = BattlePhase::BattleOver;
        self.outcome = Some(outcome);
        self.queue.clear();
        self.bus.push(BattleEvent::BattleEnded { outcome });
    }

    fn flush(&mut self) {
        let pending = self.bus.events_since(self.flushed);
        for observer in &mut self.observers {
            for event in pending {
                observer.on_event(event, &self.state);
            }
        }
        self.flushed = self.bus.len();
    }

    fn events_from(&self, start: usize) -> EventBus {
        let mut bus = EventBus::new();
        for event in self.bus.events_since(start) {
            bus.push(event.clone());
        }
        bus
    }
}
