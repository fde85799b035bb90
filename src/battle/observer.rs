//! Consumers of the battle event stream.

use crate::battle::state::{BattleEvent, BattleState};
use serde::Serialize;
use std::io::Write;
use tracing::{debug, info, warn};

/// Receives every event in emission order, with the state as it stood when
/// the engine flushed the event.
pub trait BattleObserver {
    fn on_event(&mut self, event: &BattleEvent, state: &BattleState);
}

/// Logs formatted event text at `info` and silent events at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BattleObserver for TracingObserver {
    fn on_event(&mut self, event: &BattleEvent, state: &BattleState) {
        match event.format(state) {
            Some(text) => info!(battle = %state.battle_id, turn = state.turn_number, "{text}"),
            None => debug!(battle = %state.battle_id, turn = state.turn_number, ?event),
        }
    }
}

#[derive(Serialize)]
struct EventRecord<'a> {
    battle_id: &'a str,
    turn: u32,
    event: &'a BattleEvent,
}

/// Writes one JSON object per event.
pub struct JsonLinesObserver<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> BattleObserver for JsonLinesObserver<W> {
    fn on_event(&mut self, event: &BattleEvent, state: &BattleState) {
        let record = EventRecord {
            battle_id: &state.battle_id,
            turn: state.turn_number,
            event,
        };
        let written = serde_json::to_writer(&mut self.writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.writer));
        if let Err(err) = written {
            warn!(%err, "failed to write battle event");
        }
    }
}

/// Keeps a copy of every event; handy in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub events: Vec<BattleEvent>,
}

impl BattleObserver for RecordingObserver {
    fn on_event(&mut self, event: &BattleEvent, _state: &BattleState) {
        self.events.push(event.clone());
    }
}
