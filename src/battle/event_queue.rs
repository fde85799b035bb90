use crate::battle::priority::PriorityKey;
use crate::battle::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tracing::trace;

/// Identity of one queued action. Unique for the lifetime of a queue, so an
/// executed action can never come back under the same ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket(pub u64);

/// An action that has been taken off the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Queued<T> {
    pub ticket: Ticket,
    pub key: PriorityKey,
    pub action: T,
}

/// Read-only view of a pending action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingView<'a, T> {
    pub ticket: Ticket,
    pub key: PriorityKey,
    pub action: &'a T,
}

#[derive(Debug)]
struct Entry<T> {
    key: PriorityKey,
    ticket: Ticket,
    action: T,
}

// Heap placement only looks at (key, ticket); both are pure values.
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.ticket == other.ticket
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.ticket.cmp(&other.ticket))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of pending actions ordered by [`PriorityKey`].
///
/// When several entries share the minimum key, `pop_min` picks one of them
/// with an explicit draw from the random source; the losers stay queued.
#[derive(Debug)]
pub struct EventQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_ticket: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_ticket: 0,
        }
    }

    pub fn insert(&mut self, action: T, key: PriorityKey) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        trace!(ticket = ticket.0, %key, "queued action");
        self.heap.push(Reverse(Entry { key, ticket, action }));
        ticket
    }

    /// Remove and return the action that resolves first.
    pub fn pop_min(&mut self, rng: &mut dyn RandomSource) -> Option<Queued<T>> {
        let Reverse(head) = self.heap.pop()?;
        let mut tied = vec![head];
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(next)| next.key == tied[0].key)
        {
            if let Some(Reverse(next)) = self.heap.pop() {
                tied.push(next);
            }
        }

        let chosen = if tied.len() > 1 {
            let pick = rng.pick_index(tied.len(), "speed tie");
            trace!(tied = tied.len(), pick, "broke exact priority tie");
            let chosen = tied.swap_remove(pick);
            for entry in tied {
                self.heap.push(Reverse(entry));
            }
            chosen
        } else {
            tied.pop()?
        };

        Some(Queued {
            ticket: chosen.ticket,
            key: chosen.key,
            action: chosen.action,
        })
    }

    /// Remove every pending action matching `predicate` in one pass and
    /// return them in resolution order.
    pub fn remove_if<F>(&mut self, mut predicate: F) -> Vec<Queued<T>>
    where
        F: FnMut(Ticket, &T) -> bool,
    {
        let (mut removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(|Reverse(entry)| predicate(entry.ticket, &entry.action));
        self.heap = BinaryHeap::from(kept);
        removed.sort_by(|a, b| a.0.cmp(&b.0));
        removed
            .into_iter()
            .map(|Reverse(entry)| Queued {
                ticket: entry.ticket,
                key: entry.key,
                action: entry.action,
            })
            .collect()
    }

    pub fn contains(&self, ticket: Ticket) -> bool {
        self.heap.iter().any(|Reverse(entry)| entry.ticket == ticket)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Pending actions in resolution order (ties listed by ticket). Never mutates.
    pub fn snapshot(&self) -> Vec<PendingView<'_, T>> {
        let mut entries: Vec<&Entry<T>> = self.heap.iter().map(|Reverse(entry)| entry).collect();
        entries.sort();
        entries
            .into_iter()
            .map(|entry| PendingView {
                ticket: entry.ticket,
                key: entry.key,
                action: &entry.action,
            })
            .collect()
    }
}
