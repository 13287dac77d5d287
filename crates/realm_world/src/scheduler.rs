//! Centralized cancelable scheduler driven by a virtual clock.
//!
//! Every delayed action in a world (item blink and despawn, respawns, mob
//! return and idle disconnects) is queued here instead of being owned by the
//! entity it concerns. Scheduling hands back a [`TimerToken`]; cancelling the
//! token guarantees the action is never returned by [`Scheduler::pop_due`].
//!
//! Time only moves when the owner calls [`Scheduler::pop_due`] and
//! [`Scheduler::advance_to`], which keeps timer behavior deterministic in
//! tests.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

/// Handle to a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Slot {
    due_ms: u64,
    seq: u64,
}

impl PartialEq for Slot {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.seq == other.seq
    }
}
impl Eq for Slot {}
impl PartialOrd for Slot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Slot {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.due_ms.cmp(&other.due_ms) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            o => o,
        }
    }
}

/// Time ordered queue of actions of type `A`.
#[derive(Debug)]
pub struct Scheduler<A> {
    now_ms: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Slot>>,
    pending: HashMap<u64, A>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 1,
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }

    /// Current virtual time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of actions still waiting to fire.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Queues `action` to fire `delay_ms` after the current time.
    pub fn schedule_in(&mut self, delay_ms: u64, action: A) -> TimerToken {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        let due_ms = self.now_ms.saturating_add(delay_ms);

        self.queue.push(Reverse(Slot { due_ms, seq }));
        self.pending.insert(seq, action);
        TimerToken(seq)
    }

    /// Removes a pending action. Returns it if it had not fired yet.
    pub fn cancel(&mut self, token: TimerToken) -> Option<A> {
        let action = self.pending.remove(&token.0)?;

        // Cancelled slots are skipped lazily; rebuild once they dominate.
        if self.queue.len() > self.pending.len() * 2 + 64 {
            let pending = &self.pending;
            self.queue.retain(|Reverse(slot)| pending.contains_key(&slot.seq));
        }
        Some(action)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.contains_key(&token.0)
    }

    /// Pops the earliest pending action due at or before `until_ms`.
    ///
    /// The clock moves to the action's due time, so anything scheduled while
    /// handling it is relative to that instant. Actions due at the same time
    /// fire in the order they were scheduled.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<A> {
        loop {
            let Reverse(slot) = *self.queue.peek()?;
            if slot.due_ms > until_ms {
                return None;
            }
            self.queue.pop();

            if let Some(action) = self.pending.remove(&slot.seq) {
                self.now_ms = self.now_ms.max(slot.due_ms);
                return Some(action);
            }
        }
    }

    /// Moves the clock forward without firing anything.
    pub fn advance_to(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}
