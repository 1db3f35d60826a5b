// ── Deferred execution & debouncing ───────────────────────────────────────────
//
// Everything here runs on one logical thread.  The host asks for a callback
// after a delay (`Scheduler::defer`); when it fires, the host hands the
// buffer back to the listener.  `PendingCalls` counts the callbacks still in
// flight per buffer so only the last one of a burst does any work.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    time::{Duration, Instant},
};

use crate::buffer::BufferId;

// ── Host interface ────────────────────────────────────────────────────────────

/// "Call me back about this buffer after `delay`, on the same thread."
pub trait Scheduler {
    fn defer(&mut self, delay: Duration, buffer: BufferId);
}

// ── Debounce bookkeeping ──────────────────────────────────────────────────────

/// Outstanding deferred calls per buffer.
///
/// An entry exists only while at least one call is pending.
#[derive(Debug, Default)]
pub struct PendingCalls {
    counts: HashMap<BufferId, u32>,
}

impl PendingCalls {
    /// Record one more scheduled call for `buffer`.
    pub fn push(&mut self, buffer: BufferId) {
        *self.counts.entry(buffer).or_insert(0) += 1;
    }

    /// Record that one scheduled call fired.
    ///
    /// Returns `true` when it was the last one outstanding, i.e. the caller
    /// should do the real work now.  A call for a buffer with nothing
    /// pending is ignored.
    pub fn pop(&mut self, buffer: BufferId) -> bool {
        let Some(count) = self.counts.get_mut(&buffer) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&buffer);
            true
        } else {
            false
        }
    }

    pub fn pending(&self, buffer: BufferId) -> u32 {
        self.counts.get(&buffer).copied().unwrap_or(0)
    }

    /// Number of buffers with at least one call in flight.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// ── TimerQueue ────────────────────────────────────────────────────────────────

/// A single-threaded deadline queue implementing `Scheduler`.
///
/// The host loop drains it with `pop_due` (non-blocking) or `wait_next`
/// (sleeps until the earliest deadline).  Equal deadlines fire in the order
/// they were scheduled.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(Instant, u64, BufferId)>>,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `buffer` at an explicit deadline.
    pub fn defer_until(&mut self, deadline: Instant, buffer: BufferId) {
        self.seq += 1;
        self.heap.push(Reverse((deadline, self.seq, buffer)));
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Remove and return the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<BufferId> {
        match self.next_deadline() {
            Some(at) if at <= now => self.heap.pop().map(|Reverse((_, _, id))| id),
            _ => None,
        }
    }

    /// Block until the earliest entry is due, then return it.
    pub fn wait_next(&mut self) -> Option<BufferId> {
        let at = self.next_deadline()?;
        let now = Instant::now();
        if at > now {
            std::thread::sleep(at - now);
        }
        self.heap.pop().map(|Reverse((_, _, id))| id)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn defer(&mut self, delay: Duration, buffer: BufferId) {
        self.defer_until(Instant::now() + delay, buffer);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
