//! One-shot timers on a sorted deadline queue
//!
//! Time only moves when the owner passes a new `now`, so the queue works the
//! same under a real clock, a paused test clock, or a host frame counter.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Handle returned by [`TimerQueue::schedule`], used to cancel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Deadline-ordered set of pending one-shot timers
#[derive(Debug)]
pub struct TimerQueue<T> {
    // (deadline, handle) keeps insertion order for equal deadlines
    entries: BTreeMap<(Instant, u64), T>,
    deadlines: HashMap<u64, Instant>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }

    /// Schedule `value` to fire `after` from `now`.
    pub fn schedule(&mut self, now: Instant, after: Duration, value: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let deadline = now + after;
        self.entries.insert((deadline, id), value);
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.entries.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Remove and return every timer whose deadline is at or before `now`,
    /// earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<(TimerHandle, T)> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            let (deadline, id) = *entry.key();
            if deadline > now {
                break;
            }
            let value = entry.remove();
            self.deadlines.remove(&id);
            due.push((TimerHandle(id), value));
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }
}
