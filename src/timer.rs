//! Cancelable scheduled callbacks on a caller-driven clock.
//!
//! Nothing here sleeps or spawns: the owner asks for due timers by passing
//! the current time, which keeps timer-driven state machines deterministic
//! and lets teardown cancel everything in one call.

/// Milliseconds on the caller's monotonic clock.
pub type Millis = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer<K> {
    pub id: TimerId,
    pub due: Millis,
    pub kind: K,
}

#[derive(Debug)]
pub struct TimerQueue<K> {
    next_id: u64,
    pending: Vec<FiredTimer<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: K, due: Millis) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(FiredTimer { id, due, kind });
        id
    }

    /// Returns `false` when the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        self.pending.len() != before
    }

    /// Cancels every pending timer and returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|timer| timer.id == id)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.iter().map(|timer| timer.due).min()
    }

    /// Removes and returns the earliest timer due at or before `now`.
    /// Timers with the same deadline fire in scheduling order.
    pub fn pop_due(&mut self, now: Millis) -> Option<FiredTimer<K>> {
        let position = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by_key(|(_, timer)| (timer.due, timer.id))
            .map(|(position, _)| position)?;
        Some(self.pending.remove(position))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
