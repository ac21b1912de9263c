use std::time::Instant;

/// Delayed actions keyed by `K`, at most one pending per key.
///
/// Scheduling a key that is already pending replaces its deadline.
#[derive(Debug, Clone)]
pub(crate) struct Timers<K> {
    pending: Vec<(K, Instant)>,
}

impl<K> Default for Timers<K> {
    fn default() -> Self {
        Timers {
            pending: Vec::new(),
        }
    }
}

impl<K: Copy + Eq> Timers<K> {
    pub(crate) fn schedule(&mut self, key: K, deadline: Instant) {
        self.cancel(key);
        self.pending.push((key, deadline));
    }

    pub(crate) fn cancel(&mut self, key: K) {
        self.pending.retain(|(k, _)| *k != key);
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline)| *deadline).min()
    }

    /// Removes and returns the earliest action due at `now`.
    ///
    /// Equal deadlines come out in scheduling order.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<(K, Instant)> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (_, deadline))| *deadline <= now)
            .min_by_key(|(i, (_, deadline))| (*deadline, *i))?;
        Some(self.pending.remove(index))
    }
}
