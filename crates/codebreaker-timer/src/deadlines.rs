//! Keyed one-shot deadlines.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// Handle to one scheduled deadline.
///
/// Ids are never reused by the same [`Deadlines`], so a holder can tell
/// whether the timer it remembers is still the one that is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// A deadline that elapsed, returned by [`Deadlines::expired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired<K> {
    pub id: TimerId,
    pub key: K,
}

/// A set of one-shot timers, each carrying a key that says what it is for.
pub struct Deadlines<K> {
    next_id: u64,
    entries: HashMap<TimerId, (Instant, K)>,
}

impl<K> Deadlines<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
        }
    }

    /// Schedules `key` to expire `after` from now.
    pub fn schedule(&mut self, key: K, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, (Instant::now() + after, key));
        trace!(%id, after_ms = after.as_millis() as u64, "deadline scheduled");
        id
    }

    /// Cancels a pending deadline. Returns its key if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<K> {
        let removed = self.entries.remove(&id).map(|(_, key)| key);
        if removed.is_some() {
            trace!(%id, "deadline cancelled");
        }
        removed
    }

    /// Returns `true` if `id` is still pending.
    pub fn contains(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Cancels everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of pending deadlines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Waits for the earliest pending deadline and removes it.
    ///
    /// Pends forever while nothing is scheduled. Cancel-safe: the entry is
    /// only removed after the sleep completes, so dropping this future in
    /// a `select!` loses nothing. Ties are broken by scheduling order.
    pub async fn expired(&mut self) -> Expired<K> {
        let Some((id, deadline)) = self
            .entries
            .iter()
            .map(|(id, (deadline, _))| (*id, *deadline))
            .min_by_key(|(id, deadline)| (*deadline, *id))
        else {
            return std::future::pending::<Expired<K>>().await;
        };

        time::sleep_until(deadline).await;

        match self.entries.remove(&id) {
            Some((_, key)) => {
                trace!(%id, "deadline expired");
                Expired { id, key }
            }
            // Only reachable if the entry vanished while we slept, which
            // `&mut self` rules out.
            None => std::future::pending::<Expired<K>>().await,
        }
    }
}

impl<K> Default for Deadlines<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for Deadlines<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deadlines")
            .field("pending", &self.entries.len())
            .finish()
    }
}
