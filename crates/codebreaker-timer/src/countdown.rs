//! A 1 Hz countdown.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

/// One elapsed second of a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    /// Seconds left after this tick. `0` means the countdown just ended.
    pub remaining: u32,
}

/// Counts down whole seconds, yielding once per second.
///
/// ```text
/// start(3) ──1s──→ tick{2} ──1s──→ tick{1} ──1s──→ tick{0} (idle)
/// ```
///
/// Restarting while running begins again from the new value. The next
/// tick is always scheduled a full period after the previous one was
/// observed, so a slow consumer never sees a burst of ticks.
#[derive(Debug)]
pub struct Countdown {
    period: Duration,
    remaining: u32,
    next_tick: Option<Instant>,
}

impl Countdown {
    /// An idle countdown with a one-second period.
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    /// An idle countdown with a custom period.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            remaining: 0,
            next_tick: None,
        }
    }

    /// Starts (or restarts) counting down from `secs`.
    ///
    /// Starting from zero leaves the countdown idle.
    pub fn start(&mut self, secs: u32) {
        self.remaining = secs;
        self.next_tick = (secs > 0).then(|| Instant::now() + self.period);
        debug!(secs, "countdown started");
    }

    /// Stops the countdown without a final tick.
    pub fn cancel(&mut self) {
        if self.next_tick.take().is_some() {
            debug!(remaining = self.remaining, "countdown cancelled");
        }
        self.remaining = 0;
    }

    /// Whether a tick is still to come.
    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Seconds left, or `None` while idle.
    pub fn remaining(&self) -> Option<u32> {
        self.is_running().then_some(self.remaining)
    }

    /// Waits for the next second to elapse.
    ///
    /// Pends forever while idle. Cancel-safe.
    pub async fn tick(&mut self) -> CountdownTick {
        let Some(next) = self.next_tick else {
            return std::future::pending::<CountdownTick>().await;
        };

        time::sleep_until(next).await;

        self.remaining = self.remaining.saturating_sub(1);
        self.next_tick = if self.remaining == 0 {
            None
        } else {
            Some(Instant::now() + self.period)
        };
        CountdownTick {
            remaining: self.remaining,
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}
