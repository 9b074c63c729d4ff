//! In-actor timers for Codebreaker rooms.
//!
//! A room actor owns all of its timers and awaits them inside its
//! `tokio::select!` loop next to the command channel. Nothing is spawned,
//! so a timer that fires and a command that races it are handled one
//! after the other by the same task, and dropping the actor drops every
//! pending timer with it.
//!
//! - [`Deadlines`]: keyed one-shot timers (disconnect and exhausted-player
//!   grace periods).
//! - [`Countdown`]: a 1 Hz countdown (rematch voting window).
//!
//! Both pend forever when they have nothing scheduled:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = rx.recv() => { /* handle command */ }
//!         fired = grace.expired() => { /* fired.key timed out */ }
//!         tick = countdown.tick() => { /* tick.remaining seconds left */ }
//!     }
//! }
//! ```
//!
//! All instants are [`tokio::time::Instant`], so tests running with a
//! paused clock see deadlines elapse deterministically.

mod countdown;
mod deadlines;

pub use countdown::{Countdown, CountdownTick};
pub use deadlines::{Deadlines, Expired, TimerId};
