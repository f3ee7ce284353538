//! Countdown engine module
//!
//! This module contains the countdown state machine and the time arithmetic
//! it is built on. Nothing here touches a clock, a channel or a lock.

pub mod countdown;
pub mod time;

// Re-export main types
pub use countdown::{
    Countdown, CountdownTarget, Mode, PauseOutcome, RunState, Snapshot, StartOutcome, StartRequest,
    TickOutcome,
};
pub use time::{Meridiem, RemainingTime};
