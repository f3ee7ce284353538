//! Countdown lifecycle events

use serde::{Deserialize, Serialize};

use crate::engine::Mode;

/// Lifecycle transitions broadcast to background tasks and subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CountdownEvent {
    Started { mode: Mode },
    Paused,
    Resumed,
    Reset,
    /// Sent once per run, when the countdown reaches zero
    Completed,
}

impl CountdownEvent {
    /// Name used for logging and as the server-sent event type
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Reset => "reset",
            Self::Completed => "completed",
        }
    }

    /// Whether the periodic tick must stop after this event
    pub fn stops_ticking(&self) -> bool {
        matches!(self, Self::Paused | Self::Reset | Self::Completed)
    }
}
