//! Countdown Server - A state-managed HTTP server hosting a countdown timer
//! 
//! The countdown runs either for a fixed duration or until a wall-clock end
//! time, is recomputed once per second by a single background ticker, and is
//! observable over HTTP and server-sent events.

pub mod api;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{Countdown, Mode, RunState, Snapshot, StartRequest};
pub use error::{AppError, AppResult};
pub use state::AppState;
pub use tasks::countdown_ticker_task;
pub use utils::signals::shutdown_signal;
