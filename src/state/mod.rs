//! State management module
//! 
//! This module wraps the countdown engine in shared, observable state.

pub mod app_state;
pub mod events;
pub mod preferences;

// Re-export main types
pub use app_state::AppState;
pub use events::CountdownEvent;
pub use preferences::{Preferences, PreferencesUpdate};
