//! Main application state management

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Local, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    engine::{Countdown, PauseOutcome, RunState, Snapshot, StartOutcome, StartRequest, TickOutcome},
    error::{AppError, AppResult},
};
use super::{CountdownEvent, Preferences, PreferencesUpdate};

/// Shared state: the countdown, its observers, preferences and server metadata
#[derive(Debug)]
pub struct AppState {
    /// The single owner of countdown state
    countdown: Mutex<Countdown>,
    clock: Arc<dyn Clock>,
    /// Display preferences and where to persist them
    preferences: Mutex<Preferences>,
    preferences_path: Option<PathBuf>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<String>>,
    last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Lifecycle events, including the one-shot completion signal
    event_tx: broadcast::Sender<CountdownEvent>,
    /// Latest snapshot, replaced on every recomputation
    snapshot_tx: watch::Sender<Snapshot>,
}

impl AppState {
    /// Create a new AppState with an idle countdown and default preferences
    pub fn new(port: u16, host: String, clock: Arc<dyn Clock>) -> Self {
        let countdown = Countdown::new();
        let (event_tx, _) = broadcast::channel(100);
        let (snapshot_tx, _) = watch::channel(countdown.snapshot());

        Self {
            countdown: Mutex::new(countdown),
            clock,
            preferences: Mutex::new(Preferences::default()),
            preferences_path: None,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            event_tx,
            snapshot_tx,
        }
    }

    /// Load preferences from `path` and persist future updates there
    pub fn with_preferences_file(mut self, path: PathBuf) -> AppResult<Self> {
        let preferences = Preferences::load(&path)?;
        self.preferences = Mutex::new(preferences);
        self.preferences_path = Some(path);
        Ok(self)
    }

    fn countdown(&self) -> AppResult<MutexGuard<'_, Countdown>> {
        self.countdown.lock().map_err(|_| AppError::StateLock("countdown"))
    }

    /// Apply a transition to the countdown at the clock's current time
    fn transition<T, F>(&self, apply: F) -> AppResult<(T, Snapshot, DateTime<Local>)>
    where
        F: FnOnce(&mut Countdown, &DateTime<Local>) -> T,
    {
        let now = self.clock.now();
        let mut countdown = self.countdown()?;
        let outcome = apply(&mut countdown, &now);
        let snapshot = countdown.snapshot();
        drop(countdown); // Release the lock before notifying

        Ok((outcome, snapshot, now))
    }

    fn record_action(&self, action: &str, at: &DateTime<Local>) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(at.with_timezone(&Utc));
        }
    }

    fn publish(&self, snapshot: &Snapshot, event: Option<CountdownEvent>) {
        self.snapshot_tx.send_replace(snapshot.clone());

        if let Some(event) = event {
            debug!("Broadcasting countdown event: {}", event.name());
            // No receivers is fine; the ticker may not have subscribed yet
            if let Err(e) = self.event_tx.send(event) {
                debug!("No listeners for {} event: {}", event.name(), e);
            }
        }
    }

    /// Start a countdown. A rejected start (zero length, or a countdown that
    /// already completed) leaves the state untouched and broadcasts nothing
    pub fn start(&self, request: StartRequest) -> AppResult<(StartOutcome, Snapshot)> {
        let (outcome, snapshot, now) = self.transition(|countdown, now| countdown.start(request, now))?;

        match outcome {
            StartOutcome::Started => {
                self.record_action("start", &now);
                info!(
                    "Countdown started in {:?} mode with {} remaining",
                    snapshot.mode, snapshot.remaining
                );
                self.publish(&snapshot, Some(CountdownEvent::Started { mode: snapshot.mode }));
            }
            StartOutcome::Rejected => {
                warn!("Ignoring start request in {:?} state: {:?}", snapshot.run_state, request);
            }
        }

        Ok((outcome, snapshot))
    }

    /// Flip between running and paused
    pub fn toggle_pause(&self) -> AppResult<Snapshot> {
        let (outcome, snapshot, now) = self.transition(|countdown, now| countdown.toggle_pause(now))?;
        self.record_action("toggle-pause", &now);

        match outcome {
            PauseOutcome::Paused => {
                info!("Countdown paused at {}", snapshot.remaining);
                self.publish(&snapshot, Some(CountdownEvent::Paused));
            }
            PauseOutcome::Resumed => {
                info!("Countdown resumed at {}", snapshot.remaining);
                self.publish(&snapshot, Some(CountdownEvent::Resumed));
            }
            PauseOutcome::Ignored => {
                debug!("Pause toggle ignored in {:?} state", snapshot.run_state);
            }
        }

        Ok(snapshot)
    }

    /// Return to idle, whatever the current state
    pub fn reset(&self) -> AppResult<Snapshot> {
        let ((), snapshot, now) = self.transition(|countdown, _| countdown.reset())?;
        self.record_action("reset", &now);
        info!("Countdown reset");
        self.publish(&snapshot, Some(CountdownEvent::Reset));
        Ok(snapshot)
    }

    /// Recompute remaining time; called by the ticker once per period
    pub fn tick(&self) -> AppResult<Snapshot> {
        let now = self.clock.now();
        let mut countdown = self.countdown()?;
        let outcome = countdown.tick(&now);
        let snapshot = countdown.snapshot();
        drop(countdown);

        match outcome {
            TickOutcome::Counted => {
                debug!("Tick: {} remaining", snapshot.remaining);
                self.publish(&snapshot, None);
            }
            TickOutcome::Completed => {
                info!("Countdown completed");
                self.publish(&snapshot, Some(CountdownEvent::Completed));
            }
            TickOutcome::Skipped => {}
        }

        Ok(snapshot)
    }

    /// Get the current countdown snapshot
    pub fn snapshot(&self) -> AppResult<Snapshot> {
        Ok(self.countdown()?.snapshot())
    }

    pub fn run_state(&self) -> AppResult<RunState> {
        Ok(self.countdown()?.run_state())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CountdownEvent> {
        self.event_tx.subscribe()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Get current preferences
    pub fn preferences(&self) -> AppResult<Preferences> {
        self.preferences
            .lock()
            .map(|preferences| preferences.clone())
            .map_err(|_| AppError::StateLock("preferences"))
    }

    /// Merge an update into the preferences and persist them if a file is configured
    pub fn update_preferences(&self, update: PreferencesUpdate) -> AppResult<Preferences> {
        let mut preferences = self
            .preferences
            .lock()
            .map_err(|_| AppError::StateLock("preferences"))?;

        let mut updated = preferences.clone();
        updated.apply(update);
        if let Some(path) = &self.preferences_path {
            updated.save(path)?;
        }
        *preferences = updated.clone();
        info!("Preferences updated: {:?}", updated);

        Ok(updated)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
