//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::{
    engine::{Snapshot, StartOutcome, StartRequest},
    error::{AppError, AppResult},
    state::{AppState, CountdownEvent, Preferences, PreferencesUpdate},
};
use super::responses::{ApiResponse, HealthResponse, StatusResponse};

/// Reject requests the countdown would silently ignore or misread
fn validate_start(request: &StartRequest) -> AppResult<()> {
    fn check(field: &'static str, value: u32, min: u32, max: u32) -> AppResult<()> {
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(AppError::OutOfRange { field, value, min, max })
        }
    }

    match *request {
        StartRequest::Duration { hours, minutes, seconds } => {
            check("hours", hours, 0, 99)?;
            check("minutes", minutes, 0, 59)?;
            check("seconds", seconds, 0, 59)?;
            if request.is_zero_duration() {
                return Err(AppError::ZeroDuration);
            }
        }
        StartRequest::EndTime { hour, minute, second, .. } => {
            check("hour", hour, 1, 12)?;
            check("minute", minute, 0, 59)?;
            check("second", second, 0, 59)?;
        }
    }

    Ok(())
}

/// Handle POST /countdown/start - Start a countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> AppResult<Json<ApiResponse>> {
    validate_start(&request)?;
    let (outcome, countdown) = state.start(request)?;
    if outcome == StartOutcome::Rejected {
        return Err(AppError::StartRejected(countdown.run_state.as_str()));
    }
    info!("Start endpoint called - {} remaining", countdown.remaining);
    Ok(Json(ApiResponse::new("Countdown started", countdown)))
}

/// Handle POST /countdown/pause - Toggle between running and paused
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse>> {
    let countdown = state.toggle_pause()?;
    let message = format!("Countdown is {}", countdown.run_state.as_str());
    Ok(Json(ApiResponse::new(message, countdown)))
}

/// Handle POST /countdown/reset - Return the countdown to idle
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<ApiResponse>> {
    let countdown = state.reset()?;
    Ok(Json(ApiResponse::new("Countdown reset", countdown)))
}

/// Handle GET /countdown - Return the current snapshot
pub async fn countdown_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Snapshot>> {
    Ok(Json(state.snapshot()?))
}

fn snapshot_event(snapshot: &Snapshot) -> Event {
    Event::default()
        .event("snapshot")
        .json_data(snapshot)
        .unwrap_or_else(|e| {
            warn!("Failed to encode snapshot event: {}", e);
            Event::default().event("error").data(e.to_string())
        })
}

/// Handle GET /countdown/events - Stream snapshots and the completion signal
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut snapshots = state.subscribe_snapshots();
    let events = state.subscribe_events();
    let current = snapshot_event(&snapshots.borrow_and_update());

    let updates = stream::unfold((snapshots, events), |(mut snapshots, mut events)| async move {
        loop {
            // Snapshots first, so the final 00:00:00 precedes `completed`
            tokio::select! {
                biased;

                changed = snapshots.changed() => {
                    if changed.is_err() {
                        return None;
                    }
                    let event = snapshot_event(&snapshots.borrow_and_update());
                    return Some((event, (snapshots, events)));
                }
                received = events.recv() => match received {
                    Ok(CountdownEvent::Completed) => {
                        let event = Event::default().event("completed").data("Time's up!");
                        return Some((event, (snapshots, events)));
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event stream lagged behind by {} events", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    });

    let stream = stream::once(async move { current })
        .chain(updates)
        .map(Ok::<_, Infallible>);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /preferences - Return display preferences
pub async fn preferences_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<Preferences>> {
    Ok(Json(state.preferences()?))
}

/// Handle PUT /preferences - Merge a partial preferences update
pub async fn update_preferences_handler(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PreferencesUpdate>,
) -> AppResult<Json<Preferences>> {
    Ok(Json(state.update_preferences(update)?))
}

/// Handle GET /status - Return current countdown and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> AppResult<Json<StatusResponse>> {
    let countdown = state.snapshot()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        display: countdown.remaining.to_string(),
        countdown,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
