//! Countdown ticker background task

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::broadcast::{error::RecvError, Receiver},
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    engine::RunState,
    state::{AppState, CountdownEvent},
};

/// Background task that drives `AppState::tick` once per `period` while the
/// countdown is running.
///
/// There is exactly one ticker per state, so an interval can never outlive
/// the run that armed it.
pub async fn countdown_ticker_task(state: Arc<AppState>, period: Duration) {
    info!("Starting countdown ticker task ({}ms period)", period.as_millis());

    // Subscribe before the first state read so no transition slips between the two
    let mut events = state.subscribe_events();

    loop {
        match state.run_state() {
            Ok(RunState::Running) => {
                tick_while_running(&state, &mut events, period).await;
            }
            Ok(run_state) => {
                debug!("Ticker idle while countdown is {:?}", run_state);
                match events.recv().await {
                    Ok(event) => debug!("Ticker woke on {} event", event.name()),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Ticker lagged behind by {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("Countdown event channel closed, stopping ticker");
                        return;
                    }
                }
            }
            Err(e) => {
                error!("Failed to read countdown state: {}", e);
                // Wait a bit before retrying
                sleep(period).await;
            }
        }
    }
}

/// Tick until the countdown leaves Running
async fn tick_while_running(state: &AppState, events: &mut Receiver<CountdownEvent>, period: Duration) {
    debug!("Arming countdown interval");
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match state.tick() {
                    Ok(snapshot) if snapshot.run_state == RunState::Running => {}
                    Ok(snapshot) => {
                        debug!("Countdown left Running ({:?}), disarming interval", snapshot.run_state);
                        return;
                    }
                    Err(e) => {
                        error!("Failed to tick countdown: {}", e);
                    }
                }
            }

            received = events.recv() => {
                match received {
                    Ok(CountdownEvent::Started { .. }) => {
                        // A fresh start while running restarts the period
                        debug!("Countdown restarted, re-phasing interval");
                        interval.reset();
                    }
                    Ok(event) if event.stops_ticking() => {
                        debug!("Disarming interval on {} event", event.name());
                        return;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Ticker lagged behind by {} events, re-checking state", skipped);
                        if !matches!(state.run_state(), Ok(RunState::Running)) {
                            return;
                        }
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        }
    }
}
