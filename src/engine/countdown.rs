//! Countdown state machine
//!
//! A single owner of mode, target, run state and the derived remaining time.
//! Every transition takes the current instant explicitly, so the machine
//! itself never reads a clock.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::time::{resolve_end_time, seconds_until, Meridiem, RemainingTime};

/// Which computation path produces the remaining time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Duration,
    EndTime,
}

/// Lifecycle phase of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Completed => "completed",
        }
    }
}

/// What the countdown is counting towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTarget {
    /// Seconds left, decremented once per tick
    Seconds(u64),
    /// Absolute instant, fixed for the whole run
    Until(DateTime<Utc>),
}

/// Parameters committed by the user when starting a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StartRequest {
    Duration {
        #[serde(default)]
        hours: u32,
        #[serde(default)]
        minutes: u32,
        #[serde(default)]
        seconds: u32,
    },
    EndTime {
        hour: u32,
        #[serde(default)]
        minute: u32,
        #[serde(default)]
        second: u32,
        meridiem: Meridiem,
    },
}

impl StartRequest {
    pub fn duration(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self::Duration { hours, minutes, seconds }
    }

    pub fn end_time(hour: u32, minute: u32, second: u32, meridiem: Meridiem) -> Self {
        Self::EndTime {
            hour,
            minute,
            second,
            meridiem,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Duration { .. } => Mode::Duration,
            Self::EndTime { .. } => Mode::EndTime,
        }
    }

    /// True for a Duration request of zero length, the one start the
    /// countdown refuses.
    pub fn is_zero_duration(&self) -> bool {
        matches!(
            self,
            Self::Duration {
                hours: 0,
                minutes: 0,
                seconds: 0
            }
        )
    }
}

/// Result of [`Countdown::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    Rejected,
}

/// Result of [`Countdown::toggle_pause`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Paused,
    Resumed,
    Ignored,
}

/// Result of [`Countdown::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running, nothing changed
    Skipped,
    Counted,
    /// This tick moved the countdown into Completed
    Completed,
}

/// Everything a display needs to render the countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub run_state: RunState,
    pub completed: bool,
    #[serde(flatten)]
    pub remaining: RemainingTime,
    pub remaining_seconds: u64,
    pub initial_seconds: u64,
    /// Fraction of the initial span still left, 0.0 when nothing was started
    pub progress: f64,
    pub target: Option<DateTime<Utc>>,
}

/// The countdown engine
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    mode: Mode,
    run_state: RunState,
    target: Option<CountdownTarget>,
    remaining: RemainingTime,
    initial_seconds: u64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_completed(&self) -> bool {
        self.run_state == RunState::Completed
    }

    pub fn target(&self) -> Option<CountdownTarget> {
        self.target
    }

    pub fn remaining(&self) -> RemainingTime {
        self.remaining
    }

    /// Commit start parameters and begin running.
    ///
    /// A zero-length Duration request leaves the countdown untouched, and so
    /// does any start once Completed: only `reset` leaves that state.
    pub fn start<Tz: TimeZone>(&mut self, request: StartRequest, now: &DateTime<Tz>) -> StartOutcome {
        if self.run_state == RunState::Completed {
            debug!("Rejected start on a completed countdown");
            return StartOutcome::Rejected;
        }

        let (target, remaining_seconds) = match request {
            StartRequest::Duration { hours, minutes, seconds } => {
                let total = RemainingTime {
                    hours: hours.into(),
                    minutes: minutes.into(),
                    seconds: seconds.into(),
                }
                .total_seconds();
                if total == 0 {
                    debug!("Rejected zero-length duration start");
                    return StartOutcome::Rejected;
                }
                (CountdownTarget::Seconds(total), total)
            }
            StartRequest::EndTime {
                hour,
                minute,
                second,
                meridiem,
            } => {
                let Some(end) = meridiem
                    .to_24_hour(hour)
                    .and_then(|hour| NaiveTime::from_hms_opt(hour, minute, second))
                    .and_then(|time| resolve_end_time(now, time))
                else {
                    debug!("Rejected unresolvable end time {}:{:02}:{:02} {:?}", hour, minute, second, meridiem);
                    return StartOutcome::Rejected;
                };
                let remaining = seconds_until(end, now).unwrap_or(0);
                (CountdownTarget::Until(end), remaining)
            }
        };

        self.mode = request.mode();
        self.target = Some(target);
        self.initial_seconds = remaining_seconds;
        self.remaining = RemainingTime::from_total_seconds(remaining_seconds);
        self.run_state = RunState::Running;
        StartOutcome::Started
    }

    /// Advance the countdown by one period
    pub fn tick<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> TickOutcome {
        if self.run_state != RunState::Running {
            return TickOutcome::Skipped;
        }

        match self.target {
            Some(CountdownTarget::Seconds(left)) => {
                let left = left.saturating_sub(1);
                self.target = Some(CountdownTarget::Seconds(left));
                self.remaining = RemainingTime::from_total_seconds(left);
                if left == 0 {
                    return self.complete();
                }
            }
            Some(CountdownTarget::Until(end)) => match seconds_until(end, now) {
                Some(left) => self.remaining = RemainingTime::from_total_seconds(left),
                None => return self.complete(),
            },
            // Running always carries a target
            None => return self.complete(),
        }

        TickOutcome::Counted
    }

    /// Flip between Running and Paused; ignored in any other state
    pub fn toggle_pause<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> PauseOutcome {
        match self.run_state {
            RunState::Running => {
                self.run_state = RunState::Paused;
                PauseOutcome::Paused
            }
            RunState::Paused => {
                if let Some(CountdownTarget::Until(end)) = self.target {
                    self.remaining = RemainingTime::from_total_seconds(seconds_until(end, now).unwrap_or(0));
                }
                self.run_state = RunState::Running;
                PauseOutcome::Resumed
            }
            RunState::Idle | RunState::Completed => PauseOutcome::Ignored,
        }
    }

    /// Back to Idle, whatever the current state
    pub fn reset(&mut self) {
        self.run_state = RunState::Idle;
        self.target = None;
        self.remaining = RemainingTime::ZERO;
        self.initial_seconds = 0;
    }

    pub fn snapshot(&self) -> Snapshot {
        let remaining_seconds = self.remaining.total_seconds();
        let progress = if self.initial_seconds > 0 {
            remaining_seconds as f64 / self.initial_seconds as f64
        } else {
            0.0
        };

        Snapshot {
            mode: self.mode,
            run_state: self.run_state,
            completed: self.is_completed(),
            remaining: self.remaining,
            remaining_seconds,
            initial_seconds: self.initial_seconds,
            progress,
            target: match self.target {
                Some(CountdownTarget::Until(end)) => Some(end),
                _ => None,
            },
        }
    }

    fn complete(&mut self) -> TickOutcome {
        self.remaining = RemainingTime::ZERO;
        self.run_state = RunState::Completed;
        TickOutcome::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn started(request: StartRequest, now: &DateTime<Utc>) -> Countdown {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.start(request, now), StartOutcome::Started);
        countdown
    }

    #[test]
    fn starts_idle() {
        let countdown = Countdown::new();
        let snapshot = countdown.snapshot();
        assert_eq!(snapshot.run_state, RunState::Idle);
        assert!(!snapshot.completed);
        assert_eq!(snapshot.remaining, RemainingTime::ZERO);
        assert_eq!(snapshot.progress, 0.0);
        assert!(countdown.target().is_none());
    }

    #[test]
    fn zero_duration_start_stays_idle() {
        let mut countdown = Countdown::new();
        let outcome = countdown.start(StartRequest::duration(0, 0, 0), &noon());
        assert_eq!(outcome, StartOutcome::Rejected);
        assert_eq!(countdown.run_state(), RunState::Idle);
        assert!(countdown.target().is_none());
    }

    #[test]
    fn duration_start_publishes_initial_time() {
        let countdown = started(StartRequest::duration(1, 2, 3), &noon());
        assert_eq!(countdown.run_state(), RunState::Running);
        assert_eq!(countdown.remaining(), RemainingTime { hours: 1, minutes: 2, seconds: 3 });
        assert_eq!(countdown.target(), Some(CountdownTarget::Seconds(3723)));

        let snapshot = countdown.snapshot();
        assert_eq!(snapshot.mode, Mode::Duration);
        assert_eq!(snapshot.initial_seconds, 3723);
        assert_eq!(snapshot.progress, 1.0);
        assert!(snapshot.target.is_none());
    }

    #[test]
    fn five_second_duration_completes_after_five_ticks() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 5), &now);

        for expected in (1..=4).rev() {
            assert_eq!(countdown.tick(&now), TickOutcome::Counted);
            assert_eq!(countdown.remaining().seconds, expected);
        }
        assert_eq!(countdown.tick(&now), TickOutcome::Completed);
        assert_eq!(countdown.run_state(), RunState::Completed);
        assert_eq!(countdown.remaining(), RemainingTime::ZERO);

        assert_eq!(countdown.tick(&now), TickOutcome::Skipped);
        assert_eq!(countdown.tick(&now), TickOutcome::Skipped);
        assert_eq!(countdown.remaining(), RemainingTime::ZERO);
        assert!(countdown.snapshot().completed);
    }

    #[test]
    fn duration_tick_rolls_units() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(1, 0, 0), &now);
        countdown.tick(&now);
        assert_eq!(countdown.remaining(), RemainingTime { hours: 0, minutes: 59, seconds: 59 });
    }

    #[test]
    fn toggle_pause_while_idle_is_ignored() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.toggle_pause(&noon()), PauseOutcome::Ignored);
        assert_eq!(countdown.run_state(), RunState::Idle);
    }

    #[test]
    fn toggle_pause_after_completion_is_ignored() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 1), &now);
        assert_eq!(countdown.tick(&now), TickOutcome::Completed);
        assert_eq!(countdown.toggle_pause(&now), PauseOutcome::Ignored);
        assert_eq!(countdown.run_state(), RunState::Completed);
    }

    #[test]
    fn paused_countdown_keeps_its_counter() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 10), &now);
        countdown.tick(&now);

        assert_eq!(countdown.toggle_pause(&now), PauseOutcome::Paused);
        assert_eq!(countdown.tick(&now), TickOutcome::Skipped);
        assert_eq!(countdown.target(), Some(CountdownTarget::Seconds(9)));

        assert_eq!(countdown.toggle_pause(&now), PauseOutcome::Resumed);
        assert_eq!(countdown.run_state(), RunState::Running);
        countdown.tick(&now);
        assert_eq!(countdown.remaining().seconds, 8);
    }

    #[test]
    fn reset_is_idempotent() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 3, 0), &now);
        countdown.tick(&now);

        countdown.reset();
        let once = countdown.snapshot();
        countdown.reset();
        let twice = countdown.snapshot();

        assert_eq!(once, twice);
        assert_eq!(twice.run_state, RunState::Idle);
        assert_eq!(twice.remaining, RemainingTime::ZERO);
        assert!(countdown.target().is_none());
    }

    #[test]
    fn reset_leaves_completed() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 1), &now);
        countdown.tick(&now);
        assert!(countdown.is_completed());

        countdown.reset();
        assert_eq!(countdown.run_state(), RunState::Idle);
        assert!(!countdown.is_completed());
    }

    #[test]
    fn completed_countdown_ignores_start_until_reset() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 1), &now);
        assert_eq!(countdown.tick(&now), TickOutcome::Completed);
        let completed = countdown.snapshot();

        assert_eq!(countdown.start(StartRequest::duration(0, 0, 3), &now), StartOutcome::Rejected);
        assert_eq!(
            countdown.start(StartRequest::end_time(1, 0, 0, Meridiem::Pm), &now),
            StartOutcome::Rejected
        );
        assert_eq!(countdown.run_state(), RunState::Completed);
        assert_eq!(countdown.snapshot(), completed);

        countdown.reset();
        assert_eq!(countdown.start(StartRequest::duration(0, 0, 3), &now), StartOutcome::Started);
        assert_eq!(countdown.run_state(), RunState::Running);
        assert!(!countdown.snapshot().completed);
        assert_eq!(countdown.remaining().seconds, 3);
    }

    #[test]
    fn restart_while_running_replaces_the_target() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 30), &now);
        countdown.tick(&now);

        assert_eq!(countdown.start(StartRequest::duration(0, 0, 5), &now), StartOutcome::Started);
        assert_eq!(countdown.target(), Some(CountdownTarget::Seconds(5)));
        assert_eq!(countdown.snapshot().initial_seconds, 5);
    }

    #[test]
    fn overflowing_end_hour_is_rejected() {
        let mut countdown = Countdown::new();
        let outcome = countdown.start(StartRequest::end_time(u32::MAX, 0, 0, Meridiem::Pm), &noon());
        assert_eq!(outcome, StartOutcome::Rejected);
        assert_eq!(countdown.run_state(), RunState::Idle);
    }

    #[test]
    fn end_time_later_today() {
        let now = noon();
        let countdown = started(StartRequest::end_time(2, 30, 0, Meridiem::Pm), &now);

        assert_eq!(countdown.mode(), Mode::EndTime);
        assert_eq!(countdown.remaining(), RemainingTime { hours: 2, minutes: 30, seconds: 0 });
        assert_eq!(
            countdown.target(),
            Some(CountdownTarget::Until(now + Duration::minutes(150)))
        );
        assert_eq!(countdown.snapshot().target, Some(now + Duration::minutes(150)));
    }

    #[test]
    fn end_time_in_the_past_rolls_forward_a_day() {
        let now = noon();
        let countdown = started(StartRequest::end_time(9, 0, 0, Meridiem::Am), &now);
        assert_eq!(countdown.remaining(), RemainingTime { hours: 21, minutes: 0, seconds: 0 });
    }

    #[test]
    fn end_time_equal_to_now_rolls_forward_a_day() {
        let now = noon();
        let countdown = started(StartRequest::end_time(12, 0, 0, Meridiem::Pm), &now);
        let Some(CountdownTarget::Until(end)) = countdown.target() else {
            panic!("expected an absolute target");
        };
        assert!(end > now);
        assert_eq!(end, now + Duration::days(1));
        assert_eq!(countdown.remaining().hours, 24);
    }

    #[test]
    fn twelve_am_means_midnight() {
        let now = noon();
        let countdown = started(StartRequest::end_time(12, 0, 0, Meridiem::Am), &now);
        assert_eq!(countdown.remaining(), RemainingTime { hours: 12, minutes: 0, seconds: 0 });
    }

    #[test]
    fn end_time_completes_two_seconds_out() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 14, 59, 58).unwrap();
        let mut countdown = started(StartRequest::end_time(3, 0, 0, Meridiem::Pm), &now);
        assert_eq!(countdown.remaining().seconds, 2);

        assert_eq!(countdown.tick(&(now + Duration::seconds(1))), TickOutcome::Counted);
        assert_eq!(countdown.remaining().seconds, 1);

        assert_eq!(countdown.tick(&(now + Duration::seconds(2))), TickOutcome::Completed);
        assert_eq!(countdown.remaining(), RemainingTime::ZERO);
        assert_eq!(countdown.run_state(), RunState::Completed);
    }

    #[test]
    fn late_end_time_tick_never_goes_negative() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 14, 59, 58).unwrap();
        let mut countdown = started(StartRequest::end_time(3, 0, 0, Meridiem::Pm), &now);

        assert_eq!(countdown.tick(&(now + Duration::seconds(45))), TickOutcome::Completed);
        let snapshot = countdown.snapshot();
        assert_eq!(snapshot.remaining, RemainingTime::ZERO);
        assert_eq!(snapshot.remaining_seconds, 0);
        assert!(snapshot.completed);
    }

    #[test]
    fn end_time_recovers_from_missed_ticks() {
        let now = noon();
        let mut countdown = started(StartRequest::end_time(1, 0, 0, Meridiem::Pm), &now);

        countdown.tick(&(now + Duration::seconds(600)));
        assert_eq!(countdown.remaining(), RemainingTime { hours: 0, minutes: 50, seconds: 0 });
    }

    #[test]
    fn paused_end_time_keeps_target_and_counts_wall_time() {
        let now = noon();
        let mut countdown = started(StartRequest::end_time(1, 0, 0, Meridiem::Pm), &now);
        let target = countdown.target();

        countdown.toggle_pause(&now);
        let later = now + Duration::minutes(20);
        assert_eq!(countdown.tick(&later), TickOutcome::Skipped);
        assert_eq!(countdown.target(), target);

        assert_eq!(countdown.toggle_pause(&later), PauseOutcome::Resumed);
        assert_eq!(countdown.target(), target);
        assert_eq!(countdown.remaining(), RemainingTime { hours: 0, minutes: 40, seconds: 0 });
    }

    #[test]
    fn progress_tracks_remaining_fraction() {
        let now = noon();
        let mut countdown = started(StartRequest::duration(0, 0, 4), &now);
        countdown.tick(&now);
        assert_eq!(countdown.snapshot().progress, 0.75);
    }

    #[test]
    fn deserializes_start_requests() {
        let duration: StartRequest =
            serde_json::from_str(r#"{"mode":"duration","minutes":5}"#).unwrap();
        assert_eq!(duration, StartRequest::duration(0, 5, 0));

        let end_time: StartRequest =
            serde_json::from_str(r#"{"mode":"end_time","hour":9,"minute":15,"meridiem":"AM"}"#).unwrap();
        assert_eq!(end_time, StartRequest::end_time(9, 15, 0, Meridiem::Am));
        assert_eq!(end_time.mode(), Mode::EndTime);
    }
}
