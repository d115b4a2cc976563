//! # Per-Second Update Scheduling
//!
//! Keeps the visible seconds digit locked to wall-clock seconds. Each wake is
//! computed from the current time rather than by adding a fixed 1000 ms to the
//! previous wake, so timer latency never accumulates into drift.
//!
//! ## State Machine
//!
//! | From      | Event                 | To        | Effect                               |
//! |-----------|-----------------------|-----------|--------------------------------------|
//! | `Stopped` | resume                | `Running` | update now, wake at next second      |
//! | `Running` | wake, display active  | `Running` | update, wake at next second          |
//! | `Running` | wake, display dimmed  | `Running` | update, no further wake              |
//! | any       | pause / teardown      | `Stopped` | pending wake cancelled               |
//!
//! External ticks and time-zone changes update the face without touching this
//! state. The scheduler only does integer arithmetic and cannot fail.

use crate::DisplayState;
use log::debug;

const MILLIS_PER_SECOND: i64 = 1000;

/// Milliseconds until the next wall-clock second boundary, in `1..=1000`.
///
/// # Example
/// ```
/// use sun_clock_lib::scheduler::next_delay_millis;
///
/// assert_eq!(next_delay_millis(1_700_000_000_250), 750);
/// assert_eq!(next_delay_millis(1_700_000_000_000), 1000);
/// ```
pub fn next_delay_millis(now_millis: i64) -> i64 {
    MILLIS_PER_SECOND - now_millis.rem_euclid(MILLIS_PER_SECOND)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
}

/// Bookkeeping for the self-rescheduling tick loop.
///
/// The scheduler does not own a timer; it tells its caller how long to wait
/// and the caller arms whatever timer its event loop provides.
#[derive(Debug, Clone, Default)]
pub struct UpdateScheduler {
    state: SchedulerState,
    next_wake_millis: Option<i64>,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Absolute time of the pending wake, if one is armed.
    pub fn next_wake_millis(&self) -> Option<i64> {
        self.next_wake_millis
    }

    /// Enter `Running` and arm the first wake. Returns the delay to wait.
    pub fn resume(&mut self, now_millis: i64) -> i64 {
        self.state = SchedulerState::Running;
        self.arm(now_millis)
    }

    /// Handle a fired wake. Returns the next delay, or `None` when the loop
    /// should stop self-rescheduling (dimmed) or was already stopped.
    pub fn on_wake(&mut self, now_millis: i64, display: DisplayState) -> Option<i64> {
        self.next_wake_millis = None;
        if !self.is_running() {
            debug!("ignoring wake while stopped");
            return None;
        }
        match display {
            DisplayState::Active => Some(self.arm(now_millis)),
            DisplayState::Dimmed => {
                debug!("display dimmed, per-second loop parked");
                None
            }
        }
    }

    /// Re-arm a parked loop, e.g. after the display leaves the dimmed state.
    ///
    /// Does nothing when stopped or when a wake is already pending.
    pub fn rearm(&mut self, now_millis: i64) -> Option<i64> {
        if !self.is_running() || self.next_wake_millis.is_some() {
            return None;
        }
        Some(self.arm(now_millis))
    }

    /// Enter `Stopped` and drop any pending wake.
    pub fn pause(&mut self) {
        self.state = SchedulerState::Stopped;
        self.next_wake_millis = None;
    }

    fn arm(&mut self, now_millis: i64) -> i64 {
        let delay = next_delay_millis(now_millis);
        self.next_wake_millis = Some(now_millis.saturating_add(delay));
        debug!("next wake in {delay} ms");
        delay
    }
}
