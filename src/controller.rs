//! # Face Controller
//!
//! Owns every piece of mutable face state and turns events into
//! [`ClockSnapshot`]s. Hosts call into it from a single execution context; it
//! never reads the system clock itself.

use crate::{
    scheduler::UpdateScheduler,
    solar::{self, SolarState},
    ClockSnapshot, DisplayState, FaceError, GeoLocation,
};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use log::{debug, warn};

/// Minimum real time between two solar estimates.
pub const SOLAR_STALENESS_MILLIS: i64 = 60_000;

/// Default date pattern: full weekday, month name, day and year.
pub const DEFAULT_DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Whether chrono can format dates with this strftime pattern.
pub fn is_valid_date_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// A snapshot plus the scheduling decision that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceUpdate {
    pub snapshot: ClockSnapshot,
    /// Milliseconds until the next self-scheduled wake, if any.
    pub next_wake_in: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
struct SolarCache {
    computed_at_millis: i64,
    state: SolarState,
}

#[derive(Debug, Clone)]
pub struct FaceController {
    location: Option<GeoLocation>,
    solar: Option<SolarCache>,
    display: DisplayState,
    offset: FixedOffset,
    date_format: String,
    scheduler: UpdateScheduler,
}

impl FaceController {
    /// Create a controller for a face shown at the given UTC offset.
    ///
    /// `date_format` is a chrono strftime pattern. A pattern chrono cannot
    /// format is replaced by [`DEFAULT_DATE_FORMAT`].
    pub fn new(
        location: Option<GeoLocation>,
        offset: FixedOffset,
        date_format: impl Into<String>,
    ) -> Self {
        let mut date_format = date_format.into();
        if !is_valid_date_format(&date_format) {
            warn!("invalid date format {date_format:?}, using {DEFAULT_DATE_FORMAT:?}");
            date_format = DEFAULT_DATE_FORMAT.to_string();
        }

        Self {
            location,
            solar: None,
            display: DisplayState::Active,
            offset,
            date_format,
            scheduler: UpdateScheduler::new(),
        }
    }

    pub fn location(&self) -> Option<GeoLocation> {
        self.location
    }

    pub fn display_state(&self) -> DisplayState {
        self.display
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// Set the observer position.
    ///
    /// The cached estimate is kept: the new position shows up on the next
    /// refresh the staleness gate allows, at most a minute later.
    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> Result<(), FaceError> {
        let location = GeoLocation::new(latitude, longitude)?;
        debug!("location set to {latitude}, {longitude}");
        self.location = Some(location);
        Ok(())
    }

    /// Forget the observer position; the sun indicator disappears.
    pub fn clear_location(&mut self) {
        debug!("location cleared");
        self.location = None;
    }

    pub fn on_dim_state_changed(&mut self, dimmed: bool) {
        self.display = DisplayState::from_dimmed(dimmed);
        debug!("display state now {:?}", self.display);
    }

    /// Re-arm the per-second loop if it was parked while dimmed.
    pub fn reschedule(&mut self, now_millis: i64) -> Option<i64> {
        if self.display.is_dimmed() {
            return None;
        }
        self.scheduler.rearm(now_millis)
    }

    /// Build the snapshot for `now_millis`.
    ///
    /// Calling twice with the same time and no state change in between gives
    /// equal snapshots and does not rerun the solar estimate.
    pub fn on_tick(&mut self, now_millis: i64, is_24_hour: bool) -> ClockSnapshot {
        let utc = DateTime::from_timestamp_millis(now_millis).unwrap_or_else(|| {
            warn!("timestamp {now_millis} out of range, showing epoch");
            DateTime::<Utc>::default()
        });
        let local = utc.with_timezone(&self.offset);

        let (hour_text, am_pm_label) = if is_24_hour {
            (local.hour().to_string(), None)
        } else {
            // hour12 already maps 0 to 12
            let (is_pm, hour) = local.hour12();
            let label = if is_pm { "PM" } else { "AM" };
            (hour.to_string(), Some(label.to_string()))
        };

        let seconds_text = match self.display {
            DisplayState::Active => Some(format!("{:02}", local.second())),
            DisplayState::Dimmed => None,
        };

        ClockSnapshot {
            hour_text,
            minute_text: format!("{:02}", local.minute()),
            am_pm_label,
            seconds_text,
            date_text: local.format(&self.date_format).to_string(),
            sun_fraction: self.sun_fraction(now_millis),
        }
    }

    /// Become visible: full updates, per-second loop running.
    pub fn resume(&mut self, now_millis: i64, is_24_hour: bool) -> FaceUpdate {
        self.display = DisplayState::Active;
        let snapshot = self.on_tick(now_millis, is_24_hour);
        let delay = self.scheduler.resume(now_millis);
        FaceUpdate {
            snapshot,
            next_wake_in: Some(delay),
        }
    }

    /// Become hidden: draw one last dimmed frame and stop the loop.
    pub fn pause(&mut self, now_millis: i64, is_24_hour: bool) -> FaceUpdate {
        self.display = DisplayState::Dimmed;
        self.scheduler.pause();
        FaceUpdate {
            snapshot: self.on_tick(now_millis, is_24_hour),
            next_wake_in: None,
        }
    }

    /// A self-scheduled wake fired.
    pub fn on_wake(&mut self, now_millis: i64, is_24_hour: bool) -> FaceUpdate {
        let snapshot = self.on_tick(now_millis, is_24_hour);
        let next_wake_in = self.scheduler.on_wake(now_millis, self.display);
        FaceUpdate {
            snapshot,
            next_wake_in,
        }
    }

    /// The host's time zone or wall clock changed. Updates immediately
    /// without touching the scheduler state.
    pub fn on_time_zone_or_clock_changed(
        &mut self,
        now_millis: i64,
        is_24_hour: bool,
        offset: Option<FixedOffset>,
    ) -> ClockSnapshot {
        if let Some(offset) = offset {
            debug!("utc offset changed to {offset}");
            self.offset = offset;
        }
        self.on_tick(now_millis, is_24_hour)
    }

    fn sun_fraction(&mut self, now_millis: i64) -> Option<f64> {
        let location = self.location?;

        let stale = match self.solar {
            Some(cache) => {
                now_millis.abs_diff(cache.computed_at_millis) > SOLAR_STALENESS_MILLIS as u64
            }
            None => true,
        };
        if stale {
            let state = solar::estimate(now_millis, location.latitude, location.longitude);
            debug!("solar estimate refreshed: {state:?}");
            self.solar = Some(SolarCache {
                computed_at_millis: now_millis,
                state,
            });
        }

        self.solar.and_then(|cache| display_fraction(cache.state))
    }

    #[cfg(test)]
    fn solar_computed_at(&self) -> Option<i64> {
        self.solar.map(|cache| cache.computed_at_millis)
    }
}

/// Indicator position for an estimate, `None` when the sun is down.
/// Fractions past the end of the day pin to midday.
fn display_fraction(state: SolarState) -> Option<f64> {
    if !state.valid {
        return None;
    }
    if state.day_fraction > 1.0 {
        return Some(solar::POLAR_DAY_FRACTION);
    }
    Some(state.day_fraction.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_millis(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, min, s)
            .unwrap()
            .timestamp_millis()
    }

    fn controller() -> FaceController {
        FaceController::new(
            Some(GeoLocation::new(37.37, -122.0).unwrap()),
            FixedOffset::east_opt(0).unwrap(),
            DEFAULT_DATE_FORMAT,
        )
    }

    #[test]
    fn test_midnight_hour_text() {
        let mut face = controller();
        let midnight = utc_millis(2024, 6, 21, 0, 7, 9);

        let twelve = face.on_tick(midnight, false);
        assert_eq!(twelve.hour_text, "12");
        assert_eq!(twelve.am_pm_label.as_deref(), Some("AM"));

        let zero = face.on_tick(midnight, true);
        assert_eq!(zero.hour_text, "0");
        assert_eq!(zero.am_pm_label, None);
    }

    #[test]
    fn test_afternoon_hour_text() {
        let mut face = controller();
        let snapshot = face.on_tick(utc_millis(2024, 6, 21, 13, 45, 0), false);
        assert_eq!(snapshot.hour_text, "1");
        assert_eq!(snapshot.am_pm_label.as_deref(), Some("PM"));
        let snapshot = face.on_tick(utc_millis(2024, 6, 21, 13, 45, 0), true);
        assert_eq!(snapshot.hour_text, "13");
    }

    #[test]
    fn test_minutes_and_seconds_are_zero_padded() {
        let mut face = controller();
        let snapshot = face.on_tick(utc_millis(2024, 6, 21, 9, 5, 3), true);
        assert_eq!(snapshot.minute_text, "05");
        assert_eq!(snapshot.seconds_text.as_deref(), Some("03"));

        let snapshot = face.on_tick(utc_millis(2024, 6, 21, 9, 45, 30), true);
        assert_eq!(snapshot.minute_text, "45");
        assert_eq!(snapshot.seconds_text.as_deref(), Some("30"));
    }

    #[test]
    fn test_dimmed_hides_seconds() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 21, 9, 5, 3);

        face.on_dim_state_changed(true);
        assert_eq!(face.on_tick(now, false).seconds_text, None);

        face.on_dim_state_changed(false);
        assert_eq!(face.on_tick(now, false).seconds_text.as_deref(), Some("03"));
    }

    #[test]
    fn test_date_text_uses_offset() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 22, 3, 0, 0);
        assert_eq!(face.on_tick(now, false).date_text, "Saturday, June 22, 2024");

        let pacific = FixedOffset::west_opt(7 * 3600).unwrap();
        let snapshot = face.on_time_zone_or_clock_changed(now, false, Some(pacific));
        assert_eq!(snapshot.date_text, "Friday, June 21, 2024");
        assert_eq!(snapshot.hour_text, "8");
        assert_eq!(snapshot.am_pm_label.as_deref(), Some("PM"));
    }

    #[test]
    fn test_solar_estimate_is_gated_by_staleness() {
        let mut face = controller();
        let midday = utc_millis(2024, 6, 21, 20, 0, 0);

        let first = face.on_tick(midday, false).sun_fraction;
        assert!(first.is_some());
        assert_eq!(face.solar_computed_at(), Some(midday));

        // Within a minute: cached, even though the sun moved
        face.on_tick(midday + 60_000, false);
        assert_eq!(face.solar_computed_at(), Some(midday));

        // Past a minute: recomputed
        let later = face.on_tick(midday + 60_001, false).sun_fraction;
        assert_eq!(face.solar_computed_at(), Some(midday + 60_001));
        assert!(later.unwrap() > first.unwrap());

        // Clock jumped backwards by more than a minute
        face.on_tick(midday - 120_000, false);
        assert_eq!(face.solar_computed_at(), Some(midday - 120_000));
    }

    #[test]
    fn test_repeated_tick_is_idempotent() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 21, 20, 0, 0);
        let first = face.on_tick(now, false);
        let second = face.on_tick(now, false);
        assert_eq!(first, second);
        assert_eq!(face.solar_computed_at(), Some(now));
    }

    #[test]
    fn test_night_and_unknown_location_hide_sun() {
        let mut face = controller();
        assert_eq!(face.on_tick(utc_millis(2024, 6, 22, 8, 0, 0), false).sun_fraction, None);

        let mut face = controller();
        face.clear_location();
        assert_eq!(face.on_tick(utc_millis(2024, 6, 21, 20, 0, 0), false).sun_fraction, None);
        assert_eq!(face.solar_computed_at(), None);
    }

    #[test]
    fn test_polar_day_shows_sun_at_midpoint() {
        let mut face = controller();
        face.set_location(80.0, 0.0).unwrap();
        let snapshot = face.on_tick(utc_millis(2024, 6, 21, 12, 0, 0), false);
        assert_eq!(snapshot.sun_fraction, Some(0.5));
    }

    #[test]
    fn test_set_location_validates_and_waits_for_staleness() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 21, 20, 0, 0);
        let before = face.on_tick(now, false).sun_fraction;

        assert!(face.set_location(120.0, 0.0).is_err());
        assert_eq!(face.location(), Some(GeoLocation::new(37.37, -122.0).unwrap()));

        face.set_location(80.0, 0.0).unwrap();
        assert_eq!(face.solar_computed_at(), Some(now));
        assert_eq!(face.on_tick(now + 1000, false).sun_fraction, before);

        // First refresh past the gate uses the new position
        assert_eq!(face.on_tick(now + 60_001, false).sun_fraction, Some(0.5));
        assert_eq!(face.solar_computed_at(), Some(now + 60_001));
    }

    #[test]
    fn test_location_stream_recomputes_at_most_once_a_minute() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 21, 20, 0, 0);

        for i in 0..5 {
            face.set_location(37.37 + i as f64 * 1e-4, -122.0).unwrap();
            face.on_tick(now + i * 1000, false);
            assert_eq!(face.solar_computed_at(), Some(now));
        }

        face.clear_location();
        assert_eq!(face.on_tick(now + 5000, false).sun_fraction, None);
        face.set_location(37.37, -122.0).unwrap();
        face.on_tick(now + 6000, false);
        assert_eq!(face.solar_computed_at(), Some(now));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let mut face = controller();
        face.on_tick(-1_000_000, false);
        let far = face.on_tick(i64::MAX, false);
        assert_eq!(face.solar_computed_at(), Some(i64::MAX));
        assert_eq!(far.date_text, "Thursday, January 1, 1970");

        face.on_tick(i64::MIN, true);
        assert_eq!(face.solar_computed_at(), Some(i64::MIN));

        let update = face.resume(i64::MAX, false);
        assert!(matches!(update.next_wake_in, Some(1..=1000)));
        assert_eq!(face.scheduler().next_wake_millis(), Some(i64::MAX));
    }

    #[test]
    fn test_invalid_date_format_falls_back() {
        let mut face = FaceController::new(None, FixedOffset::east_opt(0).unwrap(), "%Q %");
        let snapshot = face.on_tick(utc_millis(2024, 6, 21, 20, 0, 0), false);
        assert_eq!(snapshot.date_text, "Friday, June 21, 2024");

        assert!(is_valid_date_format(DEFAULT_DATE_FORMAT));
        assert!(!is_valid_date_format("%Q %"));
    }

    #[test]
    fn test_display_fraction_clamps() {
        let state = |day_fraction, valid| SolarState { day_fraction, valid };
        assert_eq!(display_fraction(state(0.25, true)), Some(0.25));
        assert_eq!(display_fraction(state(1.2, true)), Some(solar::POLAR_DAY_FRACTION));
        assert_eq!(display_fraction(state(-0.1, true)), Some(0.0));
        assert_eq!(display_fraction(state(0.25, false)), None);
        assert_eq!(display_fraction(SolarState::NIGHT), None);
    }

    #[test]
    fn test_lifecycle_drives_scheduler() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 21, 20, 0, 0) + 250;

        let resumed = face.resume(now, false);
        assert_eq!(resumed.next_wake_in, Some(750));
        assert!(resumed.snapshot.seconds_text.is_some());
        assert!(face.is_running());

        let woke = face.on_wake(now + 750, false);
        assert_eq!(woke.next_wake_in, Some(1000));

        face.on_dim_state_changed(true);
        let dimmed = face.on_wake(now + 1750, false);
        assert_eq!(dimmed.next_wake_in, None);
        assert_eq!(dimmed.snapshot.seconds_text, None);
        assert!(face.is_running());
        assert_eq!(face.reschedule(now + 1800), None, "still dimmed");

        face.on_dim_state_changed(false);
        assert_eq!(face.reschedule(now + 1800), Some(950));

        let paused = face.pause(now + 2000, false);
        assert_eq!(paused.next_wake_in, None);
        assert_eq!(paused.snapshot.seconds_text, None);
        assert!(!face.is_running());
    }

    #[test]
    fn test_external_tick_keeps_scheduler_state() {
        let mut face = controller();
        let now = utc_millis(2024, 6, 21, 20, 0, 0);

        face.on_time_zone_or_clock_changed(now, false, None);
        assert!(!face.is_running());

        face.resume(now, false);
        face.on_time_zone_or_clock_changed(now + 10, false, None);
        assert!(face.is_running());
        assert_eq!(face.scheduler().next_wake_millis(), Some(now + 1000));
    }
}
