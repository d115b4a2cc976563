//! # Sun Clock Core Library
//!
//! This library provides the data model and the two pieces of real engineering behind
//! the sun clock watch face: a solar-position estimator and a drift-free per-second
//! update scheduler. Everything that paints pixels or listens for system events sits
//! outside the core and talks to it through plain method calls.
//!
//! ## Design Philosophy
//!
//! ### Pure Core, Thin Edges
//! - **Stateless math**: [`solar::estimate`] and [`scheduler::next_delay_millis`] are pure
//!   functions of their inputs and never read the system clock
//! - **One owner of state**: [`controller::FaceController`] holds the location, the cached
//!   solar state, the dim flag and the scheduler; nothing is process-global
//! - **Snapshots out**: every update produces a fresh [`ClockSnapshot`] that a
//!   [`renderer::Renderer`] consumes and drops
//!
//! ### Temporal Resolution
//! - **Seconds**: while the display is [`DisplayState::Active`] the face wakes on every
//!   wall-clock second boundary, recomputed from real time so it never drifts
//! - **Minutes**: the solar estimate is refreshed at most once per 60 seconds
//! - **Dimmed**: seconds are hidden and the face only updates on external ticks
//!
//! ### Data Flow
//! 1. **Event**: timer wake, minute tick, time-zone change, resume or pause
//! 2. **Controller**: refresh solar state if stale, format hour/minute/second/date
//! 3. **Renderer**: paint the [`ClockSnapshot`] (ASCII, JSON or an embedded-graphics target)

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Module declarations
pub mod config;
pub mod controller;
pub mod renderer;
pub mod runtime;
pub mod scheduler;
pub mod solar;

/// Errors raised at the boundary of the core when callers hand in bad input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaceError {
    /// Latitude outside [-90, 90] or longitude outside [-180, 180]
    #[error("invalid location: latitude {latitude}, longitude {longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },
}

/// An observer position in decimal degrees.
///
/// North and east are positive. The estimator itself takes ranges as a
/// precondition, so construct through [`GeoLocation::new`] when the values
/// come from outside.
///
/// # Example
/// ```
/// use sun_clock_lib::GeoLocation;
///
/// let mountain_view = GeoLocation::new(37.37, -122.0).unwrap();
/// assert_eq!(mountain_view.latitude, 37.37);
///
/// assert!(GeoLocation::new(91.0, 0.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Degrees north of the equator (-90 to 90)
    pub latitude: f64,
    /// Degrees east of Greenwich (-180 to 180)
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FaceError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(FaceError::InvalidLocation {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Whether the face is fully awake or in low-power always-on mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayState {
    /// Per-second updates, seconds digits shown
    #[default]
    Active,
    /// Updates only on external ticks, seconds hidden
    Dimmed,
}

impl DisplayState {
    pub fn from_dimmed(dimmed: bool) -> Self {
        if dimmed {
            DisplayState::Dimmed
        } else {
            DisplayState::Active
        }
    }

    pub fn is_dimmed(self) -> bool {
        self == DisplayState::Dimmed
    }
}

/// Everything a renderer needs to paint one frame of the face.
///
/// Snapshots are created fresh on every update and never mutated afterwards.
///
/// - `am_pm_label` is present only for the 12-hour format
/// - `seconds_text` is present only while the display is active
/// - `sun_fraction` is `None` at night or when the location is unknown
///
/// # Example
/// ```
/// use sun_clock_lib::ClockSnapshot;
///
/// let snapshot = ClockSnapshot {
///     hour_text: "12".to_string(),
///     minute_text: "05".to_string(),
///     am_pm_label: Some("PM".to_string()),
///     seconds_text: None,
///     date_text: "Friday, June 21, 2024".to_string(),
///     sun_fraction: Some(0.5),
/// };
///
/// assert_eq!(snapshot.time_text(), "12:05");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub hour_text: String,
    pub minute_text: String,
    pub am_pm_label: Option<String>,
    pub seconds_text: Option<String>,
    pub date_text: String,
    /// 0.0 at sunrise, 1.0 at sunset
    pub sun_fraction: Option<f64>,
}

impl ClockSnapshot {
    /// Hour and minute joined the way the face shows them, e.g. "9:41".
    pub fn time_text(&self) -> String {
        format!("{}:{}", self.hour_text, self.minute_text)
    }
}
