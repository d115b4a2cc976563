//! Low-precision sunrise equation for the sun indicator.
//!
//! Simplified NOAA / Wikipedia "sunrise equation" model.
//! Accuracy: a minute or two for rise/set at mid latitudes, which is far below
//! what an 8-pixel sun dot can show.
//!
//! All angles are degrees unless the name ends in `_rad`. Longitude is flipped
//! to west-positive internally, as the equation is usually written.

use chrono::{DateTime, Utc};
use log::debug;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Julian date of the J2000.0 epoch plus the 0.0009 day transit offset.
const J2000_TRANSIT: f64 = 2_451_545.000_9;
const J2000: f64 = 2_451_545.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;
/// Obliquity of the ecliptic.
const EARTH_TILT_DEG: f64 = 23.45;
/// Refraction plus solar disk radius below the geometric horizon.
const SUN_SIZE_DEG: f64 = 0.83;
/// Fraction reported when the sun never sets.
pub const POLAR_DAY_FRACTION: f64 = 0.5;

/// Where the sun is relative to today's sunrise/sunset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarPosition {
    /// Between sunrise (0.0) and sunset (1.0).
    Day { fraction: f64 },
    /// Before sunrise or after sunset.
    Night,
    /// Sun stays above the horizon all day.
    PolarDay,
    /// Sun stays below the horizon all day.
    PolarNight,
}

/// Flattened estimate consumed by the controller.
///
/// `day_fraction` is only meaningful when `valid` is true.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarState {
    pub day_fraction: f64,
    pub valid: bool,
}

impl SolarState {
    pub const NIGHT: SolarState = SolarState {
        day_fraction: 0.0,
        valid: false,
    };
}

impl From<SolarPosition> for SolarState {
    fn from(position: SolarPosition) -> Self {
        match position {
            SolarPosition::Day { fraction } => SolarState {
                day_fraction: fraction,
                valid: true,
            },
            SolarPosition::PolarDay => SolarState {
                day_fraction: POLAR_DAY_FRACTION,
                valid: true,
            },
            SolarPosition::Night | SolarPosition::PolarNight => SolarState::NIGHT,
        }
    }
}

/// Sunrise and sunset for the solar day containing the given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Intermediate values shared by every result of the sunrise equation.
#[derive(Debug, Clone, Copy)]
struct SolarDay {
    julian_date: f64,
    julian_cycle: f64,
    /// West-positive longitude.
    west_longitude: f64,
    /// Equation-of-time correction in days.
    set_diff: f64,
    solar_noon: f64,
    declination_rad: f64,
}

enum HourAngle {
    AlwaysUp,
    AlwaysDown,
    Rise { julian_rise: f64, julian_set: f64 },
}

/// Estimate the sun's place in today's daylight.
///
/// Pure and deterministic. Coordinates must already be in range
/// (latitude [-90, 90], longitude [-180, 180]); out-of-range input gives an
/// unspecified result.
pub fn estimate(now_millis: i64, latitude: f64, longitude: f64) -> SolarState {
    solar_position(now_millis, latitude, longitude).into()
}

/// Same computation as [`estimate`], keeping polar outcomes distinguishable.
pub fn solar_position(now_millis: i64, latitude: f64, longitude: f64) -> SolarPosition {
    let day = solar_day(now_millis, longitude);
    match hour_angle(&day, hour_angle_cos(latitude, day.declination_rad)) {
        HourAngle::AlwaysUp => SolarPosition::PolarDay,
        HourAngle::AlwaysDown => SolarPosition::PolarNight,
        HourAngle::Rise {
            julian_rise,
            julian_set,
        } => {
            if day.julian_date >= julian_rise && day.julian_date <= julian_set {
                SolarPosition::Day {
                    fraction: (day.julian_date - julian_rise) / (julian_set - julian_rise),
                }
            } else {
                SolarPosition::Night
            }
        }
    }
}

/// Sunrise and sunset of the current Julian cycle, or `None` on polar day/night.
pub fn sun_times(now_millis: i64, latitude: f64, longitude: f64) -> Option<SunTimes> {
    let day = solar_day(now_millis, longitude);
    match hour_angle(&day, hour_angle_cos(latitude, day.declination_rad)) {
        HourAngle::Rise {
            julian_rise,
            julian_set,
        } => Some(SunTimes {
            sunrise: julian_to_datetime(julian_rise),
            sunset: julian_to_datetime(julian_set),
        }),
        HourAngle::AlwaysUp | HourAngle::AlwaysDown => None,
    }
}

/// Convert a Julian date to UTC, rounded to the millisecond.
///
/// Dates chrono cannot represent collapse to the Unix epoch.
pub fn julian_to_datetime(julian_date: f64) -> DateTime<Utc> {
    let millis = ((julian_date - UNIX_EPOCH_JD) * MILLIS_PER_DAY).round() as i64;
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

fn solar_day(now_millis: i64, longitude: f64) -> SolarDay {
    // ---------- 1. Unix millis → Julian date ---------------------------------
    let julian_date = now_millis as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JD;
    let west_longitude = -longitude;

    // ---------- 2. Julian cycle and approximate solar noon -------------------
    let julian_cycle = (julian_date - J2000_TRANSIT - west_longitude / 360.0 + 0.5).floor();
    let noon_approx = J2000_TRANSIT + west_longitude / 360.0 + julian_cycle;

    // ---------- 3. Mean anomaly and equation of center -----------------------
    let mean_anomaly = (357.529_11 + 0.985_600_28 * (noon_approx - J2000)) % 360.0;
    let mean_anomaly_sin = mean_anomaly.to_radians().sin();
    let center = 1.9148 * mean_anomaly_sin
        + 0.0200 * (2.0 * mean_anomaly).to_radians().sin()
        + 0.0003 * (3.0 * mean_anomaly).to_radians().sin();

    // ---------- 4. Ecliptic longitude and corrected noon ---------------------
    let ecliptic_lon_rad = ((mean_anomaly + 102.9372 + center + 180.0) % 360.0).to_radians();
    let set_diff = 0.0053 * mean_anomaly_sin - 0.0069 * (2.0 * ecliptic_lon_rad).sin();
    let solar_noon = noon_approx + set_diff;

    // ---------- 5. Declination -----------------------------------------------
    let declination_rad = (ecliptic_lon_rad.sin() * EARTH_TILT_DEG.to_radians().sin()).asin();

    SolarDay {
        julian_date,
        julian_cycle,
        west_longitude,
        set_diff,
        solar_noon,
        declination_rad,
    }
}

fn hour_angle_cos(latitude: f64, declination_rad: f64) -> f64 {
    let latitude_rad = latitude.to_radians();
    ((-SUN_SIZE_DEG).to_radians().sin() - latitude_rad.sin() * declination_rad.sin())
        / (latitude_rad.cos() * declination_rad.cos())
}

fn hour_angle(day: &SolarDay, hour_angle_cos: f64) -> HourAngle {
    // Exactly -1 is a full 24h arc; exactly +1 (or NaN) is a zero-length day.
    if hour_angle_cos <= -1.0 {
        return HourAngle::AlwaysUp;
    }
    if hour_angle_cos >= 1.0 || hour_angle_cos.is_nan() {
        return HourAngle::AlwaysDown;
    }

    // Half of the sun's arc above the horizon
    let hour_angle_deg = hour_angle_cos.acos().to_degrees();
    let noon_at_set = J2000_TRANSIT + (hour_angle_deg + day.west_longitude) / 360.0 + day.julian_cycle;
    let julian_set = noon_at_set + day.set_diff;
    let julian_rise = day.solar_noon - (julian_set - day.solar_noon);

    debug!(
        "sun rises {} and sets {}",
        julian_to_datetime(julian_rise),
        julian_to_datetime(julian_set)
    );

    HourAngle::Rise {
        julian_rise,
        julian_set,
    }
}
