//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the sun-clock.toml file.
//! It provides a centralized way to configure the observer location, clock format,
//! and terminal output.

use crate::{
    controller::{is_valid_date_format, DEFAULT_DATE_FORMAT},
    GeoLocation,
};
use chrono::{FixedOffset, Local, Offset};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file, looked up in the working directory
pub const CONFIG_FILE: &str = "sun-clock.toml";

/// Errors from reading, writing or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("latitude and longitude must both be set and in range (got {latitude:?}, {longitude:?})")]
    InvalidLocation {
        latitude: Option<f64>,
        longitude: Option<f64>,
    },

    #[error("invalid date format: {0:?}")]
    InvalidDateFormat(String),

    #[error("utc offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),
}

/// Application configuration loaded from sun-clock.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Observer position for the sun indicator
    pub location: LocationConfig,
    /// Time and date formatting
    pub clock: ClockConfig,
    /// Terminal output
    pub display: DisplayConfig,
}

/// Observer position; leave both fields out for "location unknown"
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Clock face formatting
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Show 0-23 hours without an AM/PM label
    pub use_24_hour: bool,
    /// chrono strftime pattern for the date line
    pub date_format: String,
    /// Fixed offset east of UTC in minutes; absent means the host's local zone
    pub utc_offset_minutes: Option<i32>,
}

/// Terminal display configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Columns used by the ASCII sun track
    pub sun_track_width: usize,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            latitude: Some(37.37),
            longitude: Some(-122.0),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            use_24_hour: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc_offset_minutes: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            sun_track_width: 40,
        }
    }
}

impl Config {
    /// Load configuration from sun-clock.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.as_ref().display());
                config
            }
            Err(ConfigError::Io(_)) => {
                info!("No config file found, using default configuration");
                Self::default()
            }
            Err(e) => {
                warn!("Invalid config file: {}", e);
                warn!("Using default configuration");
                Self::default()
            }
        }
    }

    /// Load and validate configuration, reporting any problem to the caller
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save current configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geo_location()?;

        if !is_valid_date_format(&self.clock.date_format) {
            return Err(ConfigError::InvalidDateFormat(self.clock.date_format.clone()));
        }

        if let Some(minutes) = self.clock.utc_offset_minutes {
            if FixedOffset::east_opt(minutes.saturating_mul(60)).is_none() {
                return Err(ConfigError::InvalidUtcOffset(minutes));
            }
        }
        Ok(())
    }

    /// The configured observer position, `None` when both coordinates are absent
    pub fn geo_location(&self) -> Result<Option<GeoLocation>, ConfigError> {
        let LocationConfig {
            latitude,
            longitude,
        } = self.location;
        match (latitude, longitude) {
            (None, None) => Ok(None),
            (Some(lat), Some(lon)) => GeoLocation::new(lat, lon)
                .map(Some)
                .map_err(|_| ConfigError::InvalidLocation {
                    latitude,
                    longitude,
                }),
            _ => Err(ConfigError::InvalidLocation {
                latitude,
                longitude,
            }),
        }
    }

    /// The configured offset, or the host's current local offset
    pub fn utc_offset(&self) -> FixedOffset {
        self.clock
            .utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes.saturating_mul(60)))
            .unwrap_or_else(local_offset)
    }
}

/// The host's UTC offset right now
pub fn local_offset() -> FixedOffset {
    Local::now().offset().fix()
}
