//! Application configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local development.

use crate::geometry::grid::DEFAULT_CELL_SIZE_DEGREES;
use crate::geometry::primitives::DEFAULT_CELL_PRECISION;
use crate::services::districts::{DEFAULT_FETCH_RADIUS_METERS, DEFAULT_REFETCH_THRESHOLD_METERS};
use crate::services::overpass::DEFAULT_OVERPASS_URL;
use crate::services::tracker::{TrackerConfig, DEFAULT_MAX_SPEED_MPS, DEFAULT_MIN_STEP_METERS};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Snapshot file
    pub data_path: PathBuf,
    /// Overpass interpreter endpoint
    pub overpass_url: String,
    /// GPS filter thresholds
    pub tracker: TrackerConfig,
    /// Relocation distance that triggers a district re-fetch
    pub refetch_threshold_meters: f64,
    /// Half-size of the fetched district box
    pub fetch_radius_meters: f64,
    /// SpatialGrid bucket size for the revealed trail
    pub grid_cell_degrees: f64,
    /// Decimal places for explored-cell counting
    pub cell_key_precision: u32,
    /// Fetch districts automatically when a fix lands far from the loaded area
    pub auto_fetch_districts: bool,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/fogwalk.json"),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            tracker: TrackerConfig::default(),
            refetch_threshold_meters: DEFAULT_REFETCH_THRESHOLD_METERS,
            fetch_radius_meters: DEFAULT_FETCH_RADIUS_METERS,
            grid_cell_degrees: DEFAULT_CELL_SIZE_DEGREES,
            cell_key_precision: DEFAULT_CELL_PRECISION,
            auto_fetch_districts: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            data_path: env::var("FOGWALK_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/fogwalk.json")),
            overpass_url: env::var("OVERPASS_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_OVERPASS_URL.to_string()),
            tracker: TrackerConfig {
                max_speed_mps: parse_positive("MAX_SPEED_MPS", DEFAULT_MAX_SPEED_MPS)?,
                min_step_meters: parse_or("MIN_STEP_METERS", DEFAULT_MIN_STEP_METERS)?,
                max_accuracy_meters: parse_optional("MAX_ACCURACY_METERS")?,
            },
            refetch_threshold_meters: parse_positive(
                "REFETCH_THRESHOLD_METERS",
                DEFAULT_REFETCH_THRESHOLD_METERS,
            )?,
            fetch_radius_meters: parse_positive("FETCH_RADIUS_METERS", DEFAULT_FETCH_RADIUS_METERS)?,
            grid_cell_degrees: parse_positive("GRID_CELL_DEGREES", DEFAULT_CELL_SIZE_DEGREES)?,
            cell_key_precision: parse_or("CELL_KEY_PRECISION", DEFAULT_CELL_PRECISION)?,
            auto_fetch_districts: parse_or("AUTO_FETCH_DISTRICTS", true)?,
        })
    }
}

fn parse_optional<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(None),
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_optional(name)?.unwrap_or(default))
}

fn parse_positive(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let value = parse_or(name, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
