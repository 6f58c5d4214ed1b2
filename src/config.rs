//! # Sonification Configuration
//!
//! Configuration is YAML with kebab-case keys; every key is optional.
//!
//! ```yaml
//! velocity-base: 33        # pianissimo
//! velocity-range: 94       # base + range <= 127
//! note-duration-ms: 187
//! instruments: [11, 45, 117]
//! trim-columns: 0
//! trim-rows: 0
//! pacing: realtime         # or "offline"
//! ```
//!
//! Parsing goes through [`RawConfig`] (all `Option`s) and is then validated into
//! [`SonifyConfig`], the same two-step shape used for score metadata.

use crate::error::LabError;
use crate::sound::types::{
    Pacing, DEFAULT_DURATION_MS, DEFAULT_INSTRUMENTS, VELOCITY_BASE, VELOCITY_RANGE,
};
use serde::Deserialize;
use std::path::Path;

/// Validated configuration for loading, sonifying and playing an image.
#[derive(Debug, Clone, PartialEq)]
pub struct SonifyConfig {
    pub velocity_base: u8,
    pub velocity_range: u8,
    pub note_duration_ms: u32,
    /// GM program per output channel (channel 0 = red, 1 = green, 2 = blue).
    pub instruments: Vec<u8>,
    pub trim_columns: usize,
    pub trim_rows: usize,
    pub pacing: Pacing,
}

impl Default for SonifyConfig {
    fn default() -> Self {
        Self {
            velocity_base: VELOCITY_BASE,
            velocity_range: VELOCITY_RANGE,
            note_duration_ms: DEFAULT_DURATION_MS,
            instruments: DEFAULT_INSTRUMENTS.to_vec(),
            trim_columns: 0,
            trim_rows: 0,
            pacing: Pacing::RealTime,
        }
    }
}

/// Raw configuration for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub velocity_base: Option<u8>,
    pub velocity_range: Option<u8>,
    pub note_duration_ms: Option<u32>,
    pub instruments: Option<Vec<u8>>,
    pub trim_columns: Option<usize>,
    pub trim_rows: Option<usize>,
    pub pacing: Option<String>, // "realtime" or "offline"
}

impl SonifyConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(content: &str) -> Result<Self, LabError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| LabError::Config(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, LabError> {
        let defaults = Self::default();

        let velocity_base = raw.velocity_base.unwrap_or(defaults.velocity_base);
        let velocity_range = raw.velocity_range.unwrap_or(defaults.velocity_range);
        if velocity_base as u16 + velocity_range as u16 > 127 {
            return Err(LabError::Config(format!(
                "velocity-base + velocity-range must not exceed 127 (got {} + {})",
                velocity_base, velocity_range
            )));
        }

        let instruments = raw.instruments.unwrap_or(defaults.instruments);
        if instruments.is_empty() {
            return Err(LabError::Config("instruments must not be empty".to_string()));
        }
        if let Some(bad) = instruments.iter().find(|&&p| p > 127) {
            return Err(LabError::Config(format!(
                "instrument program {} is outside 0-127",
                bad
            )));
        }

        let pacing = match raw.pacing.as_deref().map(str::trim) {
            None => defaults.pacing,
            Some("realtime") | Some("real-time") => Pacing::RealTime,
            Some("offline") => Pacing::Offline,
            Some(other) => {
                return Err(LabError::Config(format!(
                    "Invalid pacing: {} (expected realtime or offline)",
                    other
                )))
            }
        };

        Ok(Self {
            velocity_base,
            velocity_range,
            note_duration_ms: raw.note_duration_ms.unwrap_or(defaults.note_duration_ms),
            instruments,
            trim_columns: raw.trim_columns.unwrap_or(0),
            trim_rows: raw.trim_rows.unwrap_or(0),
            pacing,
        })
    }
}

/// Load configuration from a YAML file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<SonifyConfig, LabError> {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return Ok(SonifyConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| LabError::Config(format!("{}: {}", path.display(), e)))?;
    let config = SonifyConfig::from_yaml(&contents)?;
    log::info!(
        "load_config: {} instrument(s), {} ms notes, pacing {:?}",
        config.instruments.len(),
        config.note_duration_ms,
        config.pacing
    );
    Ok(config)
}
