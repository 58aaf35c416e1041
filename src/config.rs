//! Capture configuration for the sbig-cam binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gain::GainTable;
use crate::traits::{Binning, Window};

/// Configuration for a single capture run.
///
/// Loaded from TOML; every field has a default so a partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Exposure time in milliseconds.
    pub exposure_ms: f64,
    /// Whether to open the mechanical shutter (false for dark frames).
    pub open_shutter: bool,
    /// Binning factor for the exposure.
    pub binning: Binning,
    /// Readout window; the camera's current window is kept when unset.
    pub window: Option<Window>,
    /// Gain table stamped into captured images.
    pub gain: GainTable,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            exposure_ms: 100.0,
            open_shutter: true,
            binning: Binning::UNBINNED,
            window: None,
            gain: GainTable::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Exposure time is not a positive finite number.
    #[error("invalid exposure time: {0} ms")]
    InvalidExposure(f64),
    /// A binning factor is zero.
    #[error("invalid binning: {0}")]
    InvalidBinning(Binning),
    /// The configured window is empty.
    #[error("invalid window: zero width or height")]
    InvalidWindow,
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    /// The config file could not be parsed.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CaptureConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exposure_ms.is_finite() || self.exposure_ms <= 0.0 {
            return Err(ConfigError::InvalidExposure(self.exposure_ms));
        }
        if self.binning.x == 0 || self.binning.y == 0 {
            return Err(ConfigError::InvalidBinning(self.binning));
        }
        if let Some(window) = self.window {
            if window.width == 0 || window.height == 0 {
                return Err(ConfigError::InvalidWindow);
            }
        }
        Ok(())
    }

    /// Exposure time as a [`Duration`].
    #[must_use]
    pub fn exposure(&self) -> Duration {
        Duration::from_secs_f64(self.exposure_ms / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.exposure(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_partial_file() {
        let config: CaptureConfig = toml::from_str(
            r#"
            exposure_ms = 2500.0
            binning = { x = 2, y = 2 }

            [gain]
            unbinned = 1.4
            binned = 2.3
            "#,
        )
        .expect("parse failed");

        assert_eq!(config.exposure_ms, 2500.0);
        assert_eq!(config.binning, Binning::new(2, 2));
        assert!(config.open_shutter, "defaults must fill missing fields");
    }

    #[test]
    fn test_non_positive_exposure_rejected() {
        let config = CaptureConfig {
            exposure_ms: 0.0,
            ..CaptureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidExposure(_))
        ));
    }

    #[test]
    fn test_zero_binning_rejected() {
        let config = CaptureConfig {
            binning: Binning::new(0, 2),
            ..CaptureConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBinning(_))
        ));
    }
}
