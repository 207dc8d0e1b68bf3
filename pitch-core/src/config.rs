//! # Analysis Configuration Module
//!
//! The configuration is a plain value passed to every analysis call; nothing
//! here is global. It can be written as JSON, with missing fields falling
//! back to their defaults:
//!
//! ```json
//! { "band": { "low_hz": 80.0, "high_hz": 1200.0 }, "min_distance_bins": 4 }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::peaks::PeakCriteria;
use crate::spectrum::FrequencyBand;
use crate::tuning::A4_FREQUENCY;
use crate::window::WindowType;

/// Reference frame length: ~93 ms at 44.1 kHz, 10.77 Hz per bin.
pub const DEFAULT_FRAME_SIZE: usize = 4096;

/// Reference capture rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Tunable parameters of the per-frame analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window: WindowType,
    /// Band searched for the fundamental.
    pub band: FrequencyBand,
    pub min_height_frac: f64,
    pub min_prominence_frac: f64,
    pub min_distance_bins: usize,
    /// Frequency of A4 used for note mapping.
    pub reference_hz: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let criteria = PeakCriteria::default();
        Self {
            window: WindowType::Hann,
            band: FrequencyBand::new(50.0, 2000.0),
            min_height_frac: criteria.min_height_frac,
            min_prominence_frac: criteria.min_prominence_frac,
            min_distance_bins: criteria.min_distance_bins,
            reference_hz: A4_FREQUENCY,
        }
    }
}

impl AnalysisConfig {
    /// Checks every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        let FrequencyBand { low_hz, high_hz } = self.band;
        if !(low_hz.is_finite() && high_hz.is_finite()) || low_hz < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "band edges must be finite and non-negative, got [{low_hz}, {high_hz}]"
            )));
        }
        if low_hz >= high_hz {
            return Err(AnalysisError::InvalidConfig(format!(
                "band low edge {low_hz} Hz must be below high edge {high_hz} Hz"
            )));
        }
        check_fraction("min_height_frac", self.min_height_frac)?;
        check_fraction("min_prominence_frac", self.min_prominence_frac)?;
        if !(self.reference_hz.is_finite() && self.reference_hz > 0.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "reference_hz must be positive, got {}",
                self.reference_hz
            )));
        }
        Ok(())
    }

    /// The peak-search thresholds carried by this configuration.
    pub fn peak_criteria(&self) -> PeakCriteria {
        PeakCriteria {
            min_height_frac: self.min_height_frac,
            min_prominence_frac: self.min_prominence_frac,
            min_distance_bins: self.min_distance_bins,
        }
    }

    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| AnalysisError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_json(&json)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded analysis config");
        Ok(config)
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
