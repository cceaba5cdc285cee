//! Configuration management for the beat detector
//!
//! This module provides startup configuration loaded from JSON files, so
//! thresholds and history lengths can be tuned without recompilation.
//! Every value is immutable for the lifetime of a detector run; use
//! [`DetectorConfig::validate`] once the sample rate is known.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::DetectorError;

/// Smallest accepted frame length.
pub const MIN_NUM_SAMPLES: usize = 256;
/// Largest accepted frame length.
pub const MAX_NUM_SAMPLES: usize = 4096;

/// Which detection branches run each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Wideband energy only
    Energy,
    /// Kick/Snare/Hi-Hat from the frequency bands only
    Frequency,
    /// Both branches
    #[default]
    Both,
}

impl DetectionMode {
    pub fn runs_energy(self) -> bool {
        matches!(self, DetectionMode::Energy | DetectionMode::Both)
    }

    pub fn runs_frequency(self) -> bool {
        matches!(self, DetectionMode::Frequency | DetectionMode::Both)
    }
}

/// Complete detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub mode: DetectionMode,
    /// Frame length `N` (power of two, 256-4096)
    pub num_samples: usize,
    /// Lowest frequency covered by the octave layout
    pub min_frequency_hz: f32,
    /// Minimum time between two accepted detections of the same detector
    pub min_beat_separation_sec: f64,
    pub energy: EnergyDetectionConfig,
    pub frequency: FrequencyDetectionConfig,
    /// Emit informational logs (startup summary, one line per event)
    pub debug_logs: bool,
    /// Identifier stamped on every emitted event
    pub source_id: String,
}

/// Wideband energy detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyDetectionConfig {
    /// Number of past energy readings averaged for the threshold
    pub history_length: usize,
    /// Threshold multiplier; smaller values are more sensitive
    pub sensitivity: f32,
}

impl Default for EnergyDetectionConfig {
    fn default() -> Self {
        Self {
            history_length: 43,
            sensitivity: 1.5,
        }
    }
}

/// Per-band frequency detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyDetectionConfig {
    /// Number of past band readings averaged for each band threshold
    pub history_length: usize,
    /// Bands per octave
    pub octave_divisions: usize,
    /// Threshold multiplier for the low (kick) bands
    pub kick_multiplier: f32,
    /// Threshold multiplier for the mid (snare) bands
    pub snare_multiplier: f32,
    /// Threshold multiplier for the high (hi-hat) bands
    pub hat_multiplier: f32,
}

impl Default for FrequencyDetectionConfig {
    fn default() -> Self {
        Self {
            history_length: 43,
            octave_divisions: 3,
            kick_multiplier: 2.0,
            snare_multiplier: 3.0,
            hat_multiplier: 4.0,
        }
    }
}

impl Default for DetectorConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            mode: DetectionMode::Both,
            num_samples: 1024,
            min_frequency_hz: 60.0,
            min_beat_separation_sec: 0.05,
            energy: EnergyDetectionConfig::default(),
            frequency: FrequencyDetectionConfig::default(),
            debug_logs: true,
            source_id: "beat-detection".to_string(),
        }
    }
}

impl DetectorConfig {
    /// Check every startup constraint against the source sample rate
    pub fn validate(&self, sample_rate: u32) -> Result<(), DetectorError> {
        validate_num_samples(self.num_samples)?;

        if sample_rate == 0 {
            return Err(DetectorError::InvalidSampleRate { sample_rate });
        }

        let nyquist = sample_rate as f32 / 2.0;
        if !(self.min_frequency_hz > 0.0 && self.min_frequency_hz < nyquist) {
            return Err(DetectorError::InvalidMinFrequency {
                min_frequency_hz: self.min_frequency_hz,
                nyquist,
            });
        }

        if !(self.min_beat_separation_sec >= 0.0 && self.min_beat_separation_sec.is_finite()) {
            return Err(DetectorError::invalid_parameter(
                "min_beat_separation_sec",
                self.min_beat_separation_sec,
            ));
        }

        if self.energy.history_length == 0 {
            return Err(DetectorError::invalid_parameter("energy.history_length", 0));
        }
        check_positive("energy.sensitivity", self.energy.sensitivity)?;

        if self.frequency.history_length == 0 {
            return Err(DetectorError::invalid_parameter(
                "frequency.history_length",
                0,
            ));
        }
        if self.frequency.octave_divisions == 0 {
            return Err(DetectorError::invalid_parameter(
                "frequency.octave_divisions",
                0,
            ));
        }
        check_positive("frequency.kick_multiplier", self.frequency.kick_multiplier)?;
        check_positive("frequency.snare_multiplier", self.frequency.snare_multiplier)?;
        check_positive("frequency.hat_multiplier", self.frequency.hat_multiplier)?;

        Ok(())
    }

    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or the defaults when the file is missing
    /// or the JSON is invalid (a warning is logged in both cases).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/beat_detection.json")
    }
}

/// Frame length must be a power of two in 256..=4096
pub fn validate_num_samples(num_samples: usize) -> Result<(), DetectorError> {
    if num_samples.is_power_of_two()
        && (MIN_NUM_SAMPLES..=MAX_NUM_SAMPLES).contains(&num_samples)
    {
        Ok(())
    } else {
        Err(DetectorError::InvalidSampleCount { num_samples })
    }
}

fn check_positive(name: &str, value: f32) -> Result<(), DetectorError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DetectorError::invalid_parameter(name, value))
    }
}
