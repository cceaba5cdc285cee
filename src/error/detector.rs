// Detector error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Detector error code constants
///
/// Single source of truth for the numeric codes reported by
/// [`DetectorError::code`] and printed by [`log_detector_error`].
///
/// Error code range: 3001-3007
pub struct DetectorErrorCodes {}

impl DetectorErrorCodes {
    /// No frame source was bound when the detector started
    pub const SOURCE_MISSING: i32 = 3001;

    /// Sample count is not a power of two in 256..=4096
    pub const INVALID_SAMPLE_COUNT: i32 = 3002;

    /// Sample rate reported by the frame source is zero
    pub const INVALID_SAMPLE_RATE: i32 = 3003;

    /// Minimum frequency is not inside (0, nyquist)
    pub const INVALID_MIN_FREQUENCY: i32 = 3004;

    /// A numeric tuning parameter is out of range
    pub const INVALID_PARAMETER: i32 = 3005;

    /// A frame handed to the detector has the wrong length
    pub const FRAME_SIZE_MISMATCH: i32 = 3006;

    /// A frame source could not be opened or decoded
    pub const SOURCE_UNAVAILABLE: i32 = 3007;
}

/// Log a detector error with structured context
///
/// Prints the numeric code, the component and the human-readable message on
/// one line so the single startup diagnostic is easy to grep for.
pub fn log_detector_error(err: &DetectorError, context: &str) {
    error!(
        "[BeatDetection] Detector error in {}: code={}, component=BeatDetection, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Detector-related errors
///
/// All of these are setup-time failures. The per-tick path never surfaces
/// them to the host loop; a failed startup disables the detector instead.
///
/// Error code range: 3001-3007
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorError {
    /// No frame source bound at startup
    SourceMissing,

    /// `num_samples` must be a power of two between 256 and 4096
    InvalidSampleCount { num_samples: usize },

    /// Sample rate must be positive
    InvalidSampleRate { sample_rate: u32 },

    /// Minimum frequency must be positive and below nyquist
    InvalidMinFrequency { min_frequency_hz: f32, nyquist: f32 },

    /// Any other out-of-range option
    InvalidParameter { name: String, value: String },

    /// Frame arrays do not have the configured length
    FrameSizeMismatch { expected: usize, actual: usize },

    /// Frame source could not be opened or decoded
    SourceUnavailable { reason: String },
}

impl DetectorError {
    pub(crate) fn invalid_parameter(name: &str, value: impl fmt::Display) -> Self {
        DetectorError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl ErrorCode for DetectorError {
    fn code(&self) -> i32 {
        match self {
            DetectorError::SourceMissing => DetectorErrorCodes::SOURCE_MISSING,
            DetectorError::InvalidSampleCount { .. } => DetectorErrorCodes::INVALID_SAMPLE_COUNT,
            DetectorError::InvalidSampleRate { .. } => DetectorErrorCodes::INVALID_SAMPLE_RATE,
            DetectorError::InvalidMinFrequency { .. } => DetectorErrorCodes::INVALID_MIN_FREQUENCY,
            DetectorError::InvalidParameter { .. } => DetectorErrorCodes::INVALID_PARAMETER,
            DetectorError::FrameSizeMismatch { .. } => DetectorErrorCodes::FRAME_SIZE_MISMATCH,
            DetectorError::SourceUnavailable { .. } => DetectorErrorCodes::SOURCE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            DetectorError::SourceMissing => {
                "No frame source bound. Attach an audio source before starting.".to_string()
            }
            DetectorError::InvalidSampleCount { num_samples } => {
                format!(
                    "num_samples must be a power of two between 256 and 4096 (got {})",
                    num_samples
                )
            }
            DetectorError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            DetectorError::InvalidMinFrequency {
                min_frequency_hz,
                nyquist,
            } => {
                format!(
                    "min_frequency_hz must be in (0, {}) (got {})",
                    nyquist, min_frequency_hz
                )
            }
            DetectorError::InvalidParameter { name, value } => {
                format!("Invalid value for {}: {}", name, value)
            }
            DetectorError::FrameSizeMismatch { expected, actual } => {
                format!("Frame length mismatch: expected {}, got {}", expected, actual)
            }
            DetectorError::SourceUnavailable { reason } => {
                format!("Frame source unavailable: {}", reason)
            }
        }
    }
}

impl fmt::Display for DetectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DetectorError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DetectorError {}

/// Convert from hound::Error to DetectorError
impl From<hound::Error> for DetectorError {
    fn from(err: hound::Error) -> Self {
        DetectorError::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}
