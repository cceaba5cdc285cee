// Error types for the beat detection core
//
// This module defines the detector error type with stable numeric codes,
// mirroring the structured error reporting used across the crate.

mod detector;

pub use detector::{log_detector_error, DetectorError, DetectorErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent logging and CLI output.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
