//! Testability harness utilities.
//!
//! Deterministic frames and a scripted frame source used by the unit tests,
//! the integration tests in `tests/` and anyone embedding the detector who
//! wants to exercise it without live audio.

pub mod fixtures;

pub use fixtures::{
    band_impulse_frame, constant_energy_frame, silent_frame, white_noise_frame, ScriptStep,
    ScriptedFrameSource, DEFAULT_SEED,
};
