//! Source abstractions the detection engine is driven by.
//!
//! The host owns the audio pipeline; the engine only sees a [`FrameSource`]
//! that hands over one precomputed spectrum/waveform frame per tick and a
//! [`TimeSource`] that stamps the tick.

use std::time::Instant;

use crate::analysis::frame::SpectrumFrame;
use crate::error::DetectorError;

mod stub;
mod wav;

pub use stub::StubTimeSource;
pub use wav::{blackman_harris_window, read_wav, WavData, WavFrameSource};

/// Trait implemented by host adapters that feed frames to the detector.
///
/// `sample_rate` is queried once at startup. Each tick the engine asks
/// `is_active`; an inactive source gets `skip_tick` instead of `fill_frame`
/// and the detector state is left untouched for that tick.
pub trait FrameSource {
    fn sample_rate(&self) -> u32;

    fn is_active(&self) -> bool;

    /// Write the current tick's spectra and waveforms into `frame`.
    fn fill_frame(&mut self, frame: &mut SpectrumFrame) -> Result<(), DetectorError>;

    /// Called instead of `fill_frame` on ticks where the source is inactive.
    fn skip_tick(&mut self) {}
}

/// Trait representing the host clock, in seconds.
pub trait TimeSource {
    fn now(&self) -> f64;
}

/// Default time source: seconds elapsed since construction.
pub struct SystemTimeSource {
    start: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
