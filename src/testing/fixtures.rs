//! Deterministic frame fixtures for tests and harnesses.
//!
//! Frames are built directly in the detector's input format so tests can
//! drive the pipeline without decoding audio or running an FFT. Random
//! content is generated from a seeded `StdRng`, so every run sees the same
//! samples.

use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::analysis::bands::FrequencyBandMapper;
use crate::analysis::energy::ENERGY_SCALE;
use crate::analysis::frame::SpectrumFrame;
use crate::engine::FrameSource;
use crate::error::DetectorError;

/// Seed used when a caller does not care about the exact noise pattern.
pub const DEFAULT_SEED: u64 = 0x5A5A_FFF0;

/// All-zero frame
pub fn silent_frame(num_samples: usize) -> SpectrumFrame {
    SpectrumFrame::new(num_samples)
}

/// Frame whose waveform has wideband energy `energy` and an empty spectrum.
///
/// Both channels hold the constant `energy / (100 * sqrt(2))`, which makes
/// `sqrt(mean(l^2 + r^2)) * 100` equal to `energy`.
pub fn constant_energy_frame(num_samples: usize, energy: f32) -> SpectrumFrame {
    let amplitude = energy / (ENERGY_SCALE * std::f32::consts::SQRT_2);
    let mut frame = SpectrumFrame::new(num_samples);
    let (left, right) = frame.waveforms_mut();
    left.fill(amplitude);
    right.fill(amplitude);
    frame
}

/// Uniform noise in `[-amplitude, amplitude)` on the waveforms and
/// `[0, amplitude)` on the spectra.
pub fn white_noise_frame(num_samples: usize, amplitude: f32, seed: u64) -> SpectrumFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut frame = SpectrumFrame::new(num_samples);
    if amplitude <= 0.0 {
        return frame;
    }

    {
        let (left, right) = frame.waveforms_mut();
        for sample in left.iter_mut().chain(right.iter_mut()) {
            *sample = rng.gen_range(-amplitude..amplitude);
        }
    }
    {
        let (left, right) = frame.spectra_mut();
        for magnitude in left.iter_mut().chain(right.iter_mut()) {
            *magnitude = rng.gen_range(0.0..amplitude);
        }
    }
    frame
}

/// Frame with `magnitude` on every spectrum bin covered by `bands`, both channels.
pub fn band_impulse_frame(
    mapper: &FrequencyBandMapper,
    num_samples: usize,
    bands: &[usize],
    magnitude: f32,
) -> SpectrumFrame {
    let mut frame = SpectrumFrame::new(num_samples);
    let (left, right) = frame.spectra_mut();
    for &band in bands {
        if let Some(bins) = mapper.band_bins(band) {
            for bin in bins {
                if bin < left.len() {
                    left[bin] = magnitude;
                    right[bin] = magnitude;
                }
            }
        }
    }
    frame
}

/// One tick of a [`ScriptedFrameSource`]
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Frame(SpectrumFrame),
    Inactive,
}

/// Frame source replaying a fixed script, then going inactive
#[derive(Debug, Clone)]
pub struct ScriptedFrameSource {
    sample_rate: u32,
    steps: VecDeque<ScriptStep>,
    frames_served: usize,
    ticks_skipped: usize,
}

impl ScriptedFrameSource {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            steps: VecDeque::new(),
            frames_served: 0,
            ticks_skipped: 0,
        }
    }

    pub fn with_frames<I>(sample_rate: u32, frames: I) -> Self
    where
        I: IntoIterator<Item = SpectrumFrame>,
    {
        let mut source = Self::new(sample_rate);
        for frame in frames {
            source.push_frame(frame);
        }
        source
    }

    pub fn push_frame(&mut self, frame: SpectrumFrame) {
        self.steps.push_back(ScriptStep::Frame(frame));
    }

    pub fn push_inactive(&mut self) {
        self.steps.push_back(ScriptStep::Inactive);
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    pub fn frames_served(&self) -> usize {
        self.frames_served
    }

    pub fn ticks_skipped(&self) -> usize {
        self.ticks_skipped
    }
}

impl FrameSource for ScriptedFrameSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_active(&self) -> bool {
        matches!(self.steps.front(), Some(ScriptStep::Frame(_)))
    }

    fn fill_frame(&mut self, frame: &mut SpectrumFrame) -> Result<(), DetectorError> {
        match self.steps.pop_front() {
            Some(ScriptStep::Frame(next)) if next.len() == frame.len() => {
                *frame = next;
                self.frames_served += 1;
                Ok(())
            }
            Some(ScriptStep::Frame(next)) => Err(DetectorError::FrameSizeMismatch {
                expected: frame.len(),
                actual: next.len(),
            }),
            Some(ScriptStep::Inactive) | None => Err(DetectorError::SourceUnavailable {
                reason: "script has no frame for this tick".to_string(),
            }),
        }
    }

    fn skip_tick(&mut self) {
        if matches!(self.steps.front(), Some(ScriptStep::Inactive)) {
            self.steps.pop_front();
        }
        self.ticks_skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::energy::frame_energy;
    use crate::config::FrequencyDetectionConfig;

    #[test]
    fn test_constant_energy_frame_hits_target() {
        for energy in [0.5, 1.0, 5.0, 10.0] {
            let frame = constant_energy_frame(1024, energy);
            let measured = frame_energy(frame.left_waveform(), frame.right_waveform());
            assert!(
                (measured - energy).abs() < 1e-3,
                "expected {} got {}",
                energy,
                measured
            );
        }
    }

    #[test]
    fn test_white_noise_is_seeded() {
        let a = white_noise_frame(256, 0.5, DEFAULT_SEED);
        let b = white_noise_frame(256, 0.5, DEFAULT_SEED);
        let c = white_noise_frame(256, 0.5, DEFAULT_SEED + 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.left_spectrum().iter().all(|&v| (0.0..0.5).contains(&v)));
        assert!(a.left_waveform().iter().all(|&v| (-0.5..0.5).contains(&v)));
    }

    #[test]
    fn test_band_impulse_frame_only_touches_band_bins() {
        let mapper =
            FrequencyBandMapper::new(44_100, 1024, 60.0, &FrequencyDetectionConfig::default());
        let frame = band_impulse_frame(&mapper, 1024, &[20], 0.3);
        let bins = mapper.band_bins(20).unwrap();
        for (bin, &value) in frame.left_spectrum().iter().enumerate() {
            if bins.contains(&bin) {
                assert_eq!(value, 0.3);
            } else {
                assert_eq!(value, 0.0);
            }
        }
        assert_eq!(frame.left_spectrum(), frame.right_spectrum());
    }

    #[test]
    fn test_scripted_source_replays_script() {
        let mut source = ScriptedFrameSource::new(44_100);
        source.push_frame(constant_energy_frame(256, 3.0));
        source.push_inactive();
        source.push_frame(silent_frame(256));

        let mut frame = SpectrumFrame::new(256);
        assert!(source.is_active());
        source.fill_frame(&mut frame).unwrap();
        assert!(frame.left_waveform()[0] > 0.0);

        assert!(!source.is_active());
        source.skip_tick();

        assert!(source.is_active());
        source.fill_frame(&mut frame).unwrap();
        assert_eq!(frame.left_waveform()[0], 0.0);

        assert!(!source.is_active());
        assert_eq!(source.frames_served(), 2);
        assert_eq!(source.ticks_skipped(), 1);
    }
}
