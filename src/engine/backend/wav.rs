// WAV frame source - offline feed for the detector
//
// Splits a decoded file into consecutive windows of N frames. Each tick gets
// the raw window as its waveform and a Blackman-Harris windowed N-point FFT
// magnitude (scaled by 1/N) as its spectrum. The final partial window is
// zero-padded; after that the source reports inactive.

use std::path::Path;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::analysis::frame::SpectrumFrame;
use crate::config::validate_num_samples;
use crate::error::DetectorError;

use super::FrameSource;

/// Decoded stereo PCM
#[derive(Debug, Clone, PartialEq)]
pub struct WavData {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

/// Decode a WAV file into normalized stereo samples.
///
/// Mono files are duplicated onto both channels; files with more than two
/// channels keep the first two.
pub fn read_wav(path: &Path) -> Result<WavData, DetectorError> {
    let mut reader = hound::WavReader::open(path).map_err(|err| DetectorError::SourceUnavailable {
        reason: format!("failed to open {}: {err}", path.display()),
    })?;
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(DetectorError::SourceUnavailable {
            reason: format!("{} has zero channels", path.display()),
        });
    }

    let read_error = |err: hound::Error| DetectorError::SourceUnavailable {
        reason: format!("error reading {}: {err}", path.display()),
    };

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(read_error))
            .collect::<Result<Vec<f32>, _>>()?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .map(|sample| sample.map(|v| v as f32 / i16::MAX as f32).map_err(read_error))
                .collect::<Result<Vec<f32>, _>>()?,
            24 => reader
                .samples::<i32>()
                .map(|sample| {
                    sample
                        .map(|v| v as f32 / 8_388_607.0)
                        .map_err(read_error)
                })
                .collect::<Result<Vec<f32>, _>>()?,
            32 => reader
                .samples::<i32>()
                .map(|sample| sample.map(|v| v as f32 / i32::MAX as f32).map_err(read_error))
                .collect::<Result<Vec<f32>, _>>()?,
            bits => {
                return Err(DetectorError::SourceUnavailable {
                    reason: format!(
                        "unsupported bits_per_sample={} for {}",
                        bits,
                        path.display()
                    ),
                })
            }
        },
    };

    let channels = spec.channels as usize;
    if channels == 1 {
        return Ok(WavData {
            right: samples.clone(),
            left: samples,
            sample_rate: spec.sample_rate,
        });
    }

    let frames = samples.len() / channels;
    let mut left = Vec::with_capacity(frames);
    let mut right = Vec::with_capacity(frames);
    for chunk in samples.chunks_exact(channels) {
        left.push(chunk[0]);
        right.push(chunk[1]);
    }

    Ok(WavData {
        left,
        right,
        sample_rate: spec.sample_rate,
    })
}

/// 4-term Blackman-Harris window of `len` points
pub fn blackman_harris_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let denom = (len - 1) as f32;
    (0..len)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / denom;
            0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos() - 0.01168 * (3.0 * x).cos()
        })
        .collect()
}

/// [`FrameSource`] backed by decoded WAV samples
pub struct WavFrameSource {
    data: WavData,
    num_samples: usize,
    position: usize,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl WavFrameSource {
    /// Decode `path` and prepare windows of `num_samples` frames
    pub fn open<P: AsRef<Path>>(path: P, num_samples: usize) -> Result<Self, DetectorError> {
        let data = read_wav(path.as_ref())?;
        log::info!(
            "[WavFrameSource] Loaded {:?}: {} frames at {} Hz",
            path.as_ref(),
            data.left.len(),
            data.sample_rate
        );
        Self::from_data(data, num_samples)
    }

    /// Wrap already decoded samples
    pub fn from_data(data: WavData, num_samples: usize) -> Result<Self, DetectorError> {
        validate_num_samples(num_samples)?;
        if data.left.len() != data.right.len() {
            return Err(DetectorError::FrameSizeMismatch {
                expected: data.left.len(),
                actual: data.right.len(),
            });
        }

        let fft = FftPlanner::new().plan_fft_forward(num_samples);
        Ok(Self {
            data,
            num_samples,
            position: 0,
            window: blackman_harris_window(num_samples),
            fft,
            buffer: vec![Complex::new(0.0, 0.0); num_samples],
        })
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Total number of ticks this source yields
    pub fn total_ticks(&self) -> usize {
        self.data.left.len().div_ceil(self.num_samples)
    }

    pub fn remaining_ticks(&self) -> usize {
        self.data.left.len().saturating_sub(self.position).div_ceil(self.num_samples)
    }

    pub fn duration_sec(&self) -> f64 {
        self.data.left.len() as f64 / self.data.sample_rate.max(1) as f64
    }
}

/// Windowed magnitude spectrum of `waveform`, zero-padded to the FFT length
fn magnitude_spectrum(
    fft: &dyn Fft<f32>,
    window: &[f32],
    buffer: &mut [Complex<f32>],
    waveform: &[f32],
    spectrum: &mut [f32],
) {
    for (i, (slot, &weight)) in buffer.iter_mut().zip(window).enumerate() {
        let sample = waveform.get(i).copied().unwrap_or(0.0);
        *slot = Complex::new(sample * weight, 0.0);
    }
    fft.process(buffer);

    let scale = 1.0 / buffer.len() as f32;
    for (magnitude, bin) in spectrum.iter_mut().zip(buffer.iter()) {
        *magnitude = bin.norm() * scale;
    }
}

impl FrameSource for WavFrameSource {
    fn sample_rate(&self) -> u32 {
        self.data.sample_rate
    }

    fn is_active(&self) -> bool {
        self.position < self.data.left.len()
    }

    fn fill_frame(&mut self, frame: &mut SpectrumFrame) -> Result<(), DetectorError> {
        if frame.len() != self.num_samples {
            return Err(DetectorError::FrameSizeMismatch {
                expected: self.num_samples,
                actual: frame.len(),
            });
        }

        let start = self.position.min(self.data.left.len());
        let end = (start + self.num_samples).min(self.data.left.len());
        let filled = end - start;

        {
            let (left, right) = frame.waveforms_mut();
            left[..filled].copy_from_slice(&self.data.left[start..end]);
            right[..filled].copy_from_slice(&self.data.right[start..end]);
            left[filled..].fill(0.0);
            right[filled..].fill(0.0);
        }

        let (left_spec, right_spec) = frame.spectra_mut();
        let fft = self.fft.as_ref();
        magnitude_spectrum(
            fft,
            &self.window,
            &mut self.buffer,
            &self.data.left[start..end],
            left_spec,
        );
        magnitude_spectrum(
            fft,
            &self.window,
            &mut self.buffer,
            &self.data.right[start..end],
            right_spec,
        );

        self.position = end;
        Ok(())
    }
}
