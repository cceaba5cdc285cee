// SpectrumFrame - per-tick input handed to the detector
//
// Two channels, each with a magnitude spectrum (frequency domain) and a
// waveform (time domain), all of the same fixed length N.

use crate::error::DetectorError;

/// One tick of precomputed spectrum and waveform data for two channels
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    left_spectrum: Vec<f32>,
    right_spectrum: Vec<f32>,
    left_waveform: Vec<f32>,
    right_waveform: Vec<f32>,
}

impl SpectrumFrame {
    /// Create a zeroed frame of `num_samples` values per array
    pub fn new(num_samples: usize) -> Self {
        Self {
            left_spectrum: vec![0.0; num_samples],
            right_spectrum: vec![0.0; num_samples],
            left_waveform: vec![0.0; num_samples],
            right_waveform: vec![0.0; num_samples],
        }
    }

    /// Build a frame from owned channel data; all four arrays must match in length
    pub fn from_channels(
        left_spectrum: Vec<f32>,
        right_spectrum: Vec<f32>,
        left_waveform: Vec<f32>,
        right_waveform: Vec<f32>,
    ) -> Result<Self, DetectorError> {
        let expected = left_spectrum.len();
        for actual in [
            right_spectrum.len(),
            left_waveform.len(),
            right_waveform.len(),
        ] {
            if actual != expected {
                return Err(DetectorError::FrameSizeMismatch { expected, actual });
            }
        }

        Ok(Self {
            left_spectrum,
            right_spectrum,
            left_waveform,
            right_waveform,
        })
    }

    /// Number of values per array (N)
    pub fn len(&self) -> usize {
        self.left_spectrum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_spectrum.is_empty()
    }

    pub fn left_spectrum(&self) -> &[f32] {
        &self.left_spectrum
    }

    pub fn right_spectrum(&self) -> &[f32] {
        &self.right_spectrum
    }

    pub fn left_waveform(&self) -> &[f32] {
        &self.left_waveform
    }

    pub fn right_waveform(&self) -> &[f32] {
        &self.right_waveform
    }

    /// Mutable access to both spectra, for frame sources filling in place
    pub fn spectra_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.left_spectrum, &mut self.right_spectrum)
    }

    /// Mutable access to both waveforms, for frame sources filling in place
    pub fn waveforms_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.left_waveform, &mut self.right_waveform)
    }

    /// Zero every array
    pub fn clear(&mut self) {
        self.left_spectrum.fill(0.0);
        self.right_spectrum.fill(0.0);
        self.left_waveform.fill(0.0);
        self.right_waveform.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_silent() {
        let frame = SpectrumFrame::new(256);
        assert_eq!(frame.len(), 256);
        assert!(frame.left_spectrum().iter().all(|&v| v == 0.0));
        assert!(frame.right_waveform().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_channels_rejects_mismatched_lengths() {
        let result = SpectrumFrame::from_channels(
            vec![0.0; 256],
            vec![0.0; 256],
            vec![0.0; 128],
            vec![0.0; 256],
        );
        assert_eq!(
            result,
            Err(DetectorError::FrameSizeMismatch {
                expected: 256,
                actual: 128
            })
        );
    }

    #[test]
    fn test_mutable_views_write_through() {
        let mut frame = SpectrumFrame::new(4);
        {
            let (left, right) = frame.spectra_mut();
            left[1] = 0.5;
            right[2] = 0.25;
        }
        {
            let (left, _) = frame.waveforms_mut();
            left[0] = -1.0;
        }
        assert_eq!(frame.left_spectrum()[1], 0.5);
        assert_eq!(frame.right_spectrum()[2], 0.25);
        assert_eq!(frame.left_waveform()[0], -1.0);

        frame.clear();
        assert_eq!(frame.left_waveform()[0], 0.0);
    }
}
