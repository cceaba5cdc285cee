// FrequencyBandDetector - per-band onset detection on the magnitude spectrum
//
// Each band keeps its own history and last-beat timestamp. Per tick and band:
//   current   = louder channel's average magnitude over the band
//   threshold = band multiplier * mean(band history)
//   detected  = separation elapsed && current > threshold && current > base threshold
// then current and max(current - threshold, 0) are pushed into the band's
// histories, whether or not the band fired.

use std::ops::RangeInclusive;

use crate::analysis::bands::FrequencyBandMapper;
use crate::analysis::frame::SpectrumFrame;
use crate::analysis::history::HistoryBuffer;
use crate::config::FrequencyDetectionConfig;

/// Bank of per-band adaptive detectors
#[derive(Debug, Clone)]
pub struct FrequencyBandDetector {
    mapper: FrequencyBandMapper,
    histories: Vec<HistoryBuffer>,
    diffs: Vec<HistoryBuffer>,
    last_beat_time: Vec<f64>,
    thresholds: Vec<f32>,
    current: Vec<f32>,
    detected: Vec<bool>,
    /// Band values of the frame being processed
    scratch: Vec<f32>,
    min_separation: f64,
}

impl FrequencyBandDetector {
    pub fn new(
        mapper: FrequencyBandMapper,
        config: &FrequencyDetectionConfig,
        min_beat_separation_sec: f64,
    ) -> Self {
        let total = mapper.total_bands();
        Self {
            mapper,
            histories: vec![HistoryBuffer::new(config.history_length); total],
            diffs: vec![HistoryBuffer::new(config.history_length); total],
            last_beat_time: vec![-min_beat_separation_sec; total],
            thresholds: vec![0.0; total],
            current: vec![0.0; total],
            detected: vec![false; total],
            scratch: vec![0.0; total],
            min_separation: min_beat_separation_sec,
        }
    }

    /// Run one tick on the frame's spectra; returns the per-band flags
    pub fn detect(&mut self, frame: &SpectrumFrame, now: f64) -> &[bool] {
        let mut values = std::mem::take(&mut self.scratch);
        self.mapper
            .band_values(frame.left_spectrum(), frame.right_spectrum(), &mut values);
        self.process_band_values(&values, now);
        self.scratch = values;
        &self.detected
    }

    /// Run one tick on precomputed band values (`values[i]` for band `i`)
    ///
    /// Missing trailing values are treated as 0.0.
    pub fn process_band_values(&mut self, values: &[f32], now: f64) -> &[bool] {
        for index in 0..self.mapper.total_bands() {
            let current = values.get(index).copied().unwrap_or(0.0);
            let Some(band) = self.mapper.band(index) else {
                continue;
            };

            let avg = self.histories[index].mean();
            let threshold = band.multiplier * avg;

            let detected = now - self.last_beat_time[index] >= self.min_separation
                && current > threshold
                && current > band.base_threshold;

            self.histories[index].push(current);
            self.diffs[index].push((current - threshold).max(0.0));
            self.thresholds[index] = threshold;
            self.current[index] = current;
            self.detected[index] = detected;

            if detected {
                self.last_beat_time[index] = now;
            }
        }
        &self.detected
    }

    pub fn mapper(&self) -> &FrequencyBandMapper {
        &self.mapper
    }

    pub fn total_bands(&self) -> usize {
        self.mapper.total_bands()
    }

    /// Flags from the most recent tick
    pub fn detected(&self) -> &[bool] {
        &self.detected
    }

    /// Band values of the most recent tick
    pub fn current_values(&self) -> &[f32] {
        &self.current
    }

    /// Thresholds used by the most recent tick
    pub fn thresholds(&self) -> &[f32] {
        &self.thresholds
    }

    pub fn history(&self, index: usize) -> Option<&HistoryBuffer> {
        self.histories.get(index)
    }

    pub fn diff_history(&self, index: usize) -> Option<&HistoryBuffer> {
        self.diffs.get(index)
    }

    /// Mean of the current band values over `range`, ignoring indices past the last band
    pub fn range_intensity(&self, range: RangeInclusive<usize>) -> f32 {
        let values: Vec<f32> = range
            .take_while(|&index| index < self.current.len())
            .map(|index| self.current[index])
            .collect();
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f32>() / values.len() as f32
        }
    }
}
