//! FrequencyBandMapper - octave-based band layout
//!
//! Splits `[0, nyquist)` into octaves counted down from nyquist until the
//! octave edge drops to `min_frequency_hz`, then splits each octave evenly
//! into `octave_divisions` bands. The lowest octave starts at 0 Hz.
//!
//! Band index `i = j + o * divisions` for sub-band `j` of octave `o`
//! (octave 0 is the lowest). Each band also carries its threshold policy:
//! bands below index 7 use the kick multiplier, bands below 20 the snare
//! multiplier, everything above the hi-hat multiplier. These index limits
//! assume the default three divisions per octave and are not rescaled for
//! other layouts.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::config::FrequencyDetectionConfig;

/// Bands with a lower index use the kick multiplier/threshold
pub const KICK_BAND_LIMIT: usize = 7;
/// Bands with a lower index (and at least KICK_BAND_LIMIT) use the snare policy
pub const SNARE_BAND_LIMIT: usize = 20;

/// Absolute magnitude floor for kick bands
pub const KICK_BASE_THRESHOLD: f32 = 0.003;
/// Absolute magnitude floor for snare bands
pub const SNARE_BASE_THRESHOLD: f32 = 0.001;
/// Absolute magnitude floor for hi-hat bands
pub const HAT_BASE_THRESHOLD: f32 = 0.001;

/// One frequency slice of the spectrum, immutable for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub index: usize,
    pub low_hz: f32,
    pub high_hz: f32,
    /// Adaptive threshold multiplier applied to the band history mean
    pub multiplier: f32,
    /// Magnitude the band must exceed regardless of history
    pub base_threshold: f32,
}

/// Count octaves between nyquist and `min_frequency_hz`
///
/// Halves nyquist repeatedly, starting the count at 1, until the halved value
/// is no longer above `min_frequency_hz`.
pub fn compute_octaves(sample_rate: f32, min_frequency_hz: f32) -> usize {
    let mut edge = sample_rate / 2.0;
    let mut octaves = 1;
    loop {
        edge /= 2.0;
        // edge reaches 0.0 after a bounded number of halvings
        if edge <= min_frequency_hz || edge <= 0.0 {
            break;
        }
        octaves += 1;
    }
    octaves
}

/// Threshold multiplier for a band index
pub fn band_multiplier(index: usize, config: &FrequencyDetectionConfig) -> f32 {
    if index < KICK_BAND_LIMIT {
        config.kick_multiplier
    } else if index < SNARE_BAND_LIMIT {
        config.snare_multiplier
    } else {
        config.hat_multiplier
    }
}

/// Absolute magnitude floor for a band index
pub fn band_base_threshold(index: usize) -> f32 {
    if index < KICK_BAND_LIMIT {
        KICK_BASE_THRESHOLD
    } else if index < SNARE_BAND_LIMIT {
        SNARE_BASE_THRESHOLD
    } else {
        HAT_BASE_THRESHOLD
    }
}

/// Maps the spectrum of an `N`-sample frame onto the octave band layout
#[derive(Debug, Clone)]
pub struct FrequencyBandMapper {
    sample_rate: f32,
    num_samples: usize,
    octaves: usize,
    divisions: usize,
    bands: Vec<FrequencyBand>,
}

impl FrequencyBandMapper {
    /// Derive the band layout
    ///
    /// # Arguments
    /// * `sample_rate` - Source sample rate in Hz
    /// * `num_samples` - Frame length N
    /// * `min_frequency_hz` - Lowest octave edge
    /// * `config` - Divisions per octave and per-range multipliers
    pub fn new(
        sample_rate: u32,
        num_samples: usize,
        min_frequency_hz: f32,
        config: &FrequencyDetectionConfig,
    ) -> Self {
        let sample_rate = sample_rate as f32;
        let divisions = config.octave_divisions.max(1);
        let octaves = compute_octaves(sample_rate, min_frequency_hz);

        let mut mapper = Self {
            sample_rate,
            num_samples,
            octaves,
            divisions,
            bands: Vec::with_capacity(octaves * divisions),
        };

        for octave in 0..octaves {
            for sub in 0..divisions {
                let index = sub + octave * divisions;
                let (low_hz, high_hz) = mapper.band_range(octave, sub);
                mapper.bands.push(FrequencyBand {
                    index,
                    low_hz,
                    high_hz,
                    multiplier: band_multiplier(index, config),
                    base_threshold: band_base_threshold(index),
                });
            }
        }

        mapper
    }

    pub fn octaves(&self) -> usize {
        self.octaves
    }

    pub fn octave_divisions(&self) -> usize {
        self.divisions
    }

    pub fn total_bands(&self) -> usize {
        self.bands.len()
    }

    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    pub fn band(&self, index: usize) -> Option<&FrequencyBand> {
        self.bands.get(index)
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }

    /// Frequency range of sub-band `sub` within `octave`
    pub fn band_range(&self, octave: usize, sub: usize) -> (f32, f32) {
        let nyquist = self.nyquist();
        let low = if octave == 0 {
            0.0
        } else {
            nyquist / 2f32.powi((self.octaves - octave) as i32)
        };
        let high = nyquist / 2f32.powi(self.octaves as i32 - octave as i32 - 1);
        let width = (high - low) / self.divisions as f32;

        let band_low = low + sub as f32 * width;
        (band_low, band_low + width)
    }

    /// Spectrum bin holding frequency `freq_hz`, clamped to the array
    pub fn frequency_to_bin(&self, freq_hz: f32) -> usize {
        let n = self.num_samples as f32;
        let bandwidth = self.sample_rate / n;

        if freq_hz < bandwidth / 2.0 {
            return 0;
        }
        if freq_hz > self.nyquist() - bandwidth / 2.0 {
            return (self.num_samples / 2).saturating_sub(1);
        }
        ((n * (freq_hz / self.sample_rate)).floor() as usize).min(self.num_samples.saturating_sub(1))
    }

    /// Inclusive bin range covered by band `index`
    pub fn band_bins(&self, index: usize) -> Option<RangeInclusive<usize>> {
        let band = self.bands.get(index)?;
        let last = self.num_samples.checked_sub(1)?;
        let start = self.frequency_to_bin(band.low_hz).min(last);
        let end = self.frequency_to_bin(band.high_hz).clamp(start, last);
        Some(start..=end)
    }

    /// Mean magnitude between `low_hz` and `high_hz` (bins inclusive)
    pub fn band_average(&self, low_hz: f32, high_hz: f32, magnitudes: &[f32]) -> f32 {
        let Some(last) = magnitudes.len().checked_sub(1) else {
            return 0.0;
        };
        let start = self.frequency_to_bin(low_hz).min(last);
        let end = self.frequency_to_bin(high_hz).clamp(start, last);

        let bins = &magnitudes[start..=end];
        bins.iter().sum::<f32>() / bins.len() as f32
    }

    /// Fill `out[i]` with the louder channel's average for band `i`
    pub fn band_values(&self, left: &[f32], right: &[f32], out: &mut [f32]) {
        for (band, value) in self.bands.iter().zip(out.iter_mut()) {
            let left_avg = self.band_average(band.low_hz, band.high_hz, left);
            let right_avg = self.band_average(band.low_hz, band.high_hz, right);
            *value = left_avg.max(right_avg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper(sample_rate: u32, min_frequency_hz: f32, divisions: usize) -> FrequencyBandMapper {
        let config = FrequencyDetectionConfig {
            octave_divisions: divisions,
            ..FrequencyDetectionConfig::default()
        };
        FrequencyBandMapper::new(sample_rate, 1024, min_frequency_hz, &config)
    }

    #[test]
    fn test_octaves_for_cd_rate() {
        assert_eq!(compute_octaves(44_100.0, 60.0), 9);
        let mapper = mapper(44_100, 60.0, 3);
        assert_eq!(mapper.octaves(), 9);
        assert_eq!(mapper.total_bands(), 27);
    }

    #[test]
    fn test_octaves_is_smallest_k_reaching_min_frequency() {
        let cases = [
            (44_100.0, 60.0),
            (48_000.0, 20.0),
            (48_000.0, 100.0),
            (22_050.0, 1_000.0),
            (8_000.0, 1_000.0),
            (8_000.0, 3_999.0),
        ];
        for (sample_rate, min_freq) in cases {
            let k = compute_octaves(sample_rate, min_freq);
            let nyquist = sample_rate / 2.0;
            assert!(k >= 1);
            assert!(
                nyquist / 2f32.powi(k as i32) <= min_freq,
                "k={} does not reach {} Hz at {} Hz",
                k,
                min_freq,
                sample_rate
            );
            if k > 1 {
                assert!(nyquist / 2f32.powi(k as i32 - 1) > min_freq);
            }
        }
    }

    #[test]
    fn test_octave_edge_equal_to_min_frequency_stops() {
        // 4000 / 2 = 2000 > 1000, 2000 / 2 = 1000 is not above 1000
        assert_eq!(compute_octaves(8_000.0, 1_000.0), 2);
    }

    #[test]
    fn test_bands_partition_nyquist_contiguously() {
        for divisions in [1, 2, 3, 5] {
            let mapper = mapper(44_100, 60.0, divisions);
            let bands = mapper.bands();
            assert_eq!(bands.len(), mapper.octaves() * divisions);
            assert_eq!(bands[0].low_hz, 0.0);

            for pair in bands.windows(2) {
                assert!(pair[0].high_hz > pair[0].low_hz);
                assert!(
                    (pair[0].high_hz - pair[1].low_hz).abs() < 1e-2,
                    "gap between band {} and {}",
                    pair[0].index,
                    pair[1].index
                );
            }

            let top = bands.last().unwrap();
            assert!((top.high_hz - mapper.nyquist()).abs() < 1e-2);
        }
    }

    #[test]
    fn test_band_indices_follow_octave_major_order() {
        let mapper = mapper(44_100, 60.0, 3);
        for (position, band) in mapper.bands().iter().enumerate() {
            assert_eq!(band.index, position);
        }
        // Second sub-band of octave 2
        let (low, high) = mapper.band_range(2, 1);
        assert_eq!(mapper.band(7).unwrap().low_hz, low);
        assert_eq!(mapper.band(7).unwrap().high_hz, high);
    }

    #[test]
    fn test_band_policy_constants() {
        let mapper = mapper(44_100, 60.0, 3);
        let bands = mapper.bands();
        assert_eq!(bands[0].multiplier, 2.0);
        assert_eq!(bands[6].multiplier, 2.0);
        assert_eq!(bands[6].base_threshold, 0.003);
        assert_eq!(bands[7].multiplier, 3.0);
        assert_eq!(bands[7].base_threshold, 0.001);
        assert_eq!(bands[19].multiplier, 3.0);
        assert_eq!(bands[20].multiplier, 4.0);
        assert_eq!(bands[26].base_threshold, 0.001);
    }

    #[test]
    fn test_frequency_to_bin_edges() {
        let mapper = mapper(44_100, 60.0, 3);
        let bandwidth = 44_100.0 / 1024.0;

        assert_eq!(mapper.frequency_to_bin(0.0), 0);
        assert_eq!(mapper.frequency_to_bin(bandwidth / 2.0 - 0.01), 0);
        assert_eq!(mapper.frequency_to_bin(22_050.0), 511);
        assert_eq!(mapper.frequency_to_bin(30_000.0), 511);
        // 1000 Hz * 1024 / 44100 = 23.2
        assert_eq!(mapper.frequency_to_bin(1_000.0), 23);
    }

    #[test]
    fn test_band_average_is_inclusive_mean() {
        let mapper = mapper(44_100, 60.0, 3);
        let mut magnitudes = vec![0.0; 1024];
        magnitudes[23] = 1.0;
        magnitudes[24] = 3.0;

        let start_hz = 23.0 * 44_100.0 / 1024.0 + 1.0;
        let end_hz = 24.0 * 44_100.0 / 1024.0 + 1.0;
        assert_eq!(mapper.frequency_to_bin(start_hz), 23);
        assert_eq!(mapper.frequency_to_bin(end_hz), 24);
        assert!((mapper.band_average(start_hz, end_hz, &magnitudes) - 2.0).abs() < 1e-6);

        // Reversed range collapses onto the start bin
        assert!((mapper.band_average(end_hz, start_hz, &magnitudes) - 3.0).abs() < 1e-6);
        assert_eq!(mapper.band_average(0.0, 100.0, &[]), 0.0);
    }

    #[test]
    fn test_band_values_take_louder_channel() {
        let mapper = mapper(44_100, 60.0, 3);
        let mut left = vec![0.0; 1024];
        let mut right = vec![0.0; 1024];
        let bins = mapper.band_bins(10).unwrap();
        for bin in bins.clone() {
            left[bin] = 0.2;
            right[bin] = 0.5;
        }

        let mut values = vec![0.0; mapper.total_bands()];
        mapper.band_values(&left, &right, &mut values);
        assert!(values[10] > 0.0);
        assert!((values[10] - 0.5).abs() < 0.26);
        assert!(values[10] >= 0.2);
        assert_eq!(values[0], 0.0);
    }
}
