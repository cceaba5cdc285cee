// EnergyDetector - wideband onset detection on the time-domain waveform
//
// Algorithm:
// 1. energy = sqrt(mean(left[i]^2 + right[i]^2)) * 100
// 2. threshold = sensitivity * mean(energy history)
// 3. beat if the minimum separation has elapsed, energy > threshold and
//    energy > 2.0 (absolute floor against near-silent input)
// 4. push energy and max(energy - threshold, 0) into the histories
//
// The threshold is computed from the history as it was before this tick's
// push, so a reading is never compared against itself.

use crate::analysis::history::HistoryBuffer;
use crate::config::EnergyDetectionConfig;

/// Fixed scale applied to the RMS of the waveform
pub const ENERGY_SCALE: f32 = 100.0;
/// Energy a tick must exceed to count as a beat, regardless of history
pub const ENERGY_FLOOR: f32 = 2.0;

/// Scaled RMS energy of a stereo waveform
pub fn frame_energy(left: &[f32], right: &[f32]) -> f32 {
    if left.is_empty() {
        return 0.0;
    }
    let sum: f32 = left
        .iter()
        .zip(right.iter())
        .map(|(l, r)| l * l + r * r)
        .sum();
    (sum / left.len() as f32).sqrt() * ENERGY_SCALE
}

/// Wideband detector with an adaptive history threshold
#[derive(Debug, Clone)]
pub struct EnergyDetector {
    history: HistoryBuffer,
    diffs: HistoryBuffer,
    sensitivity: f32,
    min_separation: f64,
    last_beat_time: f64,
    last_threshold: f32,
}

impl EnergyDetector {
    pub fn new(config: &EnergyDetectionConfig, min_beat_separation_sec: f64) -> Self {
        Self {
            history: HistoryBuffer::new(config.history_length),
            diffs: HistoryBuffer::new(config.history_length),
            sensitivity: config.sensitivity,
            min_separation: min_beat_separation_sec,
            // First tick is always eligible
            last_beat_time: -min_beat_separation_sec,
            last_threshold: 0.0,
        }
    }

    /// Run one tick on a stereo waveform
    pub fn detect(&mut self, left: &[f32], right: &[f32], now: f64) -> bool {
        self.process_energy(frame_energy(left, right), now)
    }

    /// Run one tick on an already computed energy value
    pub fn process_energy(&mut self, current_energy: f32, now: f64) -> bool {
        let avg_energy = self.history.mean();
        let threshold = self.sensitivity * avg_energy;

        let is_beat = now - self.last_beat_time >= self.min_separation
            && current_energy > threshold
            && current_energy > ENERGY_FLOOR;

        self.history.push(current_energy);
        self.diffs.push((current_energy - threshold).max(0.0));
        self.last_threshold = threshold;

        if is_beat {
            self.last_beat_time = now;
        }

        is_beat
    }

    /// Latest energy relative to the history mean (unclamped)
    pub fn intensity(&self) -> f32 {
        let avg = self.history.mean();
        if avg > 0.0 {
            self.history.latest().unwrap_or(0.0) / avg
        } else {
            0.0
        }
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Amounts by which past readings exceeded their threshold
    pub fn diff_history(&self) -> &HistoryBuffer {
        &self.diffs
    }

    /// Threshold used by the most recent tick
    pub fn last_threshold(&self) -> f32 {
        self.last_threshold
    }

    /// Time of the last accepted beat
    pub fn last_beat_time(&self) -> f64 {
        self.last_beat_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_detector(history_length: usize, sensitivity: f32, separation: f64) -> EnergyDetector {
        EnergyDetector::new(
            &EnergyDetectionConfig {
                history_length,
                sensitivity,
            },
            separation,
        )
    }

    #[test]
    fn test_frame_energy_scaling() {
        // Constant 0.1 on both channels: sqrt(0.02) * 100
        let left = vec![0.1; 512];
        let right = vec![0.1; 512];
        let expected = 0.02f32.sqrt() * 100.0;
        assert!((frame_energy(&left, &right) - expected).abs() < 1e-3);
        assert_eq!(frame_energy(&[], &[]), 0.0);
    }

    #[test]
    fn test_silence_never_triggers() {
        let mut detector = new_detector(43, 1.5, 0.05);
        let silence = vec![0.0; 1024];
        for tick in 0..200 {
            assert!(!detector.detect(&silence, &silence, tick as f64 * 0.02));
        }
        assert_eq!(detector.history().mean(), 0.0);
    }

    #[test]
    fn test_first_loud_tick_is_eligible() {
        let mut detector = new_detector(43, 1.5, 0.5);
        assert!(detector.process_energy(10.0, 0.0));
        assert_eq!(detector.last_beat_time(), 0.0);
    }

    #[test]
    fn test_energy_floor_blocks_quiet_onsets() {
        let mut detector = new_detector(43, 1.5, 0.0);
        // Empty history gives a zero threshold; 1.9 is still below the floor
        assert!(!detector.process_energy(1.9, 0.0));

        let mut fresh = new_detector(43, 1.5, 0.0);
        assert!(fresh.process_energy(2.1, 0.0));
    }

    #[test]
    fn test_threshold_reads_history_before_push() {
        let mut detector = new_detector(4, 1.5, 0.0);
        for tick in 0..4 {
            detector.process_energy(4.0, tick as f64);
        }
        // History mean is 4.0, threshold 6.0; 6.5 passes even though the
        // mean including itself would be 4.625 * 1.5 = 6.94
        assert!(detector.process_energy(6.5, 10.0));
        assert!((detector.last_threshold() - 6.0).abs() < 1e-5);
        assert!((detector.diff_history().latest().unwrap() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_steady_input_stops_triggering() {
        let mut detector = new_detector(10, 1.5, 0.0);
        let mut late_beats = 0;
        for tick in 0..100 {
            let beat = detector.process_energy(5.0, tick as f64 * 0.02);
            if tick > 10 && beat {
                late_beats += 1;
            }
        }
        assert_eq!(late_beats, 0);
        assert!((detector.history().mean() - 5.0).abs() < 1e-5);
        assert!((detector.last_threshold() - 7.5).abs() < 1e-4);
    }

    #[test]
    fn test_impulse_after_baseline() {
        let mut detector = new_detector(43, 1.5, 0.05);
        for tick in 0..43 {
            detector.process_energy(1.0, tick as f64 * 0.02);
        }
        assert!(detector.process_energy(10.0, 43.0 * 0.02));
        assert!((detector.last_threshold() - 1.5).abs() < 1e-4);
        assert!(detector.intensity() > 1.0);
    }

    #[test]
    fn test_min_separation_suppresses_close_beats() {
        let mut detector = new_detector(43, 1.5, 0.5);
        assert!(detector.process_energy(50.0, 1.0));
        for tick in 1..5 {
            detector.process_energy(0.0, 1.0 + tick as f64 * 0.02);
        }
        assert!(!detector.process_energy(500.0, 1.2));
        assert!(detector.process_energy(5000.0, 1.7));
    }

    #[test]
    fn test_diff_history_tracks_every_tick() {
        let mut detector = new_detector(8, 1.5, 0.0);
        for tick in 0..5 {
            detector.process_energy(0.0, tick as f64);
        }
        assert_eq!(detector.diff_history().len(), 5);
        assert_eq!(detector.history().len(), 5);
    }

    #[test]
    fn test_intensity_zero_without_history() {
        let detector = new_detector(8, 1.5, 0.0);
        assert_eq!(detector.intensity(), 0.0);
    }
}
