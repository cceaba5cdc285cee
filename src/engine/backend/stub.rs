use std::cell::Cell;

use super::TimeSource;

/// Deterministic time source for tests and offline runs.
///
/// The first call to `now()` returns 0.0 and every call advances the clock
/// by a fixed step, so tick `k` is stamped `k * step` regardless of how
/// long processing took.
pub struct StubTimeSource {
    step_sec: f64,
    ticks: Cell<u64>,
}

impl StubTimeSource {
    /// Clock advancing 10 ms per call
    pub fn new() -> Self {
        Self::with_step(0.01)
    }

    pub fn with_step(step_sec: f64) -> Self {
        Self {
            step_sec,
            ticks: Cell::new(0),
        }
    }

    /// Clock advancing one frame of `num_samples` at `sample_rate` per call
    pub fn for_frames(num_samples: usize, sample_rate: u32) -> Self {
        Self::with_step(num_samples as f64 / sample_rate.max(1) as f64)
    }

    pub fn step(&self) -> f64 {
        self.step_sec
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> f64 {
        let tick = self.ticks.get();
        self.ticks.set(tick + 1);
        tick as f64 * self.step_sec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_clock_advances_by_step() {
        let clock = StubTimeSource::with_step(0.5);
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.now(), 0.5);
        assert_eq!(clock.now(), 1.0);
    }

    #[test]
    fn test_frame_step() {
        let clock = StubTimeSource::for_frames(1024, 44_100);
        assert!((clock.step() - 1024.0 / 44_100.0).abs() < 1e-12);
        assert_eq!(StubTimeSource::default().step(), 0.01);
    }
}
