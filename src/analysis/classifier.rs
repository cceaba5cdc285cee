// BeatClassifier - maps per-band detection flags onto instrument categories
//
// Each category watches a fixed window of band indices and fires when enough
// bands in that window detected an onset this tick:
//
//   Kick:   bands [1, min(6, T-1)],                     count >= 2
//   Snare:  bands [min(8, T-1), max(T-5, lower)],       count >= (upper - lower) / 3
//   Hi-Hat: bands [max(0, T-6), T-1],                   count >= 1
//
// where T is the total band count. The snare minimum uses integer division
// and reaches 0 for narrow windows (T <= 15), at which point the snare fires
// on every tick regardless of the flags. Kept as is; see DESIGN.md.
//
// No state is carried between ticks.

use std::ops::RangeInclusive;

use crate::analysis::BeatFlags;

/// Inclusive window of band indices plus the number of detections it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    pub lower: usize,
    pub upper: usize,
    pub min_count: usize,
}

impl BandRange {
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.lower..=self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// Number of set flags inside the window; indices past the slice count as unset
    pub fn count(&self, detected: &[bool]) -> usize {
        self.indices()
            .filter(|&index| detected.get(index).copied().unwrap_or(false))
            .count()
    }

    pub fn is_triggered(&self, detected: &[bool]) -> bool {
        self.count(detected) >= self.min_count
    }
}

/// Rule-based Kick/Snare/Hi-Hat classifier for one band layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatClassifier {
    total_bands: usize,
    kick: BandRange,
    snare: BandRange,
    hat: BandRange,
}

impl BeatClassifier {
    /// Derive the category windows for a layout of `total_bands` bands
    pub fn new(total_bands: usize) -> Self {
        let last = total_bands.saturating_sub(1);

        let kick = BandRange {
            lower: 1,
            upper: last.min(6),
            min_count: 2,
        };

        let snare_lower = last.min(8);
        let snare_upper = total_bands.saturating_sub(5).max(snare_lower);
        let snare = BandRange {
            lower: snare_lower,
            upper: snare_upper,
            min_count: (snare_upper - snare_lower) / 3,
        };

        let hat = BandRange {
            lower: total_bands.saturating_sub(6),
            upper: last,
            min_count: 1,
        };

        Self {
            total_bands,
            kick,
            snare,
            hat,
        }
    }

    pub fn total_bands(&self) -> usize {
        self.total_bands
    }

    pub fn kick_range(&self) -> &BandRange {
        &self.kick
    }

    pub fn snare_range(&self) -> &BandRange {
        &self.snare
    }

    pub fn hat_range(&self) -> &BandRange {
        &self.hat
    }

    pub fn is_kick(&self, detected: &[bool]) -> bool {
        self.kick.is_triggered(detected)
    }

    pub fn is_snare(&self, detected: &[bool]) -> bool {
        self.snare.is_triggered(detected)
    }

    pub fn is_hat(&self, detected: &[bool]) -> bool {
        self.hat.is_triggered(detected)
    }

    /// Classify this tick's band flags; never sets [`BeatFlags::ENERGY`]
    pub fn classify(&self, detected: &[bool]) -> BeatFlags {
        let mut flags = BeatFlags::empty();
        if self.is_kick(detected) {
            flags.insert(BeatFlags::KICK);
        }
        if self.is_snare(detected) {
            flags.insert(BeatFlags::SNARE);
        }
        if self.is_hat(detected) {
            flags.insert(BeatFlags::HIT_HAT);
        }
        flags
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
