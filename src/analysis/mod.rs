// Analysis module - per-tick beat detection pipeline
//
// Pipeline for one tick:
//   SpectrumFrame ─┬─ waveform ─→ EnergyDetector ─────────────────→ ENERGY
//                  └─ spectrum ─→ FrequencyBandDetector ─→ BeatClassifier ─→ KICK/SNARE/HIT_HAT
//
// BeatDetector owns every piece of mutable state for one detector instance
// and is driven synchronously by the host, one frame per call. It never
// spawns work, blocks or keeps a reference to the frame past the call.

use serde::{Deserialize, Serialize};

use crate::config::{DetectionMode, DetectorConfig};
use crate::error::DetectorError;
use crate::events::{BeatEvent, EventType};

pub mod bands;
pub mod classifier;
pub mod energy;
pub mod frame;
pub mod frequency;
pub mod history;

use bands::FrequencyBandMapper;
use classifier::BeatClassifier;
use energy::EnergyDetector;
use frame::SpectrumFrame;
use frequency::FrequencyBandDetector;

/// Set of beat categories detected in one tick
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BeatFlags(u8);

impl BeatFlags {
    pub const ENERGY: BeatFlags = BeatFlags(1);
    pub const KICK: BeatFlags = BeatFlags(1 << 1);
    pub const SNARE: BeatFlags = BeatFlags(1 << 2);
    pub const HIT_HAT: BeatFlags = BeatFlags(1 << 3);

    pub const fn empty() -> Self {
        BeatFlags(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: BeatFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: BeatFlags) {
        self.0 |= other.0;
    }

    /// Categories present, in emission order
    pub fn event_types(self) -> impl Iterator<Item = EventType> {
        EventType::ALL
            .into_iter()
            .filter(move |event_type| self.contains(event_type.flag()))
    }
}

impl std::ops::BitOr for BeatFlags {
    type Output = BeatFlags;

    fn bitor(self, rhs: BeatFlags) -> BeatFlags {
        BeatFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for BeatFlags {
    fn bitor_assign(&mut self, rhs: BeatFlags) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Debug for BeatFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.event_types()).finish()
    }
}

/// Wideband statistics at the end of the last tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyStats {
    pub last: f32,
    pub mean: f32,
    pub variance: f32,
    pub threshold: f32,
}

/// Per-band statistics at the end of the last tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStats {
    pub index: usize,
    pub low_hz: f32,
    pub high_hz: f32,
    pub last: f32,
    pub mean: f32,
    pub variance: f32,
    pub threshold: f32,
    pub detected: bool,
}

/// Diagnostic snapshot of a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorStats {
    pub frames_processed: u64,
    pub energy: EnergyStats,
    pub bands: Vec<BandStats>,
}

/// One independent beat detector instance
#[derive(Debug, Clone)]
pub struct BeatDetector {
    mode: DetectionMode,
    num_samples: usize,
    source_id: String,
    energy: EnergyDetector,
    bands: FrequencyBandDetector,
    classifier: BeatClassifier,
    last_flags: BeatFlags,
    frames_processed: u64,
}

impl BeatDetector {
    /// Validate `config` against `sample_rate` and build the band layout
    pub fn new(config: &DetectorConfig, sample_rate: u32) -> Result<Self, DetectorError> {
        config.validate(sample_rate)?;

        let mapper = FrequencyBandMapper::new(
            sample_rate,
            config.num_samples,
            config.min_frequency_hz,
            &config.frequency,
        );
        let classifier = BeatClassifier::new(mapper.total_bands());

        Ok(Self {
            mode: config.mode,
            num_samples: config.num_samples,
            source_id: config.source_id.clone(),
            energy: EnergyDetector::new(&config.energy, config.min_beat_separation_sec),
            bands: FrequencyBandDetector::new(
                mapper,
                &config.frequency,
                config.min_beat_separation_sec,
            ),
            classifier,
            last_flags: BeatFlags::empty(),
            frames_processed: 0,
        })
    }

    /// Run the detection bookkeeping for one tick
    ///
    /// Only the branches enabled by the mode run; a disabled branch keeps
    /// its histories untouched. A frame of the wrong length is rejected
    /// before any state changes.
    pub fn detect(&mut self, frame: &SpectrumFrame, now: f64) -> Result<BeatFlags, DetectorError> {
        if frame.len() != self.num_samples {
            return Err(DetectorError::FrameSizeMismatch {
                expected: self.num_samples,
                actual: frame.len(),
            });
        }

        let mut flags = BeatFlags::empty();

        if self.mode.runs_energy()
            && self
                .energy
                .detect(frame.left_waveform(), frame.right_waveform(), now)
        {
            flags.insert(BeatFlags::ENERGY);
        }

        if self.mode.runs_frequency() {
            let detected = self.bands.detect(frame, now);
            flags |= self.classifier.classify(detected);
        }

        self.last_flags = flags;
        self.frames_processed += 1;
        Ok(flags)
    }

    /// Raw (unclamped) intensity of a category for the last tick
    ///
    /// Energy: latest reading over the history mean.
    /// Bands: mean of this tick's band values over the category window.
    pub fn intensity(&self, event_type: EventType) -> f32 {
        match event_type {
            EventType::Energy => self.energy.intensity(),
            EventType::Kick => self
                .bands
                .range_intensity(self.classifier.kick_range().indices()),
            EventType::Snare => self
                .bands
                .range_intensity(self.classifier.snare_range().indices()),
            EventType::HitHat => self
                .bands
                .range_intensity(self.classifier.hat_range().indices()),
        }
    }

    /// One event of `event_type` for the last tick, stamped with `now`
    pub fn build_event(&self, event_type: EventType, now: f64) -> BeatEvent {
        BeatEvent::new(event_type, self.intensity(event_type), now, &self.source_id)
    }

    /// Events for `flags`, in emission order, stamped with `now`
    pub fn build_events(&self, flags: BeatFlags, now: f64) -> Vec<BeatEvent> {
        flags
            .event_types()
            .map(|event_type| self.build_event(event_type, now))
            .collect()
    }

    /// Detect and build the tick's events in one call
    pub fn process_frame(
        &mut self,
        frame: &SpectrumFrame,
        now: f64,
    ) -> Result<Vec<BeatEvent>, DetectorError> {
        let flags = self.detect(frame, now)?;
        Ok(self.build_events(flags, now))
    }

    pub fn stats(&self) -> DetectorStats {
        let history = self.energy.history();
        let energy = EnergyStats {
            last: history.latest().unwrap_or(0.0),
            mean: history.mean(),
            variance: history.variance(),
            threshold: self.energy.last_threshold(),
        };

        let bands = self
            .bands
            .mapper()
            .bands()
            .iter()
            .map(|band| {
                let index = band.index;
                let (mean, variance) = self
                    .bands
                    .history(index)
                    .map(|h| (h.mean(), h.variance()))
                    .unwrap_or((0.0, 0.0));
                BandStats {
                    index,
                    low_hz: band.low_hz,
                    high_hz: band.high_hz,
                    last: self.bands.current_values().get(index).copied().unwrap_or(0.0),
                    mean,
                    variance,
                    threshold: self.bands.thresholds().get(index).copied().unwrap_or(0.0),
                    detected: self.bands.detected().get(index).copied().unwrap_or(false),
                }
            })
            .collect();

        DetectorStats {
            frames_processed: self.frames_processed,
            energy,
            bands,
        }
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn mapper(&self) -> &FrequencyBandMapper {
        self.bands.mapper()
    }

    pub fn energy_detector(&self) -> &EnergyDetector {
        &self.energy
    }

    pub fn band_detector(&self) -> &FrequencyBandDetector {
        &self.bands
    }

    pub fn classifier(&self) -> &BeatClassifier {
        &self.classifier
    }

    /// Flags of the most recent tick
    pub fn last_flags(&self) -> BeatFlags {
        self.last_flags
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}
