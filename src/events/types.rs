use serde::{Deserialize, Serialize};

use crate::analysis::BeatFlags;

/// Category of a detected beat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Wideband energy onset
    Energy,
    /// Low-band onset
    Kick,
    /// Mid-band onset
    Snare,
    /// High-band onset
    HitHat,
}

impl EventType {
    /// All categories in emission order
    pub const ALL: [EventType; 4] = [
        EventType::Energy,
        EventType::Kick,
        EventType::Snare,
        EventType::HitHat,
    ];

    /// Flag bit this category corresponds to
    pub fn flag(self) -> BeatFlags {
        match self {
            EventType::Energy => BeatFlags::ENERGY,
            EventType::Kick => BeatFlags::KICK,
            EventType::Snare => BeatFlags::SNARE,
            EventType::HitHat => BeatFlags::HIT_HAT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Energy => "Energy",
            EventType::Kick => "Kick",
            EventType::Snare => "Snare",
            EventType::HitHat => "HitHat",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected beat, handed to observers in the tick it was detected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatEvent {
    pub event_type: EventType,
    /// Normalized strength in [0, 1]
    pub intensity: f32,
    /// Host time of the tick in seconds
    pub timestamp: f64,
    /// Identifier of the emitting detector
    pub source_id: String,
}

impl BeatEvent {
    /// Build an event, clamping `intensity` to [0, 1] (NaN becomes 0)
    pub fn new(
        event_type: EventType,
        intensity: f32,
        timestamp: f64,
        source_id: impl Into<String>,
    ) -> Self {
        let intensity = if intensity.is_nan() {
            0.0
        } else {
            intensity.clamp(0.0, 1.0)
        };

        Self {
            event_type,
            intensity,
            timestamp,
            source_id: source_id.into(),
        }
    }
}
