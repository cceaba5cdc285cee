// Beat Detection Core - real-time spectral onset detection
// Wideband energy plus Kick/Snare/Hi-Hat classification from per-band onsets

// Module declarations
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod testing;

// Re-exports for convenience
pub use analysis::frame::SpectrumFrame;
pub use analysis::{BeatDetector, BeatFlags, DetectorStats};
pub use config::{DetectionMode, DetectorConfig};
pub use engine::{BeatDetection, FrameSource, TickOutcome, TimeSource};
pub use error::{DetectorError, ErrorCode};
pub use events::{BeatEvent, EventEmitter, EventType, SubscriberHandle};
