//! Engine module housing the host-facing detector component.
//!
//! This module exposes the source traits (`backend`) and the `BeatDetection`
//! component that runs one detection pass per host tick (`core`).

pub mod backend;
pub mod core;

pub use backend::{
    read_wav, FrameSource, StubTimeSource, SystemTimeSource, TimeSource, WavData, WavFrameSource,
};
pub use core::{BeatDetection, DisableHandle, TickOutcome};
