//! BeatDetection: host-facing detector component.
//!
//! Binds a [`FrameSource`] and a [`TimeSource`] to a [`BeatDetector`] and an
//! [`EventEmitter`]. The host calls [`BeatDetection::update`] once per frame
//! tick; each call runs one complete, synchronous detection pass and delivers
//! the tick's events before returning.

use std::cell::Cell;
use std::rc::Rc;

use log::{info, warn};

use crate::analysis::frame::SpectrumFrame;
use crate::analysis::{BeatDetector, BeatFlags, DetectorStats};
use crate::config::DetectorConfig;
use crate::engine::backend::{FrameSource, TimeSource};
use crate::error::{log_detector_error, DetectorError};
use crate::events::{BeatEvent, EventEmitter, SubscriberHandle};

/// Result of one [`BeatDetection::update`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Detection ran; `events` events were built from `flags` and delivered
    Processed { flags: BeatFlags, events: usize },
    /// Source produced nothing this tick; no state changed
    SourceInactive,
    /// Detector is disabled (startup failure or [`BeatDetection::disable`])
    Disabled,
    /// Source handed over an unusable frame; no state changed
    Rejected,
}

/// Shared switch that turns a detector off from outside the update loop
///
/// Useful from inside an event callback, which cannot borrow the detector.
#[derive(Debug, Clone)]
pub struct DisableHandle {
    enabled: Rc<Cell<bool>>,
}

impl DisableHandle {
    /// Takes effect from the next tick; a tick in progress completes
    pub fn disable(&self) {
        self.enabled.set(false);
    }
}

/// Beat detector bound to a host frame source
pub struct BeatDetection {
    config: DetectorConfig,
    detector: Option<BeatDetector>,
    source: Option<Box<dyn FrameSource>>,
    time_source: Box<dyn TimeSource>,
    emitter: EventEmitter,
    frame: SpectrumFrame,
    enabled: Rc<Cell<bool>>,
    startup_error: Option<DetectorError>,
}

impl BeatDetection {
    /// Bind `source` and build the detector.
    ///
    /// Never fails: a missing source or an invalid configuration is logged
    /// once and leaves the instance permanently disabled (see
    /// [`BeatDetection::startup_error`]).
    pub fn new(
        config: DetectorConfig,
        source: Option<Box<dyn FrameSource>>,
        time_source: Box<dyn TimeSource>,
    ) -> Self {
        let sample_rate = source.as_ref().map(|source| source.sample_rate());
        let detector = match sample_rate {
            None => Err(DetectorError::SourceMissing),
            Some(sample_rate) => BeatDetector::new(&config, sample_rate),
        };

        let (detector, startup_error, frame) = match detector {
            Ok(detector) => {
                if config.debug_logs {
                    let mapper = detector.mapper();
                    info!(
                        "[BeatDetection] Started: mode={:?}, sample_rate={}, N={}, octaves={}, divisions={}, bands={}",
                        config.mode,
                        sample_rate.unwrap_or_default(),
                        config.num_samples,
                        mapper.octaves(),
                        mapper.octave_divisions(),
                        mapper.total_bands()
                    );
                }
                // Sized only after validation accepted num_samples
                let frame = SpectrumFrame::new(detector.num_samples());
                (Some(detector), None, frame)
            }
            Err(err) => {
                log_detector_error(&err, "BeatDetection::new");
                (None, Some(err), SpectrumFrame::new(0))
            }
        };

        let enabled = Rc::new(Cell::new(detector.is_some()));

        Self {
            config,
            detector,
            source,
            time_source,
            emitter: EventEmitter::new(),
            frame,
            enabled,
            startup_error,
        }
    }

    /// Run one detection pass
    pub fn update(&mut self) -> TickOutcome {
        if !self.enabled.get() {
            return TickOutcome::Disabled;
        }
        let (Some(detector), Some(source)) = (self.detector.as_mut(), self.source.as_mut()) else {
            return TickOutcome::Disabled;
        };

        if !source.is_active() {
            source.skip_tick();
            return TickOutcome::SourceInactive;
        }

        let subscribers = self.emitter.snapshot();

        if let Err(err) = source.fill_frame(&mut self.frame) {
            warn!("[BeatDetection] Skipping tick: {}", err);
            return TickOutcome::Rejected;
        }

        let now = self.time_source.now();
        let flags = match detector.detect(&self.frame, now) {
            Ok(flags) => flags,
            Err(err) => {
                warn!("[BeatDetection] Skipping tick: {}", err);
                return TickOutcome::Rejected;
            }
        };

        if subscribers.is_empty() {
            return TickOutcome::Processed { flags, events: 0 };
        }

        let mut events = 0;
        for event_type in flags.event_types() {
            let event = detector.build_event(event_type, now);
            if self.config.debug_logs {
                info!(
                    "[BeatDetection] {} beat at {:.3}s, intensity {:.2}",
                    event.event_type, event.timestamp, event.intensity
                );
            }
            subscribers.deliver(&event);
            events += 1;
        }

        TickOutcome::Processed { flags, events }
    }

    /// Stop processing from the next tick on; there is no re-enable
    pub fn disable(&mut self) {
        if self.enabled.replace(false) && self.config.debug_logs {
            info!("[BeatDetection] Disabled");
        }
    }

    pub fn disable_handle(&self) -> DisableHandle {
        DisableHandle {
            enabled: Rc::clone(&self.enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Error that disabled the instance at startup, if any
    pub fn startup_error(&self) -> Option<&DetectorError> {
        self.startup_error.as_ref()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriberHandle
    where
        F: FnMut(&BeatEvent) + 'static,
    {
        self.emitter.subscribe(callback)
    }

    pub fn unsubscribe(&self, handle: SubscriberHandle) -> bool {
        self.emitter.unsubscribe(handle)
    }

    /// Registry handle, cloneable into callbacks
    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn detector(&self) -> Option<&BeatDetector> {
        self.detector.as_ref()
    }

    pub fn stats(&self) -> Option<DetectorStats> {
        self.detector.as_ref().map(BeatDetector::stats)
    }
}
