// Integration tests for the public detector API
//
// These drive BeatDetection end to end: scripted frames through the
// observer registry, and a WAV file decoded and transformed by the offline
// frame source.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use beat_detection::engine::{StubTimeSource, WavFrameSource};
use beat_detection::error::{DetectorErrorCodes, ErrorCode};
use beat_detection::testing::{
    band_impulse_frame, constant_energy_frame, silent_frame, ScriptedFrameSource,
};
use beat_detection::{
    BeatDetection, BeatDetector, BeatEvent, DetectionMode, DetectorConfig, EventType, FrameSource,
    TickOutcome,
};

const SAMPLE_RATE: u32 = 44_100;
const N: usize = 1024;

/// Mono 16-bit WAV: silence with square-wave bursts starting at the given windows
fn write_burst_wav(path: &Path, total_windows: usize, bursts: &[(usize, usize)]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..total_windows * N {
        let window = i / N;
        let in_burst = bursts
            .iter()
            .any(|&(start, len)| window >= start && window < start + len);
        let sample = if in_burst {
            // 441 Hz square wave at half scale
            if (i / 50) % 2 == 0 {
                0.5
            } else {
                -0.5
            }
        } else {
            0.0
        };
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

fn collect_events(detection: &BeatDetection) -> Rc<RefCell<Vec<BeatEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    detection.subscribe(move |event: &BeatEvent| sink.borrow_mut().push(event.clone()));
    events
}

#[test]
fn test_wav_bursts_produce_energy_events() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bursts.wav");
    write_burst_wav(&path, 60, &[(20, 5), (45, 5)]);

    let config = DetectorConfig {
        mode: DetectionMode::Energy,
        debug_logs: false,
        ..DetectorConfig::default()
    };
    let source = WavFrameSource::open(&path, N).unwrap();
    assert_eq!(source.sample_rate(), SAMPLE_RATE);
    assert_eq!(source.total_ticks(), 60);

    let step = N as f64 / SAMPLE_RATE as f64;
    let mut detection = BeatDetection::new(
        config,
        Some(Box::new(source)),
        Box::new(StubTimeSource::for_frames(N, SAMPLE_RATE)),
    );
    let events = collect_events(&detection);

    let mut processed = 0;
    while let TickOutcome::Processed { .. } = detection.update() {
        processed += 1;
    }
    assert_eq!(processed, 60);

    let events = events.borrow();
    let ticks: Vec<usize> = events
        .iter()
        .map(|event| (event.timestamp / step).round() as usize)
        .collect();

    assert!(events.iter().all(|e| e.event_type == EventType::Energy));
    assert!(events.iter().all(|e| (0.0..=1.0).contains(&e.intensity)));
    assert_eq!(ticks.first(), Some(&20));
    assert!(ticks.iter().any(|&tick| (45..50).contains(&tick)));
    assert!(
        ticks
            .iter()
            .all(|&tick| (20..25).contains(&tick) || (45..50).contains(&tick)),
        "events outside the bursts: {:?}",
        ticks
    );
}

#[test]
fn test_frequency_mode_classifies_band_impulses() {
    let config = DetectorConfig {
        mode: DetectionMode::Frequency,
        debug_logs: false,
        ..DetectorConfig::default()
    };
    let layout = BeatDetector::new(&config, SAMPLE_RATE).unwrap();

    let mut source = ScriptedFrameSource::new(SAMPLE_RATE);
    for _ in 0..5 {
        source.push_frame(silent_frame(N));
    }
    source.push_frame(band_impulse_frame(layout.mapper(), N, &[1, 2, 3], 0.5));
    for _ in 0..5 {
        source.push_frame(silent_frame(N));
    }
    source.push_frame(band_impulse_frame(layout.mapper(), N, &[25, 26], 0.5));

    let mut detection = BeatDetection::new(
        config,
        Some(Box::new(source)),
        Box::new(StubTimeSource::with_step(0.1)),
    );
    let events = collect_events(&detection);
    while let TickOutcome::Processed { .. } = detection.update() {}

    let types: Vec<EventType> = events.borrow().iter().map(|e| e.event_type).collect();
    assert_eq!(types, vec![EventType::Kick, EventType::HitHat]);
}

#[test]
fn test_independent_instances_share_nothing() {
    let config = DetectorConfig {
        mode: DetectionMode::Energy,
        debug_logs: false,
        ..DetectorConfig::default()
    };

    let loud = ScriptedFrameSource::with_frames(SAMPLE_RATE, [constant_energy_frame(N, 30.0)]);
    let quiet = ScriptedFrameSource::with_frames(SAMPLE_RATE, [silent_frame(N)]);

    let mut a = BeatDetection::new(
        config.clone(),
        Some(Box::new(loud)),
        Box::new(StubTimeSource::new()),
    );
    let mut b = BeatDetection::new(
        config,
        Some(Box::new(quiet)),
        Box::new(StubTimeSource::new()),
    );
    let a_events = collect_events(&a);
    let b_events = collect_events(&b);

    a.update();
    b.update();

    assert_eq!(a_events.borrow().len(), 1);
    assert!(b_events.borrow().is_empty());
    assert_eq!(a.stats().unwrap().energy.mean, a.stats().unwrap().energy.last);
    assert_eq!(b.stats().unwrap().energy.mean, 0.0);
}

#[test]
fn test_missing_source_reports_error_code() {
    let mut detection = BeatDetection::new(
        DetectorConfig::default(),
        None,
        Box::new(StubTimeSource::new()),
    );
    let err = detection.startup_error().unwrap();
    assert_eq!(err.code(), DetectorErrorCodes::SOURCE_MISSING);
    assert_eq!(detection.update(), TickOutcome::Disabled);
}

#[test]
fn test_config_file_drives_detection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat_detection.json");
    std::fs::write(
        &path,
        r#"{ "mode": "energy", "num_samples": 512, "source_id": "deck-b", "debug_logs": false }"#,
    )
    .unwrap();
    let config = DetectorConfig::load_from_file(&path);
    assert_eq!(config.num_samples, 512);

    let source = ScriptedFrameSource::with_frames(SAMPLE_RATE, [constant_energy_frame(512, 12.0)]);
    let mut detection = BeatDetection::new(
        config,
        Some(Box::new(source)),
        Box::new(StubTimeSource::new()),
    );
    let events = collect_events(&detection);
    detection.update();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].source_id, "deck-b");
}
