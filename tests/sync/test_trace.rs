//! Trace sinks attached to a running detector

use rustysync::trace::RecordedEvent;
use rustysync::{RecordingSink, TracingSink, WavTraceSink};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::Scenario;

#[test]
fn test_recording_sink_sees_search_candidate_detection() {
    let scenario = Scenario::default();
    let log = RecordingSink::<f64>::new();
    let mut detector = scenario.detector().with_trace_sink(log.clone());

    let mut output = Vec::new();
    for &x in &scenario.stream() {
        if let Some(buf) = detector.execute(x) {
            output = buf.to_vec();
        }
    }

    let events = log.events();
    let searches = events
        .iter()
        .filter(|e| matches!(e, RecordedEvent::Search { .. }))
        .count();
    assert!(searches >= 2, "{} searches", searches);

    let candidate = events
        .iter()
        .position(|e| matches!(e, RecordedEvent::Candidate { .. }))
        .expect("no candidate");
    let detection = events
        .iter()
        .position(|e| matches!(e, RecordedEvent::Detection { .. }))
        .expect("no detection");
    assert!(candidate < detection);

    // The candidate's peak is the one reported with the detection
    let RecordedEvent::Candidate { peak } = &events[candidate] else {
        unreachable!()
    };
    let RecordedEvent::Detection { estimates, buffer } = &events[detection] else {
        unreachable!()
    };
    assert_eq!(peak.rxy, estimates.rxy);
    assert!(peak.rxy > 0.5);
    assert_eq!(buffer, &output);
    assert_eq!(log.detections(), vec![*detector.estimates()]);
}

#[test]
fn test_take_trace_sink_stops_recording() {
    let scenario = Scenario::default();
    let log = RecordingSink::<f64>::new();
    let mut detector = scenario.detector().with_trace_sink(log.clone());

    assert!(detector.take_trace_sink().is_some());
    detector.execute_block(&scenario.stream(), |_, _| {});
    assert!(log.events().is_empty());
}

#[test]
fn test_tracing_sink_runs() {
    rustysync::tracing_init::init_test_tracing();

    let scenario = Scenario::default();
    let mut detector = scenario.detector().with_trace_sink(TracingSink);
    assert_eq!(detector.execute_block(&scenario.stream(), |_, _| {}), 1);
}

#[test]
fn test_wav_sink_writes_aligned_buffer() {
    let path = std::env::temp_dir().join(format!("rustysync-detector-{}.wav", std::process::id()));
    let scenario = Scenario::default();
    let mut detector = scenario.detector();
    detector.set_trace_sink(WavTraceSink::create(&path, 8000).unwrap());

    let mut frames = 0;
    detector.execute_block(&scenario.stream(), |_, _| frames += 1);
    assert_eq!(frames, 1);

    // Dropping the writer finalizes the file
    drop(detector.take_trace_sink());

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, 8000);
    assert_eq!(reader.len() as usize, 2 * detector.buf_len());

    let _ = std::fs::remove_file(&path);
}
