//! Detection of a pulse-shaped QPSK frame
//!
//! 64 QPSK symbols at 2 samples/symbol through a root-raised-cosine filter
//! (delay 7, excess bandwidth 0.3), received with gain 1, timing offset -0.3
//! samples and carrier phase 0.5 rad, no noise.

use rustysync::tracing_init::init_test_tracing;
use rustysync::{DetectorState, FrameDetectorF32, FrameDetectorF64};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{detect, detect_all, phase_error, to_f32, Scenario};

#[test]
fn test_concrete_scenario() {
    init_test_tracing();

    let scenario = Scenario::default();
    let mut detector: FrameDetectorF64 = scenario.detector();
    assert_eq!(detector.seq_len(), 2 * (64 + 14));
    assert_eq!(detector.buf_len(), 512);

    let hits = detect(&mut detector, &scenario.stream());
    assert_eq!(hits.len(), 1, "expected exactly one detection: {:?}", hits);

    let (index, est) = hits[0];
    assert!(index < scenario.deadline(), "detected late at {}", index);
    assert!((0.95..=1.05).contains(&est.gamma), "gamma = {}", est.gamma);
    assert!((-0.35..=-0.25).contains(&est.tau), "tau = {}", est.tau);
    assert!((-0.01..=0.01).contains(&est.dphi), "dphi = {}", est.dphi);
    assert!((0.25..=0.75).contains(&est.phi), "phi = {}", est.phi);
    assert!(est.rxy > detector.threshold());
    assert!(est.refined);

    // Accessors mirror the estimates
    assert_eq!(detector.tau(), est.tau);
    assert_eq!(detector.gamma(), est.gamma);
    assert_eq!(detector.dphi(), est.dphi);
    assert_eq!(detector.phi(), est.phi);
    assert_eq!(detector.rxy(), est.rxy);
    assert_eq!(detector.state(), DetectorState::Seek);
}

#[test]
fn test_concrete_scenario_single_precision() {
    let scenario = Scenario::default();
    let mut detector: FrameDetectorF32 = scenario.detector_f32();

    let hits = detect(&mut detector, &to_f32(&scenario.stream()));
    assert_eq!(hits.len(), 1);

    let (index, est) = hits[0];
    assert!(index < scenario.deadline());
    assert!((est.gamma - 1.0).abs() < 0.05, "gamma = {}", est.gamma);
    assert!((est.tau + 0.3).abs() < 0.05, "tau = {}", est.tau);
    assert!(est.dphi.abs() < 0.01, "dphi = {}", est.dphi);
    assert!(phase_error(est.phi as f64, 0.5) < 0.25, "phi = {}", est.phi);
}

#[test]
fn test_aligned_buffer_starts_at_frame() {
    let scenario = Scenario {
        tau: 0.0,
        phi: 0.0,
        ..Scenario::default()
    };
    let stream = scenario.stream();
    let mut detector = scenario.detector();

    let template: Vec<_> = detector.sequence().to_vec();
    let mut aligned = None;
    for &x in &stream {
        if let Some(buf) = detector.execute(x) {
            aligned = Some(buf.to_vec());
        }
    }
    let aligned = aligned.expect("no detection");

    // Zero-lag match with the template over its whole length
    let dot: f64 = aligned
        .iter()
        .zip(&template)
        .map(|(a, s)| (a * s.conj()).re)
        .sum();
    let energy: f64 = template.iter().map(|s| s.norm_sqr()).sum();
    assert!(dot / energy > 0.95, "normalized match {}", dot / energy);
}

#[test]
fn test_execute_block_matches_execute() {
    let scenario = Scenario::default();
    let stream = scenario.stream();

    let mut by_sample = scenario.detector();
    let hits = detect(&mut by_sample, &stream);

    let mut by_block = scenario.detector();
    let mut frames = Vec::new();
    let count = by_block.execute_block(&stream, |buf, est| {
        assert_eq!(buf.len(), 512);
        frames.push(*est);
    });

    assert_eq!(count, 1);
    assert_eq!(frames, vec![hits[0].1]);
}

#[test]
fn test_repeated_frames_each_detected_once() {
    let scenario = Scenario {
        noise: 0.01,
        ..Scenario::default()
    };
    let one = scenario.stream();

    // Three frames back to back, each followed by its random tail
    let stream: Vec<_> = one.iter().chain(&one).chain(&one).copied().collect();
    let mut detector = scenario.detector();
    let frames = detect_all(&mut detector, &stream);

    assert_eq!(frames.len(), 3);
    for est in frames {
        assert!((est.tau + 0.3).abs() < 0.05, "tau = {}", est.tau);
        assert!((est.gamma - 1.0).abs() < 0.05, "gamma = {}", est.gamma);
    }
}
