//! Detection with GMSK, CPFSK and raw-sample templates

use rustysync::channel::{qpsk_symbols, random_bits, ChannelModel};
use rustysync::{Complex, CpfskPulse, FrameDetector, FrameDetectorF32, PulseShape};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{detect, phase_error, to_f32};

/// Silence, the template, silence; then gain, carrier and light noise
fn embed(template: &[Complex<f64>], lead: usize, gamma: f64, dphi: f64, phi: f64) -> Vec<Complex<f64>> {
    let zero = Complex::new(0.0, 0.0);
    let mut x = vec![zero; lead];
    x.extend_from_slice(template);
    x.extend(vec![zero; 3 * template.len()]);

    ChannelModel::new(17)
        .with_gain(gamma)
        .with_carrier(dphi, phi)
        .with_noise(0.01)
        .apply(&x)
}

fn check(detector: &mut FrameDetector<f64>, lead: usize, gamma: f64, dphi: f64, phi: f64) {
    let stream = embed(&detector.sequence().to_vec(), lead, gamma, dphi, phi);
    let hits = detect(detector, &stream);
    assert_eq!(hits.len(), 1, "{:?}", hits);

    let est = hits[0].1;
    assert!(est.tau.abs() < 0.05, "tau = {}", est.tau);
    assert!((est.gamma - gamma).abs() < 0.05 * gamma, "gamma = {}", est.gamma);
    assert!((est.dphi - dphi).abs() < 0.01, "dphi = {}", est.dphi);

    // Phase is measured at the first template sample
    let expected_phi = dphi * lead as f64 + phi;
    assert!(phase_error(est.phi, expected_phi) < 0.25, "phi = {}", est.phi);
}

#[test]
fn test_gmsk_template() {
    let bits = random_bits(64, 21);
    let mut detector = FrameDetector::<f64>::gmsk(&bits, 2, 3, 0.3).unwrap();
    assert_eq!(detector.seq_len(), 2 * (64 + 6));
    check(&mut detector, 437, 0.7, 0.005, 0.7);
}

#[test]
fn test_cpfsk_template() {
    let bits = random_bits(96, 22);
    let symbols: Vec<u8> = bits.chunks(2).map(|b| 2 * b[0] + b[1]).collect();
    let mut detector = FrameDetector::<f64>::cpfsk(
        &symbols,
        2,
        0.5,
        4,
        3,
        0.5,
        CpfskPulse::RaisedCosineFull,
    )
    .unwrap();
    assert_eq!(detector.seq_len(), 4 * (48 + 6));
    check(&mut detector, 251, 1.3, -0.003, -0.4);
}

#[test]
fn test_raised_cosine_template() {
    let symbols = qpsk_symbols(40, 23);
    let mut detector =
        FrameDetector::<f64>::linear(&symbols, PulseShape::RaisedCosine, 4, 4, 0.5).unwrap();
    check(&mut detector, 300, 2.0, 0.0, 1.0);
}

#[test]
fn test_raw_samples_single_precision() {
    // Polyphase sequence with a sharp autocorrelation
    let n = 101;
    let sequence: Vec<Complex<f64>> = (0..n)
        .map(|i| {
            let theta = -std::f64::consts::PI * 7.0 * (i * (i + 1)) as f64 / n as f64;
            Complex::new(theta.cos(), theta.sin())
        })
        .collect();

    let stream = to_f32(&embed(&sequence, 333, 0.9, 0.008, 2.0));
    let mut detector = FrameDetectorF32::from_samples(&to_f32(&sequence)).unwrap();
    assert_eq!(detector.buf_len(), 256);

    let hits = detect(&mut detector, &stream);
    assert_eq!(hits.len(), 1);

    let est = hits[0].1;
    assert!(est.tau.abs() < 0.05, "tau = {}", est.tau);
    assert!((est.gamma - 0.9).abs() < 0.05, "gamma = {}", est.gamma);
    assert!((est.dphi - 0.008).abs() < 0.01, "dphi = {}", est.dphi);
    assert!(phase_error(est.phi as f64, 0.008 * 333.0 + 2.0) < 0.25, "phi = {}", est.phi);
}
