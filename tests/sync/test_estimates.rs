//! Estimate recovery over a grid of channel impairments

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::{detect, phase_error, Scenario};

#[test]
fn test_estimate_grid() {
    let mut failures = Vec::new();

    for &tau in &[-0.3, 0.0, 0.3] {
        for &dphi in &[-0.01, 0.0, 0.01] {
            for &phi in &[0.0, 0.5, 1.5] {
                let scenario = Scenario {
                    tau,
                    dphi,
                    phi,
                    noise: 0.01,
                    seed: 11,
                    ..Scenario::default()
                };
                let mut detector = scenario.detector();
                let hits = detect(&mut detector, &scenario.stream());

                if hits.len() != 1 {
                    failures.push(format!("{:?}: {} detections", (tau, dphi, phi), hits.len()));
                    continue;
                }
                let (index, est) = hits[0];
                let ok = index < scenario.deadline()
                    && (est.tau - tau).abs() < 0.05
                    && (est.gamma - 1.0).abs() < 0.05
                    && (est.dphi - dphi).abs() < 0.01
                    && phase_error(est.phi, phi) < 0.25;
                if !ok {
                    failures.push(format!("{:?}: {:?} at {}", (tau, dphi, phi), est, index));
                }
            }
        }
    }

    assert!(failures.is_empty(), "{:#?}", failures);
}

#[test]
fn test_gain_recovery() {
    for &gamma in &[0.1, 0.5, 3.0, 20.0] {
        let scenario = Scenario {
            gamma,
            noise: 0.001,
            ..Scenario::default()
        };
        let mut detector = scenario.detector();
        let hits = detect(&mut detector, &scenario.stream());
        assert_eq!(hits.len(), 1, "gamma = {}", gamma);

        let est = hits[0].1;
        assert!(
            (est.gamma / gamma - 1.0).abs() < 0.05,
            "gamma = {}, estimated {}",
            gamma,
            est.gamma
        );
        assert!((est.tau + 0.3).abs() < 0.05);
    }
}

#[test]
fn test_frame_after_silence() {
    // Leading silence exercises the zero-energy path before the first search
    let scenario = Scenario {
        gamma: 0.5,
        noise: 0.0,
        ..Scenario::default()
    };
    let mut stream = vec![rustysync::Complex::new(0.0, 0.0); 300];
    stream.extend(scenario.stream());

    let mut detector = scenario.detector();
    let hits = detect(&mut detector, &stream);
    assert_eq!(hits.len(), 1);

    let est = hits[0].1;
    assert!((est.gamma - 0.5).abs() < 0.05 * 0.5 + 0.01);
    assert!((est.tau + 0.3).abs() < 0.05);
    assert!(phase_error(est.phi, 0.5) < 0.25);
}
