//! Pulse-shaping filter designs
//!
//! All prototypes span `2*k*m + 1` taps, are centred on tap `k*m` and accept a
//! fractional sample delay `dt` that shifts the pulse later in time.
//!
//! **Shapes**:
//! - Root-raised-cosine: matched-filter pair for linear modulation
//! - Raised-cosine: Nyquist pulse (zero crossings at every symbol)
//! - Gaussian: frequency pulse of GMSK, parameterized by bandwidth-time product

use core::f64::consts::PI;

/// Prototype filter used to shape linearly modulated symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseShape {
    RootRaisedCosine,
    RaisedCosine,
    /// Gaussian pulse; `beta` is taken as the bandwidth-time product
    Gaussian,
}

impl PulseShape {
    /// Design `2*k*m + 1` taps for this shape
    pub fn design(self, k: usize, m: usize, beta: f64, dt: f64) -> Vec<f64> {
        match self {
            PulseShape::RootRaisedCosine => root_raised_cosine(k, m, beta, dt),
            PulseShape::RaisedCosine => raised_cosine(k, m, beta, dt),
            PulseShape::Gaussian => gaussian(k, m, beta, dt),
        }
    }
}

/// Time of tap `i` in symbol periods, relative to the pulse centre
fn tap_time(i: usize, k: usize, m: usize, dt: f64) -> f64 {
    (i as f64 - (k * m) as f64 - dt) / k as f64
}

/// Root-raised-cosine prototype
pub fn root_raised_cosine(k: usize, m: usize, beta: f64, dt: f64) -> Vec<f64> {
    (0..2 * k * m + 1)
        .map(|i| rrc_impulse(tap_time(i, k, m, dt), beta))
        .collect()
}

fn rrc_impulse(t: f64, beta: f64) -> f64 {
    const EPS: f64 = 1e-6;

    if t.abs() < EPS {
        return 1.0 - beta + 4.0 * beta / PI;
    }

    // Removable singularity at t = +/- 1/(4 beta)
    if beta > 0.0 && ((4.0 * beta * t).abs() - 1.0).abs() < EPS {
        let arg = PI / (4.0 * beta);
        return beta / 2.0f64.sqrt()
            * ((1.0 + 2.0 / PI) * arg.sin() + (1.0 - 2.0 / PI) * arg.cos());
    }

    let num = (PI * t * (1.0 - beta)).sin() + 4.0 * beta * t * (PI * t * (1.0 + beta)).cos();
    let den = PI * t * (1.0 - (4.0 * beta * t).powi(2));
    num / den
}

/// Raised-cosine prototype
pub fn raised_cosine(k: usize, m: usize, beta: f64, dt: f64) -> Vec<f64> {
    (0..2 * k * m + 1)
        .map(|i| {
            let t = tap_time(i, k, m, dt);
            let sinc = if t.abs() < 1e-9 { 1.0 } else { (PI * t).sin() / (PI * t) };

            let den = 1.0 - (2.0 * beta * t).powi(2);
            if den.abs() < 1e-6 {
                // Limit at t = +/- 1/(2 beta)
                PI / 4.0 * sinc
            } else {
                sinc * (PI * beta * t).cos() / den
            }
        })
        .collect()
}

/// Gaussian frequency pulse at normalized time `t` (0 at symbol centre)
///
/// `pulse(t) = 0.5 * (erf(c*b*(t+0.5)) - erf(c*b*(t-0.5)))`,
/// where `c = pi * sqrt(2 / ln 2)` and `b` is the bandwidth-time product.
fn gaussian_pulse(bt: f64, t: f64) -> f64 {
    let c = PI * (2.0 / core::f64::consts::LN_2).sqrt();
    0.5 * (libm::erf(c * bt * (t + 0.5)) - libm::erf(c * bt * (t - 0.5)))
}

/// Gaussian prototype (GMSK transmit pulse)
pub fn gaussian(k: usize, m: usize, bt: f64, dt: f64) -> Vec<f64> {
    (0..2 * k * m + 1)
        .map(|i| gaussian_pulse(bt, tap_time(i, k, m, dt)))
        .collect()
}
