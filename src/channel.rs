//! Channel simulation
//!
//! Generates test waveforms and applies the impairments the detector estimates:
//! `y[n] = gamma * x[n] * exp(j*(dphi*n + phi)) + w[n]`, with `w` complex white
//! Gaussian noise. Fractional timing offsets are applied when shaping symbols,
//! by designing the pulse with a fractional delay.
//!
//! All randomness comes from seeded generators so runs are reproducible.

use rand::prelude::*;
use rand_distr::StandardNormal;
use rustfft::num_complex::Complex;

use crate::error::Result;
use crate::real::{count, expj, lit, widen, Real};
use crate::template::{validate_shaping, Interpolator, PulseShape};

/// Gain, carrier offset and additive noise
#[derive(Debug, Clone)]
pub struct ChannelModel<T: Real> {
    gamma: T,
    dphi: T,
    phi: T,
    sigma: T,
    rng: StdRng,
    n: usize,
}

impl<T: Real> ChannelModel<T> {
    /// Transparent channel; noise drawn from `seed` once enabled
    pub fn new(seed: u64) -> Self {
        Self {
            gamma: T::one(),
            dphi: T::zero(),
            phi: T::zero(),
            sigma: T::zero(),
            rng: StdRng::seed_from_u64(seed),
            n: 0,
        }
    }

    pub fn with_gain(mut self, gamma: T) -> Self {
        self.gamma = gamma;
        self
    }

    /// Carrier frequency offset (radians/sample) and phase offset (radians)
    pub fn with_carrier(mut self, dphi: T, phi: T) -> Self {
        self.dphi = dphi;
        self.phi = phi;
        self
    }

    /// Noise standard deviation per complex sample (`E|w|^2 = sigma^2`)
    pub fn with_noise(mut self, sigma: T) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn apply_sample(&mut self, x: Complex<T>) -> Complex<T> {
        let carrier = expj(self.dphi * count::<T>(self.n) + self.phi);
        self.n += 1;
        x * carrier * self.gamma + self.noise()
    }

    /// Impair a block; the carrier phase continues from the previous call
    pub fn apply(&mut self, x: &[Complex<T>]) -> Vec<Complex<T>> {
        x.iter().map(|&v| self.apply_sample(v)).collect()
    }

    /// Restart the carrier at sample 0; the noise generator keeps running
    pub fn reset(&mut self) {
        self.n = 0;
    }

    fn noise(&mut self) -> Complex<T> {
        if self.sigma == T::zero() {
            return Complex::new(T::zero(), T::zero());
        }
        let scale = self.sigma * lit(core::f64::consts::FRAC_1_SQRT_2);
        let re: f64 = self.rng.sample(StandardNormal);
        let im: f64 = self.rng.sample(StandardNormal);
        Complex::new(lit::<T>(re) * scale, lit::<T>(im) * scale)
    }
}

/// Pulse-shape `symbols` with the pulse delayed by `tau` samples
///
/// No padding is added; append `2m` symbols to flush the filter.
pub fn shaped_symbols<T: Real>(
    symbols: &[Complex<T>],
    shape: PulseShape,
    k: usize,
    m: usize,
    beta: T,
    tau: T,
) -> Result<Vec<Complex<T>>> {
    validate_shaping(k, m, widen(beta))?;
    let taps: Vec<T> = shape
        .design(k, m, widen(beta), widen(tau))
        .into_iter()
        .map(lit)
        .collect();
    let mut interp: Interpolator<T, Complex<T>> = Interpolator::new(k, &taps);
    Ok(interp.execute_block(symbols))
}

/// Complex white Gaussian noise with `E|w|^2 = sigma^2`
pub fn complex_noise<T: Real>(n: usize, sigma: T, seed: u64) -> Vec<Complex<T>> {
    let mut channel = ChannelModel::new(seed)
        .with_gain(T::zero())
        .with_noise(sigma);
    (0..n)
        .map(|_| channel.apply_sample(Complex::new(T::zero(), T::zero())))
        .collect()
}

/// Unit-energy QPSK symbols
pub fn qpsk_symbols<T: Real>(n: usize, seed: u64) -> Vec<Complex<T>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let a: T = lit(core::f64::consts::FRAC_1_SQRT_2);
    (0..n)
        .map(|_| {
            let re = if rng.random::<bool>() { a } else { -a };
            let im = if rng.random::<bool>() { a } else { -a };
            Complex::new(re, im)
        })
        .collect()
}

/// Random bits, one per byte
pub fn random_bits(n: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(0..2u8)).collect()
}
