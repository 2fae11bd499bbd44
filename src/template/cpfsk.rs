//! Continuous-phase frequency-shift keying modulator
//!
//! Each symbol `s` of an `M`-ary alphabet maps to the frequency level
//! `v = 2s - M + 1`. The level is shaped by a frequency pulse of unit area,
//! scaled by `pi * h`, and integrated into a phase that is never reset between
//! symbols, so the output envelope is constant.
//!
//! **Pulses**:
//! - Square: full-response, one symbol long
//! - Raised-cosine (full): `1 - cos`, one symbol long
//! - Raised-cosine (partial): `1 - cos` over two symbols, delayed by half a symbol
//! - Gaussian: GMSK pulse over `2m + 1` symbols, delayed by half a symbol

use rustfft::num_complex::Complex;
use snafu::ensure;
use tracing::trace;

use super::interp::Interpolator;
use super::pulse;
use super::validate_shaping;
use crate::error::{
    BandwidthTimeSnafu, BitsPerSymbolSnafu, ModulationIndexSnafu, Result, SymbolOutOfRangeSnafu,
    ZeroEnergySnafu,
};
use crate::real::{expj, lit, widen, Real};

/// Frequency pulse used by the CPFSK modulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpfskPulse {
    Square,
    RaisedCosineFull,
    RaisedCosinePartial,
    Gaussian,
}

impl CpfskPulse {
    /// Frequency pulse taps, normalized to unit area
    fn design(self, k: usize, m: usize, beta: f64) -> Vec<f64> {
        use core::f64::consts::PI;

        let mut h = match self {
            CpfskPulse::Square => vec![1.0; k],
            CpfskPulse::RaisedCosineFull => (0..k)
                .map(|i| 1.0 - (2.0 * PI * i as f64 / k as f64).cos())
                .collect(),
            CpfskPulse::RaisedCosinePartial => {
                let mut h = vec![0.0; 3 * k];
                for i in 0..2 * k {
                    h[i + k / 2] = 1.0 - (2.0 * PI * i as f64 / (2 * k) as f64).cos();
                }
                h
            }
            CpfskPulse::Gaussian => {
                let mut h = vec![0.0; 2 * k * m + k + 1];
                for (i, v) in pulse::gaussian(k, m, beta, 0.0).into_iter().enumerate() {
                    h[i + k / 2] = v;
                }
                h
            }
        };

        let area: f64 = h.iter().sum();
        if area > 0.0 {
            for v in h.iter_mut() {
                *v /= area;
            }
        }
        h
    }
}

/// Phase-continuous frequency modulator
#[derive(Debug, Clone)]
pub struct CpfskModulator<T: Real> {
    bits_per_symbol: usize,
    k: usize,
    interp: Interpolator<T, T>,
    phase_increments: Vec<T>,
    theta: T,
}

impl<T: Real> CpfskModulator<T> {
    /// Create a modulator
    ///
    /// # Arguments
    /// * `bits_per_symbol` - Bits per symbol, in [1, 8]
    /// * `h` - Modulation index, greater than zero
    /// * `k` - Samples per symbol, in [2, 80]
    /// * `m` - Filter delay in symbols, in [1, 100]
    /// * `beta` - Pulse bandwidth parameter, in [0, 1] (bandwidth-time product for Gaussian)
    /// * `pulse` - Frequency pulse
    pub fn new(
        bits_per_symbol: usize,
        h: T,
        k: usize,
        m: usize,
        beta: T,
        pulse: CpfskPulse,
    ) -> Result<Self> {
        ensure!(
            (1..=8).contains(&bits_per_symbol),
            BitsPerSymbolSnafu { value: bits_per_symbol }
        );
        ensure!(h > T::zero(), ModulationIndexSnafu { value: widen(h) });
        validate_shaping(k, m, widen(beta))?;
        if pulse == CpfskPulse::Gaussian {
            ensure!(beta > T::zero(), BandwidthTimeSnafu { value: widen(beta) });
        }

        let scale = T::PI() * h;
        let taps: Vec<T> = pulse
            .design(k, m, widen(beta))
            .into_iter()
            .map(|v| lit::<T>(v) * scale)
            .collect();
        ensure!(taps.iter().any(|v| *v != T::zero()), ZeroEnergySnafu);

        trace!(bits_per_symbol, k, m, ?pulse, taps = taps.len(), "cpfsk modulator");

        Ok(Self {
            bits_per_symbol,
            k,
            interp: Interpolator::new(k, &taps),
            phase_increments: vec![T::zero(); k],
            theta: T::zero(),
        })
    }

    /// GMSK: binary CPFSK with modulation index 1/2 and a Gaussian pulse
    pub fn gmsk(k: usize, m: usize, bt: T) -> Result<Self> {
        Self::new(1, lit(0.5), k, m, bt, CpfskPulse::Gaussian)
    }

    pub fn alphabet_size(&self) -> usize {
        1 << self.bits_per_symbol
    }

    /// Modulate a symbol block, continuing the phase of earlier blocks
    ///
    /// Every symbol is checked against the alphabet before any state changes.
    pub fn modulate_block(&mut self, symbols: &[u8]) -> Result<Vec<Complex<T>>> {
        let size = self.alphabet_size();
        if let Some((index, &value)) = symbols
            .iter()
            .enumerate()
            .find(|&(_, &s)| s as usize >= size)
        {
            return SymbolOutOfRangeSnafu { index, value, size }.fail();
        }

        let mut out = vec![Complex::new(T::zero(), T::zero()); symbols.len() * self.k];
        for (&symbol, chunk) in symbols.iter().zip(out.chunks_mut(self.k)) {
            self.push_symbol(symbol, size, chunk);
        }
        Ok(out)
    }

    /// Advance the phase by one in-range symbol, writing `k` samples
    fn push_symbol(&mut self, symbol: u8, size: usize, out: &mut [Complex<T>]) {
        let level = lit::<T>(2.0 * symbol as f64 + 1.0 - size as f64);
        self.interp.execute(level, &mut self.phase_increments);

        for (y, dtheta) in out.iter_mut().zip(self.phase_increments.iter()) {
            self.theta += *dtheta;
            *y = expj(self.theta);
        }
    }
}
