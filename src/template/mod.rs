//! Reference templates
//!
//! A template is the known waveform the detector searches for: its time-domain
//! samples, its zero-padded spectrum and its energy. It is built once and never
//! changes afterwards.
//!
//! **Generators**:
//! - Raw samples
//! - Linearly modulated symbols through a pulse-shaping interpolator
//! - GMSK-modulated bits
//! - CPFSK-modulated symbols
//!
//! Every modulated generator appends `2m` zero symbols so the filter tail is
//! part of the template; the template length is then `k * (n + 2m)`.

pub mod cpfsk;
pub mod interp;
pub mod pulse;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use snafu::ensure;
use tracing::{debug, instrument};

pub use cpfsk::{CpfskModulator, CpfskPulse};
pub use interp::Interpolator;
pub use pulse::PulseShape;

use crate::error::{
    EmptySequenceSnafu, ExcessBandwidthSnafu, FilterDelaySnafu, Result, SamplesPerSymbolSnafu,
    ZeroEnergySnafu,
};
use crate::real::{lit, widen, Real};

/// Check the shaping parameters shared by every modulated generator
pub(crate) fn validate_shaping(k: usize, m: usize, beta: f64) -> Result<()> {
    ensure!((2..=80).contains(&k), SamplesPerSymbolSnafu { value: k });
    ensure!((1..=100).contains(&m), FilterDelaySnafu { value: m });
    ensure!((0.0..=1.0).contains(&beta), ExcessBandwidthSnafu { value: beta });
    Ok(())
}

/// Smallest power of two at least twice the template length
pub fn fft_size(s_len: usize) -> usize {
    (2 * s_len).next_power_of_two().max(2)
}

/// Immutable reference waveform with its spectrum and energy
#[derive(Debug, Clone)]
pub struct ReferenceTemplate<T: Real> {
    sequence: Vec<Complex<T>>,
    spectrum: Vec<Complex<T>>,
    energy: T,
    nfft: usize,
}

impl<T: Real> ReferenceTemplate<T> {
    /// Use the given samples verbatim
    pub fn from_samples(sequence: &[Complex<T>]) -> Result<Self> {
        Self::build(sequence.to_vec())
    }

    /// Pulse-shape linearly modulated symbols
    ///
    /// # Arguments
    /// * `symbols` - Complex symbols (e.g. QPSK)
    /// * `shape` - Prototype filter
    /// * `k` - Samples per symbol, in [2, 80]
    /// * `m` - Filter delay in symbols, in [1, 100]
    /// * `beta` - Excess bandwidth factor, in [0, 1]
    #[instrument(level = "debug", skip(symbols), fields(symbols = symbols.len()))]
    pub fn linear(
        symbols: &[Complex<T>],
        shape: PulseShape,
        k: usize,
        m: usize,
        beta: T,
    ) -> Result<Self> {
        ensure!(!symbols.is_empty(), EmptySequenceSnafu);
        let beta = widen(beta);
        validate_shaping(k, m, beta)?;

        let prototype: Vec<T> = shape.design(k, m, beta, 0.0).into_iter().map(lit).collect();
        let mut interp: Interpolator<T, Complex<T>> = Interpolator::new(k, &prototype);

        let mut padded = symbols.to_vec();
        padded.resize(symbols.len() + 2 * m, Complex::new(T::zero(), T::zero()));

        Self::build(interp.execute_block(&padded))
    }

    /// GMSK-modulate a bit sequence
    ///
    /// # Arguments
    /// * `bits` - One bit per byte (0 or 1)
    /// * `k` - Samples per symbol, in [2, 80]
    /// * `m` - Filter delay in symbols, in [1, 100]
    /// * `bt` - Bandwidth-time product, in (0, 1]
    #[instrument(level = "debug", skip(bits), fields(bits = bits.len()))]
    pub fn gmsk(bits: &[u8], k: usize, m: usize, bt: T) -> Result<Self> {
        ensure!(!bits.is_empty(), EmptySequenceSnafu);
        let mut modem = CpfskModulator::gmsk(k, m, bt)?;
        Self::modulate(&mut modem, bits, m)
    }

    /// CPFSK-modulate a symbol sequence
    ///
    /// # Arguments
    /// * `symbols` - One symbol per byte, each below `2^bits_per_symbol`
    /// * `bits_per_symbol` - In [1, 8]
    /// * `h` - Modulation index
    /// * `k` - Samples per symbol, in [2, 80]
    /// * `m` - Filter delay in symbols, in [1, 100]
    /// * `beta` - Pulse bandwidth parameter, in [0, 1]
    /// * `pulse` - Frequency pulse
    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", skip(symbols), fields(symbols = symbols.len()))]
    pub fn cpfsk(
        symbols: &[u8],
        bits_per_symbol: usize,
        h: T,
        k: usize,
        m: usize,
        beta: T,
        pulse: CpfskPulse,
    ) -> Result<Self> {
        ensure!(!symbols.is_empty(), EmptySequenceSnafu);
        let mut modem = CpfskModulator::new(bits_per_symbol, h, k, m, beta, pulse)?;
        Self::modulate(&mut modem, symbols, m)
    }

    fn modulate(modem: &mut CpfskModulator<T>, symbols: &[u8], m: usize) -> Result<Self> {
        let mut padded = symbols.to_vec();
        padded.resize(symbols.len() + 2 * m, 0);
        Self::build(modem.modulate_block(&padded)?)
    }

    fn build(sequence: Vec<Complex<T>>) -> Result<Self> {
        ensure!(!sequence.is_empty(), EmptySequenceSnafu);

        let energy = sequence
            .iter()
            .fold(T::zero(), |acc, x| acc + x.norm_sqr());
        ensure!(energy > T::zero(), ZeroEnergySnafu);

        let nfft = fft_size(sequence.len());
        let mut spectrum = sequence.clone();
        spectrum.resize(nfft, Complex::new(T::zero(), T::zero()));
        FftPlanner::new().plan_fft_forward(nfft).process(&mut spectrum);

        debug!(s_len = sequence.len(), nfft, energy = %energy, "reference template");

        Ok(Self {
            sequence,
            spectrum,
            energy,
            nfft,
        })
    }

    /// Time-domain samples
    pub fn sequence(&self) -> &[Complex<T>] {
        &self.sequence
    }

    /// Zero-padded forward transform of the sequence, `nfft` bins
    pub fn spectrum(&self) -> &[Complex<T>] {
        &self.spectrum
    }

    /// Sum of squared magnitudes
    pub fn energy(&self) -> T {
        self.energy
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn nfft(&self) -> usize {
        self.nfft
    }
}
