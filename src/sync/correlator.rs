//! Frequency-domain matched filter
//!
//! One forward transform of the window, then for every carrier hypothesis `b`
//! the product `X[i] * conj(S[i - b])` is inverse transformed. Shifting the
//! template spectrum by `b` bins is the same as correlating against the template
//! mixed up by `2*pi*b/nfft` radians/sample, so the search covers carrier offset
//! and time lag together.
//!
//! The inverse transform is not normalized: a perfectly matched window of gain
//! `g` gives a peak of `nfft * g * energy`.

use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::real::Real;

/// Strongest correlation found by a search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationPeak<T> {
    /// Normalized magnitude of the peak
    pub rxy: T,
    /// Time lag within the window
    pub index: usize,
    /// Carrier hypothesis, in FFT bins
    pub offset: isize,
}

/// Owns the transform plans and work buffers for one window size
///
/// Plans are immutable once built, so clones share them. Windows, template
/// spectra and buffers handed in are always `nfft` samples long.
#[derive(Clone)]
pub(crate) struct BlockCorrelator<T: Real> {
    nfft: usize,
    fft: Arc<dyn Fft<T>>,
    ifft: Arc<dyn Fft<T>>,
    scratch: Vec<Complex<T>>,
    /// Spectrum of the loaded window
    freq: Vec<Complex<T>>,
    /// Correlation output of the last hypothesis
    corr: Vec<Complex<T>>,
}

impl<T: Real> BlockCorrelator<T> {
    pub fn new(nfft: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(nfft);
        let ifft = planner.plan_fft_inverse(nfft);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());
        let zero = Complex::new(T::zero(), T::zero());

        Self {
            nfft,
            fft,
            ifft,
            scratch: vec![zero; scratch_len],
            freq: vec![zero; nfft],
            corr: vec![zero; nfft],
        }
    }

    pub fn nfft(&self) -> usize {
        self.nfft
    }

    /// Transform a full window; later correlations run against it
    pub fn load(&mut self, window: &[Complex<T>]) {
        self.freq.copy_from_slice(&window[..self.nfft]);
        self.fft.process_with_scratch(&mut self.freq, &mut self.scratch);
    }

    /// Forward transform of an arbitrary `nfft`-length buffer, in place
    pub fn forward(&mut self, buf: &mut [Complex<T>]) {
        self.fft.process_with_scratch(&mut buf[..self.nfft], &mut self.scratch);
    }

    /// Cross-correlation of the loaded window with `template` shifted by `offset` bins
    pub fn correlate(&mut self, template: &[Complex<T>], offset: isize) -> &[Complex<T>] {
        let n = self.nfft;
        let shift = offset.rem_euclid(n as isize) as usize;

        for (i, r) in self.corr.iter_mut().enumerate() {
            *r = self.freq[i] * template[(i + n - shift) % n].conj();
        }
        self.ifft.process_with_scratch(&mut self.corr, &mut self.scratch);
        &self.corr
    }

    /// Scan carrier hypotheses `-range..=range` for the largest `|R| * g`
    ///
    /// Ties keep the earliest hypothesis and lag.
    pub fn search(&mut self, template: &[Complex<T>], range: usize, g: T) -> CorrelationPeak<T> {
        let range = range as isize;
        let mut best = CorrelationPeak {
            rxy: T::zero(),
            index: 0,
            offset: 0,
        };

        for offset in -range..=range {
            let corr = self.correlate(template, offset);
            for (index, r) in corr.iter().enumerate() {
                let rxy = r.norm() * g;
                if rxy > best.rxy {
                    best = CorrelationPeak { rxy, index, offset };
                }
            }
        }
        best
    }
}

impl<T: Real> fmt::Debug for BlockCorrelator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockCorrelator")
            .field("nfft", &self.nfft)
            .finish_non_exhaustive()
    }
}
