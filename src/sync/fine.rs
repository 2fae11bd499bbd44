//! Fine synchronization
//!
//! Runs once per detection on a window whose first sample is the start of the
//! template. Produces the sub-sample timing offset, channel gain, carrier
//! frequency offset and carrier phase.
//!
//! **Algorithm**:
//! 1. Correlate at the detected carrier bin; fit a parabola through the square
//!    roots of `|R|` at lags -1, 0, +1 for timing and gain
//! 2. Multiply the window by the conjugate template, transform, and fit a
//!    parabola across the strongest bin for carrier frequency
//! 3. De-rotate the template-matched product by the frequency estimate and
//!    take the argument of its sum for carrier phase

use rustfft::num_complex::Complex;
use rustfft::num_traits::Float;
use tracing::debug;

use super::correlator::BlockCorrelator;
use crate::real::{count, expj, wrap_phase, Real};
use crate::template::ReferenceTemplate;

/// Estimates reported with each detected frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Estimates<T> {
    /// Normalized correlation peak from the coarse search
    pub rxy: T,
    /// Fractional timing offset, samples
    pub tau: T,
    /// Channel gain
    pub gamma: T,
    /// Carrier frequency offset, radians/sample
    pub dphi: T,
    /// Carrier phase offset, radians
    pub phi: T,
    /// False when a quadratic fit was degenerate and the integer estimate was kept
    pub refined: bool,
}

/// Vertex of a parabola sampled at -1, 0 and +1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticPeak<T> {
    pub offset: T,
    pub value: T,
}

/// Fit `a*x^2 + b*x + c` through `(-1, yneg)`, `(0, y0)`, `(1, ypos)`
///
/// Returns `None` unless the parabola opens downward and its vertex lies in
/// `[-1, 1]`. Flat and saturated peaks fall in that case.
pub fn quadratic_peak<T: Real>(yneg: T, y0: T, ypos: T) -> Option<QuadraticPeak<T>> {
    let half = T::one() / (T::one() + T::one());
    let a = half * (ypos + yneg) - y0;
    let b = half * (ypos - yneg);

    let scale = Float::abs(yneg) + Float::abs(y0) + Float::abs(ypos);
    let eps = T::epsilon() * (scale + T::one()) * (T::one() + T::one()).powi(4);
    if !(a < -eps) {
        return None;
    }

    let offset = -b / (a + a);
    if !(Float::abs(offset) <= T::one()) {
        return None;
    }

    Some(QuadraticPeak {
        offset,
        value: a * offset * offset + b * offset + y0,
    })
}

/// Estimate timing, gain, carrier frequency and carrier phase
///
/// `window` holds `nfft` samples starting at the template; `product` is `nfft`
/// samples of scratch.
pub(crate) fn estimate<T: Real>(
    correlator: &mut BlockCorrelator<T>,
    template: &ReferenceTemplate<T>,
    window: &[Complex<T>],
    offset: isize,
    rxy: T,
    product: &mut [Complex<T>],
) -> Estimates<T> {
    let nfft = correlator.nfft();
    let s_len = template.len();
    let energy = template.energy();

    // Timing and gain
    correlator.load(window);
    let corr = correlator.correlate(template.spectrum(), offset);
    let yneg = corr[nfft - 1].norm().sqrt();
    let y0 = corr[0].norm().sqrt();
    let ypos = corr[1].norm().sqrt();

    let timing = quadratic_peak(yneg, y0, ypos);
    let (tau, ghat) = match timing {
        Some(p) => (p.offset, p.value),
        None => {
            debug!(yneg = %yneg, y0 = %y0, ypos = %ypos, "degenerate timing peak");
            (T::zero(), y0)
        }
    };
    let gamma = ghat * ghat / (count::<T>(nfft) * energy);

    // Carrier frequency
    let zero = Complex::new(T::zero(), T::zero());
    for (i, p) in product.iter_mut().enumerate().take(nfft) {
        *p = if i < s_len {
            window[i] * template.sequence()[i].conj()
        } else {
            zero
        };
    }
    correlator.forward(product);

    let mut i0 = 0;
    let mut vmax = T::zero();
    for (i, v) in product.iter().take(nfft).enumerate() {
        let v = v.norm();
        if v > vmax {
            vmax = v;
            i0 = i;
        }
    }
    let vneg = product[(i0 + nfft - 1) % nfft].norm();
    let vpos = product[(i0 + 1) % nfft].norm();

    let spectral = quadratic_peak(vneg, vmax, vpos);
    let idx = match spectral {
        Some(p) => p.offset,
        None => {
            debug!(bin = i0, "degenerate carrier peak");
            T::zero()
        }
    };
    let bin = if i0 > nfft / 2 {
        count::<T>(i0) + idx - count::<T>(nfft)
    } else {
        count::<T>(i0) + idx
    };
    let dphi = wrap_phase(T::PI() * (T::one() + T::one()) * bin / count::<T>(nfft));

    // Carrier phase
    let mut acc = zero;
    for (i, (w, s)) in window.iter().zip(template.sequence()).enumerate() {
        acc += *w * s.conj() * expj(-dphi * count::<T>(i));
    }
    let phi = acc.arg();

    Estimates {
        rxy,
        tau,
        gamma,
        dphi,
        phi,
        refined: timing.is_some() && spectral.is_some(),
    }
}
