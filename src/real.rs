//! Sample precision
//!
//! The detector is written once over `T: Real` and instantiated for `f32` and `f64`.

use core::fmt;

use rustfft::num_complex::Complex;
use rustfft::num_traits::{Float, FloatConst, NumAssign};
use rustfft::FftNum;

/// Scalar type a detector can run at
pub trait Real: FftNum + Float + FloatConst + NumAssign + Default + fmt::Display {}

impl<T> Real for T where T: FftNum + Float + FloatConst + NumAssign + Default + fmt::Display {}

/// Convert an `f64` constant into `T`
#[inline]
pub(crate) fn lit<T: Real>(x: f64) -> T {
    T::from_f64(x).unwrap_or_else(T::zero)
}

/// Convert a count into `T`
#[inline]
pub(crate) fn count<T: Real>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::zero)
}

/// Widen `T` to `f64` for error reporting
#[inline]
pub(crate) fn widen<T: Real>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// `exp(j*theta)`
#[inline]
pub(crate) fn expj<T: Real>(theta: T) -> Complex<T> {
    Complex::new(theta.cos(), theta.sin())
}

/// Wrap a phase into (-pi, pi]
pub(crate) fn wrap_phase<T: Real>(mut theta: T) -> T {
    let two_pi = T::PI() + T::PI();
    while theta > T::PI() {
        theta -= two_pi;
    }
    while theta <= -T::PI() {
        theta += two_pi;
    }
    theta
}
