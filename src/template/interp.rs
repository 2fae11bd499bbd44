//! Polyphase interpolator
//!
//! Produces `k` output samples per input symbol from a real prototype filter.

use std::collections::VecDeque;
use std::ops::{Add, Mul};

use rustfft::num_traits::Zero;

use crate::real::Real;

/// Interpolating FIR filter split into `k` sub-filters
///
/// Output sample `i` of each symbol is `sum_j h[i + j*k] * x[n - j]`.
#[derive(Debug, Clone)]
pub struct Interpolator<T: Real, S> {
    k: usize,
    taps: Vec<T>,
    history: VecDeque<S>,
}

impl<T, S> Interpolator<T, S>
where
    T: Real,
    S: Copy + Zero + Add<Output = S> + Mul<T, Output = S>,
{
    /// Create an interpolator; the prototype is zero-padded to a multiple of `k`
    pub fn new(k: usize, prototype: &[T]) -> Self {
        let k = k.max(1);
        let sub_len = prototype.len().div_ceil(k).max(1);

        let mut taps = prototype.to_vec();
        taps.resize(sub_len * k, T::zero());

        Self {
            k,
            taps,
            history: VecDeque::from(vec![S::zero(); sub_len]),
        }
    }

    /// Push one symbol and write `k` output samples into `out`
    pub fn execute(&mut self, symbol: S, out: &mut [S]) {
        self.history.pop_back();
        self.history.push_front(symbol);

        for (i, y) in out.iter_mut().take(self.k).enumerate() {
            *y = self
                .history
                .iter()
                .enumerate()
                .fold(S::zero(), |acc, (j, &x)| acc + x * self.taps[i + j * self.k]);
        }
    }

    /// Interpolate a whole symbol block
    pub fn execute_block(&mut self, symbols: &[S]) -> Vec<S> {
        let mut out = vec![S::zero(); symbols.len() * self.k];
        for (symbol, chunk) in symbols.iter().zip(out.chunks_mut(self.k)) {
            self.execute(*symbol, chunk);
        }
        out
    }
}
