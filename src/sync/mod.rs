//! Frame acquisition
//!
//! Finds a known template in a continuous complex baseband stream and reports
//! its timing offset, gain, carrier frequency offset and carrier phase.
//!
//! **Search Strategy**:
//! - Coarse: FFT matched filter over every half window, all carrier
//!   hypotheses within the configured range (integer bins, integer lags)
//! - Fine: quadratic interpolation of the correlation peak (fractional lag,
//!   gain) and of the carrier spectrum (fractional bin), then coherent phase
//!
//! **Module Organization**:
//! - `window` - Ring buffer holding the latest `nfft` samples
//! - `correlator` - FFT plans, matched filtering and peak search
//! - `fine` - Fine estimator
//! - `detector` - Seek/align state machine

mod correlator;
mod detector;
pub mod fine;
pub mod window;

pub(crate) use correlator::BlockCorrelator;
pub use correlator::CorrelationPeak;
pub use detector::{DetectorState, FrameDetector};
pub use fine::{quadratic_peak, Estimates, QuadraticPeak};
pub use window::SlidingWindow;
