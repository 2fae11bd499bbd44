pub mod channel;
pub mod config;
pub mod error;
pub mod real;
pub mod sync;
pub mod template;
pub mod trace;
pub mod tracing_init;

pub use config::DetectorConfig;
pub use error::{DetectorError, Result};
pub use real::Real;
pub use sync::{DetectorState, Estimates, FrameDetector};
pub use template::{CpfskPulse, PulseShape, ReferenceTemplate};
pub use trace::{RecordingSink, TraceEvent, TraceSink, TracingSink, WavTraceSink};

pub use rustfft::num_complex::Complex;

/// Single-precision detector
pub type FrameDetectorF32 = FrameDetector<f32>;

/// Double-precision detector
pub type FrameDetectorF64 = FrameDetector<f64>;
