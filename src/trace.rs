//! Detector trace sinks
//!
//! A sink is an optional capability handed to a [`FrameDetector`]. The detector
//! reports what it saw at each half-window search, on each candidate peak and on
//! each detection; the sink decides what to do with it. The detector itself
//! never touches a file.
//!
//! [`FrameDetector`]: crate::sync::FrameDetector

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use hound::{SampleFormat, WavSpec, WavWriter};
use rustfft::num_complex::Complex;
use snafu::{ResultExt, Snafu};
use tracing::{trace, warn};

use crate::real::{widen, Real};
use crate::sync::{CorrelationPeak, Estimates};

/// One observation from the detector
#[derive(Debug, Clone, Copy)]
pub enum TraceEvent<'a, T> {
    /// Result of a half-window search
    Search { peak: CorrelationPeak<T>, g0: T },
    /// Peak above threshold; the detector is now aligning
    Candidate { peak: CorrelationPeak<T> },
    /// Aligned buffer and its estimates
    Detection {
        estimates: &'a Estimates<T>,
        buffer: &'a [Complex<T>],
    },
}

/// Receiver for detector observations
pub trait TraceSink<T: Real>: Send {
    fn record(&mut self, event: TraceEvent<'_, T>);
}

/// Forwards every observation to `tracing` at trace level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl<T: Real> TraceSink<T> for TracingSink {
    fn record(&mut self, event: TraceEvent<'_, T>) {
        match event {
            TraceEvent::Search { peak, g0 } => trace!(
                rxy = widen(peak.rxy),
                index = peak.index,
                offset = peak.offset,
                g0 = widen(g0),
                "search"
            ),
            TraceEvent::Candidate { peak } => trace!(
                rxy = widen(peak.rxy),
                index = peak.index,
                offset = peak.offset,
                "candidate"
            ),
            TraceEvent::Detection { estimates, buffer } => trace!(
                rxy = widen(estimates.rxy),
                tau = widen(estimates.tau),
                gamma = widen(estimates.gamma),
                dphi = widen(estimates.dphi),
                phi = widen(estimates.phi),
                refined = estimates.refined,
                len = buffer.len(),
                "detection"
            ),
        }
    }
}

/// Owned copy of a [`TraceEvent`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedEvent<T> {
    Search { peak: CorrelationPeak<T>, g0: T },
    Candidate { peak: CorrelationPeak<T> },
    Detection {
        estimates: Estimates<T>,
        buffer: Vec<Complex<T>>,
    },
}

/// In-memory log shared between clones
///
/// Keep one clone and hand the other to the detector.
#[derive(Debug, Clone)]
pub struct RecordingSink<T> {
    events: Arc<Mutex<Vec<RecordedEvent<T>>>>,
}

impl<T> Default for RecordingSink<T> {
    fn default() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Real> RecordingSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<RecordedEvent<T>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Estimates of every recorded detection, in order
    pub fn detections(&self) -> Vec<Estimates<T>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RecordedEvent::Detection { estimates, .. } => Some(estimates),
                _ => None,
            })
            .collect()
    }
}

impl<T: Real> TraceSink<T> for RecordingSink<T> {
    fn record(&mut self, event: TraceEvent<'_, T>) {
        let owned = match event {
            TraceEvent::Search { peak, g0 } => RecordedEvent::Search { peak, g0 },
            TraceEvent::Candidate { peak } => RecordedEvent::Candidate { peak },
            TraceEvent::Detection { estimates, buffer } => RecordedEvent::Detection {
                estimates: *estimates,
                buffer: buffer.to_vec(),
            },
        };
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(owned);
    }
}

#[derive(Debug, Snafu)]
pub enum TraceError {
    #[snafu(display("could not create trace file {}", path.display()))]
    Create { path: PathBuf, source: hound::Error },

    #[snafu(display("could not finalize trace file {}", path.display()))]
    Finalize { path: PathBuf, source: hound::Error },
}

/// Writes each aligned buffer to a two-channel (I, Q) 32-bit float WAV file
///
/// Buffers are appended back to back. Write failures are logged and the sink
/// stops writing; the detector keeps running.
pub struct WavTraceSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavTraceSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self, TraceError> {
        let path = path.as_ref().to_path_buf();
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(&path, spec).context(CreateSnafu { path: path.clone() })?;
        Ok(Self {
            path,
            writer: Some(writer),
        })
    }

    /// Flush and close the file
    pub fn finalize(mut self) -> Result<(), TraceError> {
        match self.writer.take() {
            Some(writer) => writer.finalize().context(FinalizeSnafu { path: self.path }),
            None => Ok(()),
        }
    }

    fn write_buffer<T: Real>(&mut self, buffer: &[Complex<T>]) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let result = buffer.iter().try_for_each(|x| {
            writer.write_sample(widen(x.re) as f32)?;
            writer.write_sample(widen(x.im) as f32)
        });
        if let Err(err) = result {
            warn!(path = %self.path.display(), error = %err, "trace file write failed, disabling sink");
            self.writer = None;
        }
    }
}

impl<T: Real> TraceSink<T> for WavTraceSink {
    fn record(&mut self, event: TraceEvent<'_, T>) {
        if let TraceEvent::Detection { buffer, .. } = event {
            self.write_buffer(buffer);
        }
    }
}
