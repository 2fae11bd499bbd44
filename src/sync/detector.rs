//! Streaming frame detector
//!
//! Samples enter one at a time. In `Seek` the detector fills half a window,
//! searches the full window for the template over every carrier hypothesis and
//! slides on by half a window. When a peak clears the threshold it drops
//! everything before the peak and switches to `Align`, waiting for the window to
//! refill so the template starts at sample 0. The fine estimator then runs once,
//! the aligned window is published, and the detector returns to `Seek` keeping
//! the newest half window.

use std::fmt;

use rustfft::num_complex::Complex;
use tracing::{debug, instrument};

use super::correlator::{BlockCorrelator, CorrelationPeak};
use super::fine::{self, Estimates};
use super::window::SlidingWindow;
use crate::config::{range_bins, validate_range, validate_threshold, DetectorConfig};
use crate::error::Result;
use crate::real::{count, lit, widen, Real};
use crate::template::{CpfskPulse, PulseShape, ReferenceTemplate};
use crate::trace::{TraceEvent, TraceSink};

/// Acquisition state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    /// Searching each half window for a correlation peak
    #[default]
    Seek,
    /// Peak found; filling the window from the peak onward
    Align,
}

/// Detects a known template in a sample stream and estimates its impairments
///
/// All buffers are allocated at construction; `execute` never allocates.
pub struct FrameDetector<T: Real> {
    template: ReferenceTemplate<T>,
    threshold: T,
    dphi_max: T,
    range: usize,

    state: DetectorState,
    window: SlidingWindow<Complex<T>>,
    correlator: BlockCorrelator<T>,
    /// Scratch for the carrier estimate
    product: Vec<Complex<T>>,
    /// Last aligned window
    output: Vec<Complex<T>>,

    /// Input energy of the older and newer half windows
    x2_0: T,
    x2_1: T,
    /// Carrier bin and peak of the pending candidate
    offset: isize,
    rxy: T,
    estimates: Estimates<T>,

    sink: Option<Box<dyn TraceSink<T>>>,
}

impl<T: Real> FrameDetector<T> {
    /// Detector for an existing template
    #[instrument(level = "debug", skip(template), fields(s_len = template.len()))]
    pub fn new(template: ReferenceTemplate<T>, config: DetectorConfig) -> Result<Self> {
        config.validate()?;

        let nfft = template.nfft();
        let zero = Complex::new(T::zero(), T::zero());
        let range = range_bins(config.dphi_max, nfft);

        let mut detector = Self {
            threshold: lit(config.threshold),
            dphi_max: lit(config.dphi_max),
            range,
            state: DetectorState::Seek,
            window: SlidingWindow::new(nfft),
            correlator: BlockCorrelator::new(nfft),
            product: vec![zero; nfft],
            output: vec![zero; nfft],
            x2_0: T::zero(),
            x2_1: T::zero(),
            offset: 0,
            rxy: T::zero(),
            estimates: Estimates::default(),
            sink: None,
            template,
        };
        detector.reset();

        debug!(nfft, range, "frame detector ready");
        Ok(detector)
    }

    /// Detector for a raw sample template, default configuration
    pub fn from_samples(sequence: &[Complex<T>]) -> Result<Self> {
        Self::new(
            ReferenceTemplate::from_samples(sequence)?,
            DetectorConfig::default(),
        )
    }

    /// Detector for pulse-shaped linear symbols, default configuration
    pub fn linear(
        symbols: &[Complex<T>],
        shape: PulseShape,
        k: usize,
        m: usize,
        beta: T,
    ) -> Result<Self> {
        Self::new(
            ReferenceTemplate::linear(symbols, shape, k, m, beta)?,
            DetectorConfig::default(),
        )
    }

    /// Detector for GMSK bits, default configuration
    pub fn gmsk(bits: &[u8], k: usize, m: usize, bt: T) -> Result<Self> {
        Self::new(
            ReferenceTemplate::gmsk(bits, k, m, bt)?,
            DetectorConfig::default(),
        )
    }

    /// Detector for CPFSK symbols, default configuration
    #[allow(clippy::too_many_arguments)]
    pub fn cpfsk(
        symbols: &[u8],
        bits_per_symbol: usize,
        h: T,
        k: usize,
        m: usize,
        beta: T,
        pulse: CpfskPulse,
    ) -> Result<Self> {
        Self::new(
            ReferenceTemplate::cpfsk(symbols, bits_per_symbol, h, k, m, beta, pulse)?,
            DetectorConfig::default(),
        )
    }

    /// Install a trace sink, replacing any previous one
    pub fn set_trace_sink(&mut self, sink: impl TraceSink<T> + 'static) {
        self.sink = Some(Box::new(sink));
    }

    pub fn with_trace_sink(mut self, sink: impl TraceSink<T> + 'static) -> Self {
        self.set_trace_sink(sink);
        self
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink<T>>> {
        self.sink.take()
    }

    /// Push one sample
    ///
    /// Returns the aligned window (`buf_len()` samples, template first) when
    /// this sample completes a detection. The slice borrows the detector, so it
    /// is gone by the next call.
    pub fn execute(&mut self, x: Complex<T>) -> Option<&[Complex<T>]> {
        if self.push_sample(x) {
            Some(&self.output)
        } else {
            None
        }
    }

    /// Push a block of samples, calling `on_frame` for every detection
    ///
    /// Returns the number of detections.
    pub fn execute_block<F>(&mut self, samples: &[Complex<T>], mut on_frame: F) -> usize
    where
        F: FnMut(&[Complex<T>], &Estimates<T>),
    {
        let mut frames = 0;
        for &x in samples {
            if self.push_sample(x) {
                frames += 1;
                on_frame(&self.output, &self.estimates);
            }
        }
        frames
    }

    /// Return to the initial `Seek` state without reallocating
    pub fn reset(&mut self) {
        let half = self.template.nfft() / 2;
        self.window.prime(half, Complex::new(T::zero(), T::zero()));
        self.state = DetectorState::Seek;
        self.x2_0 = T::zero();
        self.x2_1 = T::zero();
        self.offset = 0;
        self.rxy = T::zero();
        self.estimates = Estimates::default();
    }

    fn push_sample(&mut self, x: Complex<T>) -> bool {
        match self.state {
            DetectorState::Seek => self.seek(x),
            DetectorState::Align => self.align(x),
        }
    }

    fn seek(&mut self, x: Complex<T>) -> bool {
        self.window.push(x);
        self.x2_1 += x.norm_sqr();
        if !self.window.is_full() {
            return false;
        }

        let nfft = self.template.nfft();
        let s_len = count::<T>(self.template.len());
        let g0 = if self.x2_0 == T::zero() {
            self.x2_1.sqrt() * (s_len / count::<T>(nfft / 2)).sqrt()
        } else {
            (self.x2_0 + self.x2_1).sqrt() * (s_len / count::<T>(nfft)).sqrt()
        };
        if g0 < lit(1e-10) {
            self.rotate();
            return false;
        }
        let g = T::one() / (count::<T>(nfft) * g0 * self.template.energy().sqrt());

        let window = self.window.linearize();
        self.correlator.load(window);
        let peak = self
            .correlator
            .search(self.template.spectrum(), self.range, g);

        if let Some(sink) = self.sink.as_mut() {
            sink.record(TraceEvent::Search { peak, g0 });
        }

        if peak.rxy > self.threshold && peak.index < nfft - self.template.len() {
            self.begin_alignment(peak);
            // Peak at lag 0: the window is already aligned
            if self.window.is_full() {
                return self.finish_alignment();
            }
            return false;
        }

        self.rotate();
        false
    }

    fn begin_alignment(&mut self, peak: CorrelationPeak<T>) {
        debug!(
            rxy = widen(peak.rxy),
            index = peak.index,
            offset = peak.offset,
            "frame candidate"
        );
        if let Some(sink) = self.sink.as_mut() {
            sink.record(TraceEvent::Candidate { peak });
        }

        self.state = DetectorState::Align;
        self.offset = peak.offset;
        self.rxy = peak.rxy;
        self.window.consume(peak.index);
    }

    fn align(&mut self, x: Complex<T>) -> bool {
        self.window.push(x);
        if !self.window.is_full() {
            return false;
        }
        self.finish_alignment()
    }

    fn finish_alignment(&mut self) -> bool {
        let window = self.window.linearize();
        self.estimates = fine::estimate(
            &mut self.correlator,
            &self.template,
            window,
            self.offset,
            self.rxy,
            &mut self.product,
        );
        self.output.copy_from_slice(window);

        debug!(
            rxy = widen(self.estimates.rxy),
            tau = widen(self.estimates.tau),
            gamma = widen(self.estimates.gamma),
            dphi = widen(self.estimates.dphi),
            phi = widen(self.estimates.phi),
            "frame detected"
        );
        if let Some(sink) = self.sink.as_mut() {
            sink.record(TraceEvent::Detection {
                estimates: &self.estimates,
                buffer: &self.output,
            });
        }

        // Keep the newest half for the next search
        let half = self.template.nfft() / 2;
        self.window.consume(half);
        self.x2_0 = self
            .window
            .iter()
            .fold(T::zero(), |acc, x| acc + x.norm_sqr());
        self.x2_1 = T::zero();
        self.state = DetectorState::Seek;
        true
    }

    /// Slide on by half a window
    fn rotate(&mut self) {
        self.window.consume(self.template.nfft() / 2);
        self.x2_0 = self.x2_1;
        self.x2_1 = T::zero();
    }

    /// Set the detection threshold, in (0, 2]
    pub fn set_threshold(&mut self, threshold: T) -> Result<()> {
        validate_threshold(widen(threshold))?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn threshold(&self) -> T {
        self.threshold
    }

    /// Set the carrier search half-width in radians/sample, in [0, 0.5]
    pub fn set_range(&mut self, dphi_max: T) -> Result<()> {
        validate_range(widen(dphi_max))?;
        self.dphi_max = dphi_max;
        self.range = range_bins(widen(dphi_max), self.template.nfft());
        Ok(())
    }

    /// Carrier search half-width, radians/sample
    pub fn range(&self) -> T {
        self.dphi_max
    }

    /// Carrier search half-width, FFT bins
    pub fn range_bins(&self) -> usize {
        self.range
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Estimates of the most recent detection
    pub fn estimates(&self) -> &Estimates<T> {
        &self.estimates
    }

    pub fn tau(&self) -> T {
        self.estimates.tau
    }

    pub fn gamma(&self) -> T {
        self.estimates.gamma
    }

    pub fn dphi(&self) -> T {
        self.estimates.dphi
    }

    pub fn phi(&self) -> T {
        self.estimates.phi
    }

    pub fn rxy(&self) -> T {
        self.estimates.rxy
    }

    /// Length of the aligned buffer returned on detection
    pub fn buf_len(&self) -> usize {
        self.template.nfft()
    }

    pub fn seq_len(&self) -> usize {
        self.template.len()
    }

    pub fn sequence(&self) -> &[Complex<T>] {
        self.template.sequence()
    }

    pub fn template(&self) -> &ReferenceTemplate<T> {
        &self.template
    }

    /// Write the `Display` summary to stdout
    pub fn print(&self) {
        println!("{}", self);
    }
}

/// Independent copy sharing only the immutable transform plans
///
/// An installed trace sink is not carried over.
impl<T: Real> Clone for FrameDetector<T> {
    fn clone(&self) -> Self {
        Self {
            template: self.template.clone(),
            threshold: self.threshold,
            dphi_max: self.dphi_max,
            range: self.range,
            state: self.state,
            window: self.window.clone(),
            correlator: self.correlator.clone(),
            product: self.product.clone(),
            output: self.output.clone(),
            x2_0: self.x2_0,
            x2_1: self.x2_1,
            offset: self.offset,
            rxy: self.rxy,
            estimates: self.estimates,
            sink: None,
        }
    }
}

impl<T: Real> fmt::Display for FrameDetector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frame detector:")?;
        writeln!(f, "  template length   : {}", self.template.len())?;
        writeln!(f, "  FFT size          : {}", self.template.nfft())?;
        writeln!(
            f,
            "  search range      : {} bins ({} rad/sample)",
            self.range, self.dphi_max
        )?;
        writeln!(f, "  threshold         : {}", self.threshold)?;
        write!(f, "  template energy   : {}", self.template.energy())
    }
}

impl<T: Real> fmt::Debug for FrameDetector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDetector")
            .field("seq_len", &self.template.len())
            .field("nfft", &self.template.nfft())
            .field("range", &self.range)
            .field("threshold", &self.threshold)
            .field("state", &self.state)
            .field("estimates", &self.estimates)
            .field("trace_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
