//! Detector configuration

use snafu::ensure;

use crate::error::{Result, SearchRangeSnafu, ThresholdSnafu};

/// Search configuration for the frame detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Normalized correlation level a peak must exceed, in (0, 2]
    pub threshold: f64,
    /// Carrier frequency offset search half-width in radians/sample, in [0, 0.5]
    pub dphi_max: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            dphi_max: 0.3,
        }
    }
}

impl DetectorConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_range(mut self, dphi_max: f64) -> Self {
        self.dphi_max = dphi_max;
        self
    }

    /// Check both parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)?;
        validate_range(self.dphi_max)
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    ensure!(
        threshold > 0.0 && threshold <= 2.0,
        ThresholdSnafu { value: threshold }
    );
    Ok(())
}

pub(crate) fn validate_range(dphi_max: f64) -> Result<()> {
    ensure!(
        (0.0..=0.5).contains(&dphi_max),
        SearchRangeSnafu { value: dphi_max }
    );
    Ok(())
}

/// Map a normalized carrier search half-width onto whole FFT bins
///
/// `range = round(dphi_max * nfft / 2pi)`
pub fn range_bins(dphi_max: f64, nfft: usize) -> usize {
    (dphi_max * nfft as f64 / (2.0 * core::f64::consts::PI)).round() as usize
}
