use snafu::Snafu;

/// Configuration errors raised while building a template or detector.
///
/// Runtime input never produces one of these: a stream without a frame in it is
/// the normal state of the detector, not an error.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DetectorError {
    /// Reference sequence has no samples
    #[snafu(display("reference sequence cannot be empty"))]
    EmptySequence,

    /// Reference sequence has no energy to correlate against
    #[snafu(display("reference sequence has zero energy"))]
    ZeroEnergy,

    #[snafu(display("samples/symbol must be in [2,80], got {value}"))]
    SamplesPerSymbol { value: usize },

    #[snafu(display("filter delay must be in [1,100] symbols, got {value}"))]
    FilterDelay { value: usize },

    #[snafu(display("excess bandwidth factor must be in [0,1], got {value}"))]
    ExcessBandwidth { value: f64 },

    #[snafu(display("bandwidth-time product must be in (0,1], got {value}"))]
    BandwidthTime { value: f64 },

    #[snafu(display("bits/symbol must be in [1,8], got {value}"))]
    BitsPerSymbol { value: usize },

    #[snafu(display("modulation index must be greater than zero, got {value}"))]
    ModulationIndex { value: f64 },

    #[snafu(display("symbol {value} at index {index} is outside a {size}-ary alphabet"))]
    SymbolOutOfRange { index: usize, value: u8, size: usize },

    #[snafu(display("detection threshold must be in (0,2], got {value}"))]
    Threshold { value: f64 },

    #[snafu(display("carrier offset search range must be in [0,0.5], got {value}"))]
    SearchRange { value: f64 },
}

pub type Result<T, E = DetectorError> = std::result::Result<T, E>;
