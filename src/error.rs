//! Error types for the formant shifting pipeline.

use std::fmt;

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage that invoked a vocoder primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pitch,
    PitchRefinement,
    Envelope,
    Aperiodicity,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Pitch => "pitch estimation",
            Stage::PitchRefinement => "pitch refinement",
            Stage::Envelope => "spectral envelope estimation",
            Stage::Aperiodicity => "aperiodicity estimation",
            Stage::Synthesis => "waveform synthesis",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while shifting pitch and formants.
///
/// Any error means no transformation was performed; there is never a partial
/// result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The input waveform has no samples.
    #[error("input waveform is empty")]
    EmptyInput,

    /// The sample rate is zero.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// The input waveform contains NaN or infinite samples.
    #[error("input waveform contains non-finite samples")]
    NonFiniteInput,

    /// The input waveform is shorter than one analysis frame.
    #[error("input too short: {provided} samples provided, {minimum} required")]
    InputTooShort { provided: usize, minimum: usize },

    /// The pitch multiplier is not a finite positive number.
    #[error("invalid pitch shift: {0}")]
    InvalidShift(f64),

    /// The formant ratio is not usable for the current fft size.
    #[error("invalid formant ratio: {0}")]
    InvalidRatio(f64),

    /// A tuning constant is out of range.
    #[error("invalid config '{name}': {message}")]
    InvalidConfig { name: &'static str, message: String },

    /// A vocoder primitive failed.
    #[error("{stage} failed: {message}")]
    Primitive { stage: Stage, message: String },

    /// A vocoder primitive produced a buffer of the wrong size.
    #[error("{what} has length {found}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A spectral envelope value cannot be taken to the log domain.
    #[error("spectrogram frame {frame} bin {bin} is not a positive finite value: {value}")]
    InvalidSpectrum { frame: usize, bin: usize, value: f64 },

    /// The caller-provided output buffer cannot hold the result.
    #[error("output buffer too small: {required} samples required, capacity {capacity}")]
    OutputTooSmall { required: usize, capacity: usize },
}

impl Error {
    /// Creates a primitive failure error for `stage`.
    pub fn primitive(stage: Stage, message: impl Into<String>) -> Self {
        Self::Primitive {
            stage,
            message: message.into(),
        }
    }

    /// Creates an invalid config error.
    pub fn invalid_config(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name,
            message: message.into(),
        }
    }

    /// Fails with [`Error::ShapeMismatch`] unless `found == expected`.
    pub fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::ShapeMismatch {
                what,
                expected,
                found,
            })
        }
    }
}
