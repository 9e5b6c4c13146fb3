use crate::error::{Error, Result};

/// Relative deviation from 1.0 below which a shift has no audible effect.
pub const EFFECT_TOLERANCE: f64 = 0.01;

/// Per-frame spectra stored contiguously, one row of `width` bins per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    data: Vec<f64>,
    width: usize,
}

impl Spectrogram {
    /// Allocates `frames` zeroed rows of `width` bins.
    pub fn new(frames: usize, width: usize) -> Self {
        Self {
            data: vec![0.0; frames * width],
            width,
        }
    }

    /// Builds a spectrogram from rows, which must all have the same length.
    pub fn from_frames(frames: &[Vec<f64>]) -> Result<Self> {
        let width = frames.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(frames.len() * width);
        for frame in frames {
            Error::check_len("spectrogram frame", width, frame.len())?;
            data.extend_from_slice(frame);
        }
        Ok(Self { data, width })
    }

    pub fn frames(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn frame(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn frame_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.width.max(1))
    }

    pub fn iter_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        self.data.chunks_exact_mut(self.width.max(1))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Everything one pipeline run derives from its input waveform.
///
/// Built stage by stage by [`crate::analysis`]; `f0_length()` is fixed by
/// pitch analysis and `fft_size` by envelope analysis, and every later buffer
/// is sized from them.
#[derive(Debug, PartialEq)]
pub struct AnalysisParameters {
    /// Spacing between frames, in milliseconds.
    pub frame_period: f64,
    /// Sample rate, in Hz.
    pub fs: u32,
    /// Per-frame f0 in Hz, 0 for unvoiced frames.
    pub f0: Vec<f64>,
    /// Per-frame time stamp in seconds.
    pub time_axis: Vec<f64>,
    /// Per-frame spectral envelope, `fft_size / 2 + 1` bins wide.
    pub spectrogram: Spectrogram,
    /// Per-frame aperiodicity, same shape as `spectrogram`.
    pub aperiodicity: Spectrogram,
    pub fft_size: usize,
}

impl AnalysisParameters {
    pub fn f0_length(&self) -> usize {
        self.f0.len()
    }

    /// Number of bins per spectral frame.
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Checks the shape invariants shared by all stages.
    pub fn check_shape(&self) -> Result<()> {
        let frames = self.f0_length();
        Error::check_len("time axis", frames, self.time_axis.len())?;
        Error::check_len("spectrogram frames", frames, self.spectrogram.frames())?;
        Error::check_len("spectrogram width", self.bins(), self.spectrogram.width())?;
        Error::check_len("aperiodicity frames", frames, self.aperiodicity.frames())?;
        Error::check_len("aperiodicity width", self.bins(), self.aperiodicity.width())?;
        Ok(())
    }
}

/// The caller's pitch and formant multipliers for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftParams {
    /// Multiplier applied to every f0 value.
    pub shift: f64,
    /// Multiplier applied to the frequency axis of the spectral envelope.
    pub ratio: f64,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            shift: 1.0,
            ratio: 1.0,
        }
    }
}

impl ShiftParams {
    pub fn new(shift: f64, ratio: f64) -> Self {
        Self { shift, ratio }
    }

    /// Whether running the pipeline would change the voice audibly.
    pub fn is_effective(&self) -> bool {
        (self.shift - 1.0).abs() > EFFECT_TOLERANCE || (self.ratio - 1.0).abs() > EFFECT_TOLERANCE
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.shift.is_finite() && self.shift > 0.0) {
            return Err(Error::InvalidShift(self.shift));
        }
        if !(self.ratio.is_finite() && self.ratio > 0.0) {
            return Err(Error::InvalidRatio(self.ratio));
        }
        Ok(())
    }
}
