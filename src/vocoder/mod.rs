//! The analysis and synthesis primitives the pipeline drives.
//!
//! The pipeline owns every buffer; a [`Vocoder`] only fills the slices it is
//! handed. Implementations must be deterministic for a given input.

pub mod cepstral;

pub use cepstral::CepstralVocoder;

use crate::{
    config::{AperiodicityOptions, EnvelopeOptions, PitchOptions},
    error::Result,
    params::Spectrogram,
};

pub trait Vocoder {
    /// Number of analysis frames for a waveform of `x_length` samples.
    fn f0_length(&self, fs: u32, x_length: usize, frame_period: f64) -> usize;

    /// Coarse f0 estimate with the estimator chosen by `options.estimator`.
    /// Fills `time_axis` and `f0`, which have the length returned by
    /// [`Vocoder::f0_length`].
    fn estimate_f0(
        &self,
        x: &[f64],
        fs: u32,
        options: &PitchOptions,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()>;

    /// Refines a coarse f0 contour into `refined_f0`.
    fn refine_f0(
        &self,
        x: &[f64],
        fs: u32,
        time_axis: &[f64],
        f0: &[f64],
        refined_f0: &mut [f64],
    ) -> Result<()>;

    /// FFT size used by the envelope and aperiodicity estimators.
    fn fft_size(&self, fs: u32, f0_floor: f64) -> usize;

    /// Fills one power spectrum per frame into `spectrogram`.
    fn spectral_envelope(
        &self,
        x: &[f64],
        fs: u32,
        time_axis: &[f64],
        f0: &[f64],
        options: &EnvelopeOptions,
        spectrogram: &mut Spectrogram,
    ) -> Result<()>;

    /// Fills one aperiodicity spectrum per frame into `aperiodicity`.
    #[allow(clippy::too_many_arguments)]
    fn aperiodicity(
        &self,
        x: &[f64],
        fs: u32,
        time_axis: &[f64],
        f0: &[f64],
        fft_size: usize,
        options: &AperiodicityOptions,
        aperiodicity: &mut Spectrogram,
    ) -> Result<()>;

    /// Renders a waveform into `y`, which is zeroed on entry. Frame
    /// contributions are accumulated additively.
    #[allow(clippy::too_many_arguments)]
    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &Spectrogram,
        aperiodicity: &Spectrogram,
        fft_size: usize,
        frame_period: f64,
        fs: u32,
        y: &mut [f64],
    ) -> Result<()>;
}
