//! Pitch and formant shifting by analysis and resynthesis.
//!
//! A waveform is decomposed into an f0 contour, a spectral envelope and an
//! aperiodicity spectrogram. The f0 contour is scaled by a pitch multiplier,
//! each envelope frame is warped along the frequency axis by a formant ratio,
//! and the result is resynthesized and clipped to `[-1, 1]`.
//!
//! ```
//! use worldshift::{FormantShifter, ShiftParams};
//!
//! let fs = 16000;
//! let input: Vec<f32> = (0..fs as usize / 4)
//!     .map(|i| (2.0 * std::f32::consts::PI * 180.0 * i as f32 / fs as f32).sin() * 0.5)
//!     .collect();
//!
//! let shifter = FormantShifter::new();
//! let params = ShiftParams::new(1.2, 1.1);
//! let output = shifter.process(&input, fs, &params).unwrap();
//! assert_eq!(output.len(), shifter.output_len(input.len(), fs));
//! assert!(output.iter().all(|s| (-1.0..=1.0).contains(s)));
//! ```
//!
//! The analysis and synthesis primitives sit behind the [`Vocoder`] trait;
//! [`CepstralVocoder`] is the built-in implementation.

pub mod analysis;
pub mod config;
pub mod error;
pub mod fft;
pub mod float;
pub mod interp;
pub mod modification;
pub mod params;
pub mod pipeline;
pub mod pitch_detection;
pub mod resample;
pub mod synthesis;
pub mod vocoder;
pub mod windows;

pub use config::{
    AnalysisConfig, AperiodicityOptions, EnvelopeOptions, PitchEstimator, PitchOptions,
};
pub use error::{Error, Result, Stage};
pub use float::Sample;
pub use params::{AnalysisParameters, ShiftParams, Spectrogram};
pub use pipeline::FormantShifter;
pub use vocoder::{CepstralVocoder, Vocoder};

/// Shifts pitch by `shift` and formants by `ratio` with the default
/// configuration and the built-in vocoder.
pub fn shift_formants(shift: f64, ratio: f64, fs: u32, x: &[f32]) -> Result<Vec<f32>> {
    FormantShifter::new().process(x, fs, &ShiftParams::new(shift, ratio))
}

/// Root mean square of a buffer, 0 for an empty one.
pub fn power<T: Sample>(buf: &[T]) -> f64 {
    if buf.is_empty() {
        return 0.0;
    }
    (buf.iter().map(|&x| x.to_wide().powi(2)).sum::<f64>() / buf.len() as f64).sqrt()
}
