//! The three analysis stages: pitch, spectral envelope and aperiodicity.
//!
//! Each stage allocates the buffers it fills from sizes fixed by the stages
//! before it, then hands them to the [`Vocoder`].

use crate::{
    config::{AnalysisConfig, AperiodicityOptions, EnvelopeOptions, PitchOptions},
    error::{Error, Result, Stage},
    params::{AnalysisParameters, Spectrogram},
    vocoder::Vocoder,
};

/// Output of pitch analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchContour {
    pub f0: Vec<f64>,
    pub time_axis: Vec<f64>,
}

impl PitchContour {
    pub fn len(&self) -> usize {
        self.f0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f0.is_empty()
    }
}

/// Estimates the coarse f0 contour and refines it.
pub fn estimate_pitch<V: Vocoder + ?Sized>(
    vocoder: &V,
    x: &[f64],
    fs: u32,
    options: &PitchOptions,
) -> Result<PitchContour> {
    let f0_length = vocoder.f0_length(fs, x.len(), options.frame_period);
    if f0_length == 0 {
        return Err(Error::primitive(Stage::Pitch, "no analysis frames"));
    }

    let mut f0 = vec![0.0; f0_length];
    let mut time_axis = vec![0.0; f0_length];
    vocoder.estimate_f0(x, fs, options, &mut time_axis, &mut f0)?;

    let mut refined_f0 = vec![0.0; f0_length];
    vocoder.refine_f0(x, fs, &time_axis, &f0, &mut refined_f0)?;

    if let Some(i) = refined_f0.iter().position(|f| !(f.is_finite() && *f >= 0.0)) {
        return Err(Error::primitive(
            Stage::PitchRefinement,
            format!("frame {} has f0 {}", i, refined_f0[i]),
        ));
    }

    log::debug!("pitch analysis: {} frames", f0_length);
    Ok(PitchContour {
        f0: refined_f0,
        time_axis,
    })
}

/// Estimates one spectral envelope frame per pitch frame.
///
/// Returns the fft size alongside the spectrogram; every later stage uses
/// that size.
pub fn estimate_envelope<V: Vocoder + ?Sized>(
    vocoder: &V,
    x: &[f64],
    fs: u32,
    contour: &PitchContour,
    options: &EnvelopeOptions,
) -> Result<(usize, Spectrogram)> {
    let fft_size = vocoder.fft_size(fs, options.f0_floor);
    if fft_size < 2 {
        return Err(Error::primitive(
            Stage::Envelope,
            format!("fft size {} is too small", fft_size),
        ));
    }
    let options = EnvelopeOptions {
        fft_size,
        ..*options
    };

    let mut spectrogram = Spectrogram::new(contour.len(), fft_size / 2 + 1);
    vocoder.spectral_envelope(
        x,
        fs,
        &contour.time_axis,
        &contour.f0,
        &options,
        &mut spectrogram,
    )?;

    log::debug!("envelope analysis: fft size {}", fft_size);
    Ok((fft_size, spectrogram))
}

/// Estimates one aperiodicity frame per pitch frame.
pub fn estimate_aperiodicity<V: Vocoder + ?Sized>(
    vocoder: &V,
    x: &[f64],
    fs: u32,
    contour: &PitchContour,
    fft_size: usize,
    options: &AperiodicityOptions,
) -> Result<Spectrogram> {
    let mut aperiodicity = Spectrogram::new(contour.len(), fft_size / 2 + 1);
    vocoder.aperiodicity(
        x,
        fs,
        &contour.time_axis,
        &contour.f0,
        fft_size,
        options,
        &mut aperiodicity,
    )?;
    Ok(aperiodicity)
}

/// Runs all three analysis stages in order.
pub fn analyze<V: Vocoder + ?Sized>(
    vocoder: &V,
    config: &AnalysisConfig,
    x: &[f64],
    fs: u32,
) -> Result<AnalysisParameters> {
    let contour = estimate_pitch(vocoder, x, fs, &config.pitch)?;
    let (fft_size, spectrogram) = estimate_envelope(vocoder, x, fs, &contour, &config.envelope)?;
    let aperiodicity =
        estimate_aperiodicity(vocoder, x, fs, &contour, fft_size, &config.aperiodicity)?;

    let params = AnalysisParameters {
        frame_period: config.frame_period,
        fs,
        f0: contour.f0,
        time_axis: contour.time_axis,
        spectrogram,
        aperiodicity,
        fft_size,
    };
    params.check_shape()?;
    Ok(params)
}
