//! Pitch and formant shifting on analysed parameters.
//!
//! The pitch shift scales the f0 contour. The formant shift warps each
//! envelope frame along the frequency axis in the log-magnitude domain: the
//! frame is read as if its bins sat at `ratio` times their real frequency and
//! resampled back onto the real bin frequencies, so bin `j` takes the value
//! the original frame had at bin `j / ratio`. With `ratio > 1` formants move
//! up; with `ratio < 1` they move down and the bins above the warped range are
//! held at the last valid value.

use crate::{
    error::{Error, Result},
    interp::interp1,
    params::{AnalysisParameters, ShiftParams, Spectrogram},
};

/// Applies `params` to analysed parameters in place. Aperiodicity is left
/// untouched.
pub fn modify(params: &ShiftParams, analysis: &mut AnalysisParameters) -> Result<()> {
    modify_parts(
        params,
        analysis.fs,
        analysis.fft_size,
        &mut analysis.f0,
        &mut analysis.spectrogram,
    )
}

/// Applies `params` to an f0 contour and spectrogram in place.
///
/// Nothing is modified if an error is returned.
pub fn modify_parts(
    params: &ShiftParams,
    fs: u32,
    fft_size: usize,
    f0: &mut [f64],
    spectrogram: &mut Spectrogram,
) -> Result<()> {
    params.validate()?;
    let bins = fft_size / 2 + 1;
    Error::check_len("spectrogram width", bins, spectrogram.width())?;
    Error::check_len("spectrogram frames", f0.len(), spectrogram.frames())?;

    let cutoff = flat_tail_start(fft_size, params.ratio);
    if cutoff == Some(0) {
        return Err(Error::InvalidRatio(params.ratio));
    }
    check_positive(spectrogram)?;

    shift_pitch(f0, params.shift);

    let (source_axis, target_axis) = frequency_axes(fs, fft_size, params.ratio);
    let mut spectrum1 = vec![0.0; bins];
    let mut spectrum2 = vec![0.0; bins];
    for frame in spectrogram.iter_mut() {
        for (s, &m) in spectrum1.iter_mut().zip(frame.iter()) {
            *s = m.ln();
        }
        interp1(&source_axis, &spectrum1, &target_axis, &mut spectrum2)?;
        for (m, &s) in frame.iter_mut().zip(&spectrum2) {
            *m = s.exp();
        }

        if let Some(cutoff) = cutoff {
            let held = frame[cutoff - 1];
            frame[cutoff..].fill(held);
        }
    }

    log::debug!(
        "modified {} frames: shift {}, ratio {}",
        f0.len(),
        params.shift,
        params.ratio
    );
    Ok(())
}

/// Multiplies every f0 value by `shift`. Unvoiced frames stay at zero.
pub fn shift_pitch(f0: &mut [f64], shift: f64) {
    for f in f0.iter_mut() {
        *f *= shift;
    }
}

/// The warped source axis and the unwarped target axis, both
/// `fft_size / 2 + 1` long, in Hz.
pub fn frequency_axes(fs: u32, fft_size: usize, ratio: f64) -> (Vec<f64>, Vec<f64>) {
    let fs = fs as f64;
    let n = fft_size as f64;
    (0..=fft_size / 2)
        .map(|i| {
            let i = i as f64;
            (ratio * i / n * fs, i / n * fs)
        })
        .unzip()
}

/// First bin of the flattened tail, or `None` when `ratio >= 1` and the warp
/// covers every bin.
pub fn flat_tail_start(fft_size: usize, ratio: f64) -> Option<usize> {
    if ratio >= 1.0 {
        None
    } else {
        Some((fft_size as f64 / 2.0 * ratio) as usize)
    }
}

fn check_positive(spectrogram: &Spectrogram) -> Result<()> {
    for (frame, values) in spectrogram.iter().enumerate() {
        if let Some(bin) = values.iter().position(|m| !(m.is_finite() && *m > 0.0)) {
            return Err(Error::InvalidSpectrum {
                frame,
                bin,
                value: values[bin],
            });
        }
    }
    Ok(())
}
