use crate::{
    error::{Error, Result, Stage},
    params::AnalysisParameters,
    vocoder::Vocoder,
};

/// Number of samples synthesized from `f0_length` frames.
///
/// The last frame's time stamp, in samples, plus one.
pub fn output_len(f0_length: usize, frame_period: f64, fs: u32) -> usize {
    if f0_length == 0 {
        return 0;
    }
    ((f0_length - 1) as f64 * frame_period / 1000.0 * fs as f64) as usize + 1
}

/// Renders `params` into a new zeroed buffer.
pub fn synthesize<V: Vocoder + ?Sized>(
    vocoder: &V,
    params: &AnalysisParameters,
) -> Result<Vec<f64>> {
    params.check_shape()?;
    let y_length = output_len(params.f0_length(), params.frame_period, params.fs);
    let mut y = vec![0.0; y_length];
    vocoder.synthesize(
        &params.f0,
        &params.spectrogram,
        &params.aperiodicity,
        params.fft_size,
        params.frame_period,
        params.fs,
        &mut y,
    )?;

    if let Some(i) = y.iter().position(|s| !s.is_finite()) {
        return Err(Error::primitive(
            Stage::Synthesis,
            format!("sample {} is not finite", i),
        ));
    }
    log::debug!("synthesized {} samples", y_length);
    Ok(y)
}

/// Hard-clips every sample to `[-1, 1]`.
pub fn clip(y: &mut [f64]) {
    for s in y.iter_mut() {
        if *s > 1.0 {
            *s = 1.0;
        } else if *s < -1.0 {
            *s = -1.0;
        }
    }
}
