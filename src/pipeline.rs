use crate::{
    analysis,
    config::AnalysisConfig,
    error::{Error, Result},
    float::{narrow, narrow_into, widen, Sample},
    modification,
    params::{AnalysisParameters, ShiftParams},
    resample, synthesis,
    vocoder::{CepstralVocoder, Vocoder},
};

/// Batch pitch and formant shifter.
///
/// Each call analyses the whole utterance, applies a [`ShiftParams`] and
/// resynthesizes it. Calls share no mutable state, so one shifter can serve
/// several threads when its vocoder is `Sync`.
#[derive(Debug, Clone, Default)]
pub struct FormantShifter<V = CepstralVocoder> {
    vocoder: V,
    config: AnalysisConfig,
}

impl FormantShifter<CepstralVocoder> {
    /// Creates a shifter backed by the built-in vocoder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Vocoder> FormantShifter<V> {
    pub fn with_vocoder(vocoder: V) -> Self {
        Self {
            vocoder,
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn vocoder(&self) -> &V {
        &self.vocoder
    }

    /// Shortest input accepted: one frame period of samples.
    pub fn min_input_len(&self, fs: u32) -> usize {
        (fs as f64 * self.config.frame_period / 1000.0).ceil().max(1.0) as usize
    }

    /// Length of the output [`FormantShifter::process`] produces for an input
    /// of `x_length` samples.
    pub fn output_len(&self, x_length: usize, fs: u32) -> usize {
        let frame_period = self.config.frame_period;
        let f0_length = self.vocoder.f0_length(fs, x_length, frame_period);
        synthesis::output_len(f0_length, frame_period, fs)
    }

    /// Runs the analysis stages only.
    pub fn analyze<T: Sample>(&self, x: &[T], fs: u32) -> Result<AnalysisParameters> {
        let x = widen(x);
        self.check_input(&x, fs)?;
        analysis::analyze(&self.vocoder, &self.config, &x, fs)
    }

    /// Shifts a working-precision waveform. The result is clipped to `[-1, 1]`.
    pub fn process_wide(&self, x: &[f64], fs: u32, params: &ShiftParams) -> Result<Vec<f64>> {
        params.validate()?;
        self.check_input(x, fs)?;
        self.run_wide(x, fs, params)
    }

    /// Runs every stage on input that has already been validated.
    fn run_wide(&self, x: &[f64], fs: u32, params: &ShiftParams) -> Result<Vec<f64>> {
        log::trace!(
            "shifting {} samples at {} Hz: shift {}, ratio {}",
            x.len(),
            fs,
            params.shift,
            params.ratio
        );

        let mut analysis = analysis::analyze(&self.vocoder, &self.config, x, fs)?;
        modification::modify(params, &mut analysis)?;
        let mut y = synthesis::synthesize(&self.vocoder, &analysis)?;
        synthesis::clip(&mut y);
        Ok(y)
    }

    /// Shifts `x` and returns a new buffer of [`FormantShifter::output_len`]
    /// samples.
    pub fn process<T: Sample>(&self, x: &[T], fs: u32, params: &ShiftParams) -> Result<Vec<T>> {
        let y = self.process_wide(&widen(x), fs, params)?;
        Ok(narrow(&y))
    }

    /// Shifts `x` into the front of `out` and returns the number of samples
    /// written. Fails without writing if `out` is too small.
    pub fn process_into<T: Sample>(
        &self,
        x: &[T],
        fs: u32,
        params: &ShiftParams,
        out: &mut [T],
    ) -> Result<usize> {
        let x = widen(x);
        params.validate()?;
        self.check_input(&x, fs)?;
        let required = self.output_len(x.len(), fs);
        if required > out.len() {
            return Err(Error::OutputTooSmall {
                required,
                capacity: out.len(),
            });
        }

        let y = self.run_wide(&x, fs, params)?;
        if y.len() > out.len() {
            return Err(Error::OutputTooSmall {
                required: y.len(),
                capacity: out.len(),
            });
        }
        narrow_into(&y, &mut out[..y.len()]);
        Ok(y.len())
    }

    /// Shifts `x` and resamples the result back to `x.len()` samples.
    pub fn process_fitted<T: Sample>(
        &self,
        x: &[T],
        fs: u32,
        params: &ShiftParams,
    ) -> Result<Vec<T>> {
        let y = self.process_wide(&widen(x), fs, params)?;
        Ok(narrow(&resample::fit_length(&y, x.len())))
    }

    fn check_input(&self, x: &[f64], fs: u32) -> Result<()> {
        self.config.validate()?;
        let result = validate_input(x, fs, self.min_input_len(fs));
        if let Err(err) = &result {
            log::warn!("rejected input: {}", err);
        }
        result
    }
}

fn validate_input(x: &[f64], fs: u32, minimum: usize) -> Result<()> {
    if fs == 0 {
        return Err(Error::InvalidSampleRate(fs));
    }
    if x.is_empty() {
        return Err(Error::EmptyInput);
    }
    if x.iter().any(|s| !s.is_finite()) {
        return Err(Error::NonFiniteInput);
    }
    if x.len() < minimum {
        return Err(Error::InputTooShort {
            provided: x.len(),
            minimum,
        });
    }
    Ok(())
}
