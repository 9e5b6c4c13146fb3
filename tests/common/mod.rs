#![allow(dead_code)]

use std::{cell::RefCell, f64::consts::TAU};

use worldshift::{
    AperiodicityOptions, EnvelopeOptions, Error, PitchEstimator, PitchOptions, Result, Spectrogram,
    Stage, Vocoder,
};

/// Harmonic test voice: ten harmonics of `freq` with 1/h amplitudes.
pub fn voice(freq: f64, fs: u32, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 / fs as f64;
            (1..=10)
                .map(|h| 0.3 / h as f64 * (TAU * freq * h as f64 * t).sin())
                .sum()
        })
        .collect()
}

pub fn voice_f32(freq: f64, fs: u32, len: usize) -> Vec<f32> {
    voice(freq, fs, len).into_iter().map(|x| x as f32).collect()
}

pub fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    values[values.len() / 2]
}

/// What the scripted vocoder saw when asked to synthesize.
#[derive(Debug, Clone)]
pub struct SynthesisCall {
    pub f0: Vec<f64>,
    pub spectrogram: Spectrogram,
    pub aperiodicity: Spectrogram,
    pub fft_size: usize,
    pub zeroed: bool,
    pub y_length: usize,
}

/// Vocoder with fixed, easily checked outputs that records every call.
pub struct ScriptedVocoder {
    pub frames: usize,
    pub fft_size: usize,
    pub fail_at: Option<Stage>,
    /// Samples written by synthesis, cycled over the output.
    pub output: Vec<f64>,
    pub calls: RefCell<Vec<Stage>>,
    pub coarse_time_axis: RefCell<Vec<f64>>,
    pub estimator: RefCell<Option<PitchEstimator>>,
    pub synthesis: RefCell<Option<SynthesisCall>>,
}

impl ScriptedVocoder {
    pub fn new(frames: usize, fft_size: usize) -> Self {
        Self {
            frames,
            fft_size,
            fail_at: None,
            output: vec![0.25],
            calls: RefCell::new(vec![]),
            coarse_time_axis: RefCell::new(vec![]),
            estimator: RefCell::new(None),
            synthesis: RefCell::new(None),
        }
    }

    pub fn failing_at(mut self, stage: Stage) -> Self {
        self.fail_at = Some(stage);
        self
    }

    pub fn with_output(mut self, output: Vec<f64>) -> Self {
        self.output = output;
        self
    }

    /// Coarse f0 of frame `i`.
    pub fn coarse_f0(i: usize) -> f64 {
        [100.0, 200.0, 0.0][i % 3]
    }

    /// Log-magnitude of bin `j` in every envelope frame.
    pub fn log_envelope(j: usize) -> f64 {
        -0.01 * j as f64
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls.borrow().clone()
    }

    pub fn synthesis_call(&self) -> SynthesisCall {
        self.synthesis
            .borrow()
            .clone()
            .expect("synthesis was not called")
    }

    fn enter(&self, stage: Stage) -> Result<()> {
        self.calls.borrow_mut().push(stage);
        if self.fail_at == Some(stage) {
            Err(Error::primitive(stage, "scripted failure"))
        } else {
            Ok(())
        }
    }
}

impl Vocoder for ScriptedVocoder {
    fn f0_length(&self, _fs: u32, _x_length: usize, _frame_period: f64) -> usize {
        self.frames
    }

    fn estimate_f0(
        &self,
        _x: &[f64],
        _fs: u32,
        options: &PitchOptions,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()> {
        self.enter(Stage::Pitch)?;
        for (i, (t, f)) in time_axis.iter_mut().zip(f0.iter_mut()).enumerate() {
            *t = i as f64 * options.frame_period / 1000.0;
            *f = Self::coarse_f0(i);
        }
        *self.coarse_time_axis.borrow_mut() = time_axis.to_vec();
        *self.estimator.borrow_mut() = Some(options.estimator);
        Ok(())
    }

    fn refine_f0(
        &self,
        _x: &[f64],
        _fs: u32,
        _time_axis: &[f64],
        f0: &[f64],
        refined_f0: &mut [f64],
    ) -> Result<()> {
        self.enter(Stage::PitchRefinement)?;
        for (r, &f) in refined_f0.iter_mut().zip(f0) {
            *r = if f > 0.0 { f + 0.5 } else { 0.0 };
        }
        Ok(())
    }

    fn fft_size(&self, _fs: u32, _f0_floor: f64) -> usize {
        self.fft_size
    }

    fn spectral_envelope(
        &self,
        _x: &[f64],
        _fs: u32,
        _time_axis: &[f64],
        _f0: &[f64],
        options: &EnvelopeOptions,
        spectrogram: &mut Spectrogram,
    ) -> Result<()> {
        self.enter(Stage::Envelope)?;
        assert_eq!(options.fft_size, self.fft_size);
        for frame in spectrogram.iter_mut() {
            for (j, m) in frame.iter_mut().enumerate() {
                *m = Self::log_envelope(j).exp();
            }
        }
        Ok(())
    }

    fn aperiodicity(
        &self,
        _x: &[f64],
        _fs: u32,
        _time_axis: &[f64],
        _f0: &[f64],
        fft_size: usize,
        options: &AperiodicityOptions,
        aperiodicity: &mut Spectrogram,
    ) -> Result<()> {
        self.enter(Stage::Aperiodicity)?;
        assert_eq!(fft_size, self.fft_size);
        assert_eq!(options.threshold, 0.85);
        for frame in aperiodicity.iter_mut() {
            frame.fill(0.25);
        }
        Ok(())
    }

    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &Spectrogram,
        aperiodicity: &Spectrogram,
        fft_size: usize,
        _frame_period: f64,
        _fs: u32,
        y: &mut [f64],
    ) -> Result<()> {
        self.enter(Stage::Synthesis)?;
        *self.synthesis.borrow_mut() = Some(SynthesisCall {
            f0: f0.to_vec(),
            spectrogram: spectrogram.clone(),
            aperiodicity: aperiodicity.clone(),
            fft_size,
            zeroed: y.iter().all(|&s| s == 0.0),
            y_length: y.len(),
        });
        for (s, &v) in y.iter_mut().zip(self.output.iter().cycle()) {
            *s += v;
        }
        Ok(())
    }
}
