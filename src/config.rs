//! Tuning constants for the analysis stages.
//!
//! The defaults are the values the formant shifter has always shipped with.
//! The pitch tracker and the envelope estimator use different f0 floors on
//! purpose: the envelope uses the higher floor so its window stays short
//! enough to follow formant movement.

use crate::error::{Error, Result};

/// Default spacing between analysis frames, in milliseconds.
pub const DEFAULT_FRAME_PERIOD: f64 = 5.0;

/// Which coarse pitch estimator a [`crate::Vocoder`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PitchEstimator {
    /// Fast estimator with short windows and jump removal.
    #[default]
    Dio,
    /// Slower estimator with longer windows, steadier on low and breathy
    /// voices.
    Harvest,
}

/// Options for the coarse pitch estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchOptions {
    pub estimator: PitchEstimator,
    /// Spacing between frames, in milliseconds. Mirrors
    /// [`AnalysisConfig::frame_period`].
    pub frame_period: f64,
    /// Decimation factor applied before estimation (1 = full rate).
    pub speed: usize,
    /// Lowest f0 searched, in Hz.
    pub f0_floor: f64,
    /// Highest f0 searched, in Hz.
    pub f0_ceiling: f64,
    /// Largest relative f0 jump between neighbouring frames that is still
    /// accepted as voiced.
    pub allowed_range: f64,
}

impl Default for PitchOptions {
    fn default() -> Self {
        Self {
            estimator: PitchEstimator::Dio,
            frame_period: DEFAULT_FRAME_PERIOD,
            speed: 1,
            f0_floor: 40.0,
            f0_ceiling: 800.0,
            allowed_range: 0.1,
        }
    }
}

/// Options for the spectral envelope estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeOptions {
    /// f0 floor that sizes the analysis window, in Hz.
    pub f0_floor: f64,
    /// FFT size. Zero until resolved from the sample rate.
    pub fft_size: usize,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            f0_floor: 71.0,
            fft_size: 0,
        }
    }
}

/// Options for the aperiodicity estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AperiodicityOptions {
    /// Periodicity below which a frame is treated as fully aperiodic.
    pub threshold: f64,
}

impl Default for AperiodicityOptions {
    fn default() -> Self {
        Self { threshold: 0.85 }
    }
}

/// All tunables of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Spacing between analysis frames, in milliseconds.
    pub frame_period: f64,
    pub pitch: PitchOptions,
    pub envelope: EnvelopeOptions,
    pub aperiodicity: AperiodicityOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_period: DEFAULT_FRAME_PERIOD,
            pitch: PitchOptions::default(),
            envelope: EnvelopeOptions::default(),
            aperiodicity: AperiodicityOptions::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_period(mut self, frame_period: f64) -> Self {
        self.frame_period = frame_period;
        self.pitch.frame_period = frame_period;
        self
    }

    pub fn with_pitch_estimator(mut self, estimator: PitchEstimator) -> Self {
        self.pitch.estimator = estimator;
        self
    }

    pub fn with_pitch_floor(mut self, f0_floor: f64) -> Self {
        self.pitch.f0_floor = f0_floor;
        self
    }

    pub fn with_pitch_ceiling(mut self, f0_ceiling: f64) -> Self {
        self.pitch.f0_ceiling = f0_ceiling;
        self
    }

    pub fn with_speed(mut self, speed: usize) -> Self {
        self.pitch.speed = speed;
        self
    }

    pub fn with_allowed_range(mut self, allowed_range: f64) -> Self {
        self.pitch.allowed_range = allowed_range;
        self
    }

    pub fn with_envelope_floor(mut self, f0_floor: f64) -> Self {
        self.envelope.f0_floor = f0_floor;
        self
    }

    pub fn with_aperiodicity_threshold(mut self, threshold: f64) -> Self {
        self.aperiodicity.threshold = threshold;
        self
    }

    /// Checks every tunable is in range.
    pub fn validate(&self) -> Result<()> {
        positive("frame_period", self.frame_period)?;
        if self.pitch.frame_period != self.frame_period {
            return Err(Error::invalid_config(
                "pitch.frame_period",
                format!(
                    "{} does not match frame_period {}",
                    self.pitch.frame_period, self.frame_period
                ),
            ));
        }
        if self.pitch.speed == 0 {
            return Err(Error::invalid_config("pitch.speed", "must be at least 1"));
        }
        positive("pitch.f0_floor", self.pitch.f0_floor)?;
        positive("pitch.f0_ceiling", self.pitch.f0_ceiling)?;
        if self.pitch.f0_ceiling <= self.pitch.f0_floor {
            return Err(Error::invalid_config(
                "pitch.f0_ceiling",
                format!(
                    "{} must be above f0_floor {}",
                    self.pitch.f0_ceiling, self.pitch.f0_floor
                ),
            ));
        }
        positive("pitch.allowed_range", self.pitch.allowed_range)?;
        positive("envelope.f0_floor", self.envelope.f0_floor)?;
        let threshold = self.aperiodicity.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::invalid_config(
                "aperiodicity.threshold",
                format!("{} is outside [0, 1]", threshold),
            ));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(
            name,
            format!("{} is not a positive finite number", value),
        ))
    }
}
