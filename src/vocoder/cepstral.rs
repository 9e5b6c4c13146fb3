//! Built-in reference vocoder.
//!
//! Pitch comes from NSDF peak picking, the spectral envelope from a
//! pitch-adaptive power spectrum that is smoothed over one harmonic spacing
//! and then cepstrally liftered, and synthesis is a pulse train plus coloured
//! noise. It is deterministic: the noise generator is reseeded on every call.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rustfft::num_complex::Complex64;

use crate::{
    config::{AperiodicityOptions, EnvelopeOptions, PitchEstimator, PitchOptions},
    error::{Error, Result, Stage},
    fft::{fix_scale, Fft},
    params::Spectrogram,
    pitch_detection::{normalized_autocorrelation, pitch_detect, segment},
    vocoder::Vocoder,
    windows::{energy, hann_window},
};

/// Aperiodicity of a fully noisy band. Kept below one so the periodic part
/// never becomes exactly zero.
pub const MAX_APERIODICITY: f64 = 0.999999999999;
/// Lowest aperiodicity assigned to a voiced band.
pub const MIN_APERIODICITY: f64 = 0.001;
/// Absolute floor added to power spectra before taking the log.
const POWER_FLOOR: f64 = 1e-20;
/// Dynamic range kept below a frame's loudest bin.
const RELATIVE_FLOOR: f64 = 1e-8;
/// Refinement searches lags within this fraction of the coarse lag.
const REFINE_SPAN: f64 = 0.1;
/// Pitch windows span this many periods of the f0 floor.
const DIO_PERIODS: f64 = 2.5;
const HARVEST_PERIODS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CepstralVocoder {
    /// Smallest NSDF peak treated as voiced.
    pub voicing_threshold: f64,
    /// f0 assumed for unvoiced frames when sizing envelope windows, in Hz.
    pub default_f0: f64,
    /// Seed of the noise source used by synthesis.
    pub seed: u64,
}

impl Default for CepstralVocoder {
    fn default() -> Self {
        Self {
            voicing_threshold: 0.5,
            default_f0: 500.0,
            seed: 0x5eed,
        }
    }
}

impl CepstralVocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// f0 used to size analysis windows for a frame.
    fn analysis_f0(&self, f0: f64, f0_floor: f64) -> f64 {
        let f0 = if f0 > 0.0 { f0 } else { self.default_f0 };
        f0.max(f0_floor)
    }
}

impl Vocoder for CepstralVocoder {
    fn f0_length(&self, fs: u32, x_length: usize, frame_period: f64) -> usize {
        if fs == 0 || frame_period <= 0.0 {
            return 0;
        }
        (1000.0 * x_length as f64 / fs as f64 / frame_period) as usize + 1
    }

    fn estimate_f0(
        &self,
        x: &[f64],
        fs: u32,
        options: &PitchOptions,
        time_axis: &mut [f64],
        f0: &mut [f64],
    ) -> Result<()> {
        Error::check_len("time axis", f0.len(), time_axis.len())?;
        if fs == 0 {
            return Err(Error::primitive(Stage::Pitch, "sample rate is zero"));
        }
        let speed = options.speed.max(1);
        let decimated = decimate(x, speed);
        let fs = fs as f64 / speed as f64;

        let periods = match options.estimator {
            PitchEstimator::Dio => DIO_PERIODS,
            PitchEstimator::Harvest => HARVEST_PERIODS,
        };
        let window_len = (periods * fs / options.f0_floor).ceil().max(4.0) as usize;
        let window_len = window_len.next_power_of_two();
        let fft = Fft::new(window_len * 2);
        let min_lag = fs / options.f0_ceiling;
        let max_lag = (fs / options.f0_floor).min(window_len as f64 - 2.0);

        for (i, (t, f)) in time_axis.iter_mut().zip(f0.iter_mut()).enumerate() {
            *t = i as f64 * options.frame_period / 1000.0;
            let center = (*t * fs).round() as isize;
            let frame = segment(&decimated, center, window_len);
            *f = match pitch_detect(&fft, &frame, min_lag, max_lag, self.voicing_threshold) {
                Some((lag, _)) if lag > 0.0 => fs / lag,
                _ => 0.0,
            };
        }

        if options.estimator == PitchEstimator::Dio {
            remove_jumps(f0, options.allowed_range);
        }
        log::trace!("{:?} pitch estimate: {} frames", options.estimator, f0.len());
        Ok(())
    }

    fn refine_f0(
        &self,
        x: &[f64],
        fs: u32,
        time_axis: &[f64],
        f0: &[f64],
        refined_f0: &mut [f64],
    ) -> Result<()> {
        Error::check_len("time axis", f0.len(), time_axis.len())?;
        Error::check_len("refined f0", f0.len(), refined_f0.len())?;
        let fs = fs as f64;

        for ((&t, &f), refined) in time_axis.iter().zip(f0).zip(refined_f0.iter_mut()) {
            *refined = if f > 0.0 {
                refine_lag(x, (t * fs).round() as isize, fs / f)
                    .map(|lag| fs / lag)
                    .unwrap_or(f)
            } else {
                0.0
            };
        }
        Ok(())
    }

    fn fft_size(&self, fs: u32, f0_floor: f64) -> usize {
        let exponent = (3.0 * fs as f64 / f0_floor).log2().floor().max(0.0) as u32;
        1 << (1 + exponent)
    }

    fn spectral_envelope(
        &self,
        x: &[f64],
        fs: u32,
        time_axis: &[f64],
        f0: &[f64],
        options: &EnvelopeOptions,
        spectrogram: &mut Spectrogram,
    ) -> Result<()> {
        let fft_size = options.fft_size;
        check_frames(f0, time_axis, spectrogram, fft_size)?;
        let fft = Fft::new(fft_size);
        let fs = fs as f64;

        for (i, envelope) in spectrogram.iter_mut().enumerate() {
            let f = self.analysis_f0(f0[i], options.f0_floor);
            let window_len = ((3.0 * fs / f).round() as usize).clamp(2, fft_size);
            let window = hann_window(window_len);

            let frame = segment(x, (time_axis[i] * fs).round() as isize, window_len);
            let windowed: Vec<f64> = frame.iter().zip(&window).map(|(s, w)| s * w).collect();
            let spectrum = fft.forward_real(&windowed);
            let scale = 1.0 / energy(&window);
            let power: Vec<f64> = spectrum[..=fft_size / 2]
                .iter()
                .map(|c| c.norm_sqr() * scale)
                .collect();

            let width = f * fft_size as f64 / fs;
            let smoothed = smooth_power(&power, (width / 2.0).round() as usize);
            let order = ((0.75 * fs / f) as usize).max(1);
            let lifted = lift_spectrum(&fft, &smoothed, order);
            for (e, l) in envelope.iter_mut().zip(lifted) {
                *e = l.exp();
            }
        }
        log::trace!("envelope: {} frames", f0.len());
        Ok(())
    }

    fn aperiodicity(
        &self,
        x: &[f64],
        fs: u32,
        time_axis: &[f64],
        f0: &[f64],
        fft_size: usize,
        options: &AperiodicityOptions,
        aperiodicity: &mut Spectrogram,
    ) -> Result<()> {
        check_frames(f0, time_axis, aperiodicity, fft_size)?;
        let fs = fs as f64;
        let bins = fft_size / 2 + 1;

        for (i, ap) in aperiodicity.iter_mut().enumerate() {
            let periodicity = if f0[i] > 0.0 {
                let lag = (fs / f0[i]).round().max(1.0) as usize;
                let len = 3 * lag;
                let start = (time_axis[i] * fs).round() as isize - (len / 2) as isize;
                normalized_autocorrelation(x, start, len, lag).clamp(0.0, 1.0)
            } else {
                0.0
            };

            if periodicity < options.threshold {
                ap.fill(MAX_APERIODICITY);
                continue;
            }
            for (k, a) in ap.iter_mut().enumerate() {
                let position = k as f64 / (bins - 1).max(1) as f64;
                *a = ((1.0 - periodicity) + periodicity * position * position)
                    .clamp(MIN_APERIODICITY, MAX_APERIODICITY);
            }
        }
        Ok(())
    }

    fn synthesize(
        &self,
        f0: &[f64],
        spectrogram: &Spectrogram,
        aperiodicity: &Spectrogram,
        fft_size: usize,
        frame_period: f64,
        fs: u32,
        y: &mut [f64],
    ) -> Result<()> {
        let bins = fft_size / 2 + 1;
        Error::check_len("spectrogram frames", f0.len(), spectrogram.frames())?;
        Error::check_len("aperiodicity frames", f0.len(), aperiodicity.frames())?;
        Error::check_len("spectrogram width", bins, spectrogram.width())?;
        Error::check_len("aperiodicity width", bins, aperiodicity.width())?;
        if f0.is_empty() || y.is_empty() {
            return Ok(());
        }
        let hop = frame_period / 1000.0 * fs as f64;
        if hop.is_nan() || hop <= 0.0 {
            return Err(Error::primitive(
                Stage::Synthesis,
                format!("frame period {} ms is not positive", frame_period),
            ));
        }

        let fft = Fft::new(fft_size);
        let fs = fs as f64;
        let last = f0.len() - 1;
        let frame_at = |pos: f64| ((pos / hop).round() as usize).min(last);

        // periodic part: one zero-phase pulse response per pitch period
        let mut pos = 0.0;
        while pos < y.len() as f64 {
            let i = frame_at(pos);
            if f0[i] <= 0.0 {
                pos += hop;
                continue;
            }
            let period = fs / f0[i];
            let half: Vec<Complex64> = spectrogram
                .frame(i)
                .iter()
                .zip(aperiodicity.frame(i))
                .map(|(&s, &a)| Complex64::from((s * (1.0 - a * a) * period).max(0.0).sqrt()))
                .collect();
            let response = fft.inverse_half(&half);
            add_zero_phase(y, &response, pos.round() as isize);
            pos += period.max(1.0);
        }

        // aperiodic part: one windowed noise burst per frame
        let hop_len = (hop.round() as usize).max(1);
        let burst_len = (2 * hop_len).min(fft_size);
        let window = hann_window(burst_len);
        let offset = (fft_size - burst_len) / 2;
        let mut rng = Pcg64::seed_from_u64(self.seed);
        let amplitude = 3.0f64.sqrt();

        for i in 0..f0.len() {
            let start = (i as f64 * hop).round() as isize - (burst_len / 2) as isize;
            if start >= y.len() as isize {
                break;
            }
            let noise: Vec<f64> = (0..fft_size)
                .map(|_| rng.gen_range(-amplitude..amplitude))
                .collect();
            let mut spectrum = fft.forward_real(&noise);
            let voiced = f0[i] > 0.0;
            for ((c, &s), &a) in spectrum
                .iter_mut()
                .zip(spectrogram.frame(i))
                .zip(aperiodicity.frame(i))
            {
                let weight = if voiced { a } else { 1.0 };
                *c *= s.sqrt() * weight;
            }
            let colored = fft.inverse_half(&spectrum[..bins]);
            for (j, w) in window.iter().enumerate() {
                let idx = start + j as isize;
                if idx >= 0 && (idx as usize) < y.len() {
                    y[idx as usize] += colored[offset + j] * w;
                }
            }
        }
        Ok(())
    }
}

fn check_frames(
    f0: &[f64],
    time_axis: &[f64],
    spectrogram: &Spectrogram,
    fft_size: usize,
) -> Result<()> {
    Error::check_len("time axis", f0.len(), time_axis.len())?;
    Error::check_len("spectral frames", f0.len(), spectrogram.frames())?;
    Error::check_len("spectral width", fft_size / 2 + 1, spectrogram.width())
}

/// Block-averages `x` by `factor`.
fn decimate(x: &[f64], factor: usize) -> Vec<f64> {
    if factor <= 1 {
        return x.to_vec();
    }
    x.chunks(factor)
        .map(|c| c.iter().sum::<f64>() / c.len() as f64)
        .collect()
}

/// Unvoices frames whose f0 jumps away from both voiced neighbours by more
/// than `allowed_range` of its own value.
fn remove_jumps(f0: &mut [f64], allowed_range: f64) {
    let original = f0.to_vec();
    for i in 1..original.len().saturating_sub(1) {
        let (prev, f, next) = (original[i - 1], original[i], original[i + 1]);
        if f <= 0.0 || prev <= 0.0 || next <= 0.0 {
            continue;
        }
        if (f - prev).abs() / f > allowed_range && (f - next).abs() / f > allowed_range {
            f0[i] = 0.0;
        }
    }
}

/// Searches the normalized autocorrelation around `lag` for its maximum
/// and interpolates the peak position.
fn refine_lag(x: &[f64], center: isize, lag: f64) -> Option<f64> {
    let lo = ((lag * (1.0 - REFINE_SPAN)).floor() as usize).max(2);
    let hi = (lag * (1.0 + REFINE_SPAN)).ceil() as usize;
    if hi <= lo {
        return None;
    }
    let len = (2.0 * lag).ceil() as usize;
    let start = center - (len / 2) as isize;
    let r = |k: usize| normalized_autocorrelation(x, start, len, k);

    let (best, best_r) = (lo..=hi)
        .map(|k| (k, r(k)))
        .fold((lo, f64::MIN), |a, b| if b.1 > a.1 { b } else { a });
    if best_r <= 0.0 {
        return None;
    }
    let (a, b, c) = (r(best - 1), best_r, r(best + 1));
    let t = a - 2.0 * b + c;
    let d = if t < 0.0 { 0.5 * (a - c) / t } else { 0.0 };
    Some(best as f64 + d.clamp(-0.5, 0.5))
}

/// Moving average of a half power spectrum over `2 * radius + 1` bins,
/// reflecting at DC and Nyquist.
fn smooth_power(power: &[f64], radius: usize) -> Vec<f64> {
    if radius == 0 || power.len() < 2 {
        return power.to_vec();
    }
    let last = (power.len() - 1) as isize;
    let reflect = |k: isize| -> usize {
        let k = k.abs();
        let k = if k > last { 2 * last - k } else { k };
        k.clamp(0, last) as usize
    };
    let count = (2 * radius + 1) as f64;
    (0..=last)
        .map(|k| {
            (-(radius as isize)..=radius as isize)
                .map(|d| power[reflect(k + d)])
                .sum::<f64>()
                / count
        })
        .collect()
}

/// Log of a half power spectrum with quefrencies at or above `order`
/// removed.
fn lift_spectrum(fft: &Fft, power: &[f64], order: usize) -> Vec<f64> {
    let len = fft.len();
    let peak = power.iter().copied().fold(0.0f64, f64::max);
    let floor = peak * RELATIVE_FLOOR + POWER_FLOOR;

    let mut cepstrum = vec![Complex64::default(); len];
    for (c, &p) in cepstrum.iter_mut().zip(power) {
        *c = Complex64::from((p + floor).ln());
    }
    for i in 1..len / 2 {
        cepstrum[len - i] = cepstrum[i];
    }

    fft.inverse(&mut cepstrum);
    let order = order.min(len / 2);
    cepstrum[order..len - order + 1].fill(Complex64::default());

    let mut envelope = cepstrum;
    fft.forward(&mut envelope);
    fix_scale(&mut envelope);

    envelope[..power.len()].iter().map(|x| x.re).collect()
}

/// Adds a zero-phase response (time zero at index 0, negative times wrapped
/// to the end) into `y` centred on `at`.
fn add_zero_phase(y: &mut [f64], response: &[f64], at: isize) {
    let len = response.len() as isize;
    for (j, &r) in response.iter().enumerate() {
        let j = j as isize;
        let t = if j < len / 2 { j } else { j - len };
        let idx = at + t;
        if idx >= 0 && (idx as usize) < y.len() {
            y[idx as usize] += r;
        }
    }
}
