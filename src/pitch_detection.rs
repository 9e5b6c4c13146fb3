use rustfft::num_complex::Complex64;

use crate::fft::{fix_scale, Fft};

/// Detect pitch from a buffer.
/// Returns a tuple of lag (in samples) and clarity, or `None` if no peak
/// between `min_lag` and `max_lag` reaches `peak_threshold`.
pub fn pitch_detect(
    fft: &Fft,
    buf: &[f64],
    min_lag: f64,
    max_lag: f64,
    peak_threshold: f64,
) -> Option<(f64, f64)> {
    let nsdf = compute_nsdf(fft, buf);
    let limit = (max_lag.ceil() as usize + 2).min(nsdf.len());
    let mut peaks = compute_peaks(&nsdf[..limit]);
    peaks.retain(|p| min_lag <= p.0 && p.0 <= max_lag);
    let max_peak = peaks.iter().fold(0.0f64, |a, p| a.max(p.1));
    if peak_threshold < max_peak {
        peaks.iter().find(|p| max_peak * 0.9 <= p.1).copied()
    } else {
        None
    }
}

/// Normalized Square Difference Function (NSDF) for lags `0..buf.len()`.
///
/// `fft` must be at least twice as long as `buf` so the autocorrelation does
/// not wrap around.
pub fn compute_nsdf(fft: &Fft, buf: &[f64]) -> Vec<f64> {
    debug_assert!(fft.len() >= 2 * buf.len());
    let mut spectrum = fft.forward_real(buf);
    for x in spectrum.iter_mut() {
        *x = Complex64::from(x.norm_sqr());
    }
    fft.inverse(&mut spectrum);
    fix_scale(&mut spectrum);

    let len = buf.len();
    let mut nsdf = vec![0.0; len];
    let mut m = f64::EPSILON;
    for i in 0..len {
        let inv = len - i - 1;
        m += buf[i].powi(2) + buf[inv].powi(2);
        nsdf[inv] = 2.0 * spectrum[inv].re / m;
    }

    nsdf
}

/// Key maxima of each positive region after the first zero crossing, as
/// (lag, value) with parabolic interpolation.
pub fn compute_peaks(nsdf: &[f64]) -> Vec<(f64, f64)> {
    let mut peak = (0.0, 0.0);
    let mut peaks = Vec::with_capacity(32);
    let mut is_first = true;

    for i in 0..nsdf.len().saturating_sub(2) {
        if nsdf[i + 1] < 0.0 {
            if 0.0 < peak.1 {
                peaks.push(peak);
                peak = (0.0, 0.0);
            }
            is_first = false;
            continue;
        }

        if !is_first && nsdf[i + 1] - nsdf[i] > 0.0 && nsdf[i + 2] - nsdf[i + 1] <= 0.0 {
            let t = 2.0 * (nsdf[i] - 2.0 * nsdf[i + 1] + nsdf[i + 2]);
            let d = if t != 0.0 { (nsdf[i] - nsdf[i + 2]) / t } else { 0.0 };
            let c = nsdf[i + 1] - t * d * d / 4.0;
            if peak.1 < c {
                peak = ((i + 1) as f64 + d, c);
            }
        }
    }
    if 0.0 < peak.1 {
        peaks.push(peak);
    }
    peaks
}

/// Normalized autocorrelation of the `len` samples of `x` starting at `start`
/// against the same span shifted by `lag`. Samples outside `x` read as zero.
pub fn normalized_autocorrelation(x: &[f64], start: isize, len: usize, lag: usize) -> f64 {
    let mut cross = 0.0;
    let mut energy_a = 0.0;
    let mut energy_b = 0.0;
    for j in 0..len as isize {
        let a = sample_at(x, start + j);
        let b = sample_at(x, start + j + lag as isize);
        cross += a * b;
        energy_a += a * a;
        energy_b += b * b;
    }
    let norm = (energy_a * energy_b).sqrt();
    if norm > 0.0 {
        cross / norm
    } else {
        0.0
    }
}

/// `x[i]`, or zero outside the buffer.
#[inline]
pub fn sample_at(x: &[f64], i: isize) -> f64 {
    if i < 0 {
        0.0
    } else {
        x.get(i as usize).copied().unwrap_or(0.0)
    }
}

/// The `len` samples of `x` centred on `center`, zero-filled past the edges.
pub fn segment(x: &[f64], center: isize, len: usize) -> Vec<f64> {
    let start = center - (len / 2) as isize;
    (0..len as isize).map(|j| sample_at(x, start + j)).collect()
}
