use std::sync::Arc;

use rustfft::num_complex::Complex64;

pub struct Fft {
    forward: Arc<dyn rustfft::Fft<f64>>,
    inverse: Arc<dyn rustfft::Fft<f64>>,
}

impl Fft {
    pub fn new(size: usize) -> Self {
        let mut planner = rustfft::FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn forward(&self, buffer: &mut [Complex64]) {
        self.forward.process(buffer);
    }

    pub fn inverse(&self, buffer: &mut [Complex64]) {
        self.inverse.process(buffer);
    }

    /// Forward transform of a real buffer, zero-padded to the plan size.
    pub fn forward_real(&self, buf: &[f64]) -> Vec<Complex64> {
        let mut spectrum = vec![Complex64::default(); self.len()];
        for (c, &x) in spectrum.iter_mut().zip(buf) {
            c.re = x;
        }
        self.forward(&mut spectrum);
        spectrum
    }

    /// Inverse transform of a half spectrum (`len / 2 + 1` bins) of a real
    /// signal. Returns the scaled real part.
    pub fn inverse_half(&self, half: &[Complex64]) -> Vec<f64> {
        let len = self.len();
        let mut spectrum = vec![Complex64::default(); len];
        spectrum[..half.len()].copy_from_slice(half);
        fill_right_part_of_spectrum(&mut spectrum);
        self.inverse(&mut spectrum);
        fix_scale(&mut spectrum);
        spectrum.into_iter().map(|x| x.re).collect()
    }
}

pub fn fix_scale(buf: &mut [Complex64]) {
    let scale = 1.0 / buf.len() as f64;
    for x in buf.iter_mut() {
        *x *= scale;
    }
}

/// Mirrors bins `1..len/2` into the upper half as complex conjugates.
pub fn fill_right_part_of_spectrum(spectrum: &mut [Complex64]) {
    let len = spectrum.len();
    for i in 1..len / 2 {
        spectrum[len - i] = spectrum[i].conj();
    }
}
