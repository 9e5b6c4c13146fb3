use std::f64::consts::TAU;

/// Periodic Hann window. Copies at a hop of `size / 2` sum to one.
pub fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (i as f64 * TAU / size as f64).cos()))
        .collect()
}

/// Sum of squared window coefficients.
pub fn energy(window: &[f64]) -> f64 {
    window.iter().map(|w| w * w).sum()
}
