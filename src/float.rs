//! Conversion between the compact per-sample representation callers hand in
//! and the `f64` working representation every analysis stage runs on.

use rustfft::{num_traits, FftNum};

pub trait Float: FftNum + num_traits::Float + num_traits::FloatConst {}

impl<T: FftNum + num_traits::Float + num_traits::FloatConst> Float for T {}

/// A sample type that can cross the pipeline boundary.
pub trait Sample: Float {
    fn to_wide(self) -> f64;
    fn from_wide(x: f64) -> Self;
}

impl Sample for f32 {
    #[inline]
    fn to_wide(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_wide(x: f64) -> Self {
        x as f32
    }
}

impl Sample for f64 {
    #[inline]
    fn to_wide(self) -> f64 {
        self
    }

    #[inline]
    fn from_wide(x: f64) -> Self {
        x
    }
}

/// Widens `buf` into a new working buffer.
pub fn widen<T: Sample>(buf: &[T]) -> Vec<f64> {
    buf.iter().map(|&x| x.to_wide()).collect()
}

/// Narrows `buf` into `out`, which must be the same length.
pub fn narrow_into<T: Sample>(buf: &[f64], out: &mut [T]) {
    debug_assert_eq!(buf.len(), out.len());
    for (y, &x) in out.iter_mut().zip(buf) {
        *y = T::from_wide(x);
    }
}

/// Narrows `buf` into a new buffer of the caller's sample type.
pub fn narrow<T: Sample>(buf: &[f64]) -> Vec<T> {
    buf.iter().map(|&x| T::from_wide(x)).collect()
}
