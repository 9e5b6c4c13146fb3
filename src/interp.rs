use crate::error::{Error, Result};

/// Linear interpolation of the samples `(x, y)` at the points `xi`.
///
/// `x` must be non-decreasing. Queries outside `[x[0], x[n - 1]]` take the
/// nearest boundary value instead of extrapolating.
pub fn interp1(x: &[f64], y: &[f64], xi: &[f64], yi: &mut [f64]) -> Result<()> {
    Error::check_len("interpolation samples", x.len(), y.len())?;
    Error::check_len("interpolation output", xi.len(), yi.len())?;
    let n = x.len();
    if n == 0 {
        return Err(Error::ShapeMismatch {
            what: "interpolation samples",
            expected: 1,
            found: 0,
        });
    }

    for (&q, out) in xi.iter().zip(yi.iter_mut()) {
        *out = if q <= x[0] {
            y[0]
        } else if q >= x[n - 1] {
            y[n - 1]
        } else {
            // x[k - 1] <= q < x[k]
            let k = x.partition_point(|&v| v <= q);
            let t = (q - x[k - 1]) / (x[k] - x[k - 1]);
            y[k - 1] + t * (y[k] - y[k - 1])
        };
    }
    Ok(())
}
