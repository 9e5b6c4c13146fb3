//! Length fitting for synthesized output.

/// Linearly resamples `input` to exactly `output_len` samples, keeping the
/// first and last samples in place.
pub fn fit_length(input: &[f64], output_len: usize) -> Vec<f64> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() == 1 || output_len == 1 {
        return vec![input[0]; output_len];
    }
    if input.len() == output_len {
        return input.to_vec();
    }

    let step = (input.len() - 1) as f64 / (output_len - 1) as f64;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos as usize;
            let frac = pos - idx as f64;
            if idx + 1 < input.len() {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else {
                input[input.len() - 1]
            }
        })
        .collect()
}
