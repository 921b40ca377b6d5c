//! Min-max score normalization.
//!
//! Lexical scores are unbounded and vector similarities live in roughly
//! [-1, 1]; rescaling each list into [0, 1] makes them summable.

/// Score ranges narrower than this are treated as degenerate.
pub const DEGENERATE_RANGE_EPSILON: f64 = 1e-6;

/// Rescale `scores` into [0, 1], preserving length and order.
///
/// The minimum maps to `0.0` and the maximum to `1.0`. When the range is
/// degenerate (all scores tied, or a single score) every output is `1.0`.
/// Finite inputs whose spread overflows `f64` are rescaled on halved values.
pub fn normalize(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let min = scores.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = scores.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let range = max - min;

    if range < DEGENERATE_RANGE_EPSILON {
        return vec![1.0; scores.len()];
    }

    if range.is_finite() {
        return scores.iter().map(|&score| (score - min) / range).collect();
    }

    let half_range = max / 2.0 - min / 2.0;
    scores
        .iter()
        .map(|&score| (score / 2.0 - min / 2.0) / half_range)
        .collect()
}
