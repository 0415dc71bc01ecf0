//! Numerically stable primitives for log-domain HMM recurrences.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Natural log of a probability.
///
/// Zero maps to NEG_INFINITY. Negative or NaN inputs map to NaN, so callers
/// that validated their inputs never see NaN.
#[inline]
pub fn ln_prob(p: f64) -> f64 {
    if p.is_nan() || p < 0.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    p.ln()
}

/// Element-wise [`ln_prob`] into a fresh vector.
pub fn ln_probs(values: &[f64]) -> Vec<f64> {
    values.iter().map(|&p| ln_prob(p)).collect()
}

/// Index of the maximum value, lowest index on ties.
///
/// A row of all NEG_INFINITY (or one that starts with NaN) resolves to index 0.
/// Returns None for empty input.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    max_and_argmax(values).map(|(idx, _)| idx)
}

/// `(argmax, max)` with the same lowest-index tie-break as [`argmax_first`].
pub fn max_and_argmax(values: &[f64]) -> Option<(usize, f64)> {
    let (&first, rest) = values.split_first()?;
    let mut best_idx = 0;
    let mut best = first;
    for (i, &v) in rest.iter().enumerate() {
        // Strict comparison keeps the earliest index on ties.
        if v > best {
            best = v;
            best_idx = i + 1;
        }
    }
    Some((best_idx, best))
}

/// Sum of a probability row, used for stochasticity checks.
pub fn row_sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_sum_exp_basic() {
        let v = [0.0, 0.0];
        let out = log_sum_exp(&v);
        assert!(approx_eq(out, 2.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_sum_exp_dominance() {
        let v = [-1000.0, 0.0];
        let out = log_sum_exp(&v);
        assert!(approx_eq(out, 0.0, 1e-12));
    }

    #[test]
    fn log_sum_exp_all_neg_inf() {
        let v = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        let out = log_sum_exp(&v);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn log_sum_exp_empty_is_neg_inf() {
        assert_eq!(log_sum_exp(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn log_add_exp_matches_lse() {
        let a = 1.234;
        let b = -0.75;
        let out = log_add_exp(a, b);
        let lse = log_sum_exp(&[a, b]);
        assert!(approx_eq(out, lse, 1e-12));
    }

    #[test]
    fn log_sum_exp_nan_propagates() {
        let out = log_sum_exp(&[0.0, f64::NAN]);
        assert!(out.is_nan());
    }

    #[test]
    fn log_add_exp_infinity_rules() {
        let out = log_add_exp(f64::INFINITY, 1.0);
        assert!(out.is_infinite() && out.is_sign_positive());

        let out2 = log_add_exp(f64::NEG_INFINITY, 2.0);
        assert!(approx_eq(out2, 2.0, 1e-12));
    }

    #[test]
    fn ln_prob_zero_is_neg_inf() {
        assert_eq!(ln_prob(0.0), f64::NEG_INFINITY);
        assert!(approx_eq(ln_prob(1.0), 0.0, 1e-15));
        assert!(approx_eq(ln_prob(0.5), 0.5f64.ln(), 1e-15));
    }

    #[test]
    fn ln_prob_rejects_negative_and_nan() {
        assert!(ln_prob(-0.1).is_nan());
        assert!(ln_prob(f64::NAN).is_nan());
    }

    #[test]
    fn ln_probs_maps_each_entry() {
        let out = ln_probs(&[1.0, 0.0]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], f64::NEG_INFINITY);
    }

    #[test]
    fn argmax_first_picks_lowest_index_on_tie() {
        assert_eq!(argmax_first(&[0.1, 0.5, 0.5, 0.2]), Some(1));
        assert_eq!(argmax_first(&[0.7, 0.7]), Some(0));
    }

    #[test]
    fn argmax_first_all_neg_inf_is_zero() {
        let row = [f64::NEG_INFINITY; 4];
        assert_eq!(argmax_first(&row), Some(0));
    }

    #[test]
    fn argmax_first_empty_is_none() {
        assert_eq!(argmax_first(&[]), None);
    }

    #[test]
    fn max_and_argmax_reports_value() {
        let (idx, val) = max_and_argmax(&[-3.0, -1.0, -2.0]).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(val, -1.0);
    }

    #[test]
    fn max_and_argmax_skips_nan_after_first() {
        let (idx, val) = max_and_argmax(&[-1.0, f64::NAN, 0.5]).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(val, 0.5);
    }

    #[test]
    fn row_sum_adds_entries() {
        assert!(approx_eq(row_sum(&[0.25, 0.25, 0.5]), 1.0, 1e-15));
    }
}
