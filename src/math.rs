#[inline]
pub(crate) fn logaddexp(a: f64, b: f64) -> f64 {
    if a == b {
        return a + 2f64.ln();
    }
    let diff = a - b;
    if diff > 0. {
        a + (-diff).exp().ln_1p()
    } else if diff < 0. {
        b + diff.exp().ln_1p()
    } else {
        // diff is NAN
        diff
    }
}

/// Accumulator contributions that are not finite (`0 * -inf`, `NaN`
/// likelihoods, ...) count as zero so they can't poison the running sums.
#[inline]
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.
    }
}

/// A NaN log-likelihood counts as zero likelihood.
#[inline]
pub(crate) fn nan_to_neg_infinity(log_l: f64) -> f64 {
    if log_l.is_nan() {
        f64::NEG_INFINITY
    } else {
        log_l
    }
}

/// Prior mass discarded at iteration `n` (1-based): `alpha^(n-1) - alpha^n`.
#[inline]
pub(crate) fn shell_weight(alpha: f64, n: u64) -> f64 {
    alpha.powf((n - 1) as f64) - alpha.powf(n as f64)
}
