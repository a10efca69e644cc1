//! Posterior marginals from the weighted dead points.
//!
//! Each dead point `i` carries the posterior weight `w_i * L_i / Z`. The
//! marginal of a parameter is a density-normalized histogram of its dead
//! point values under those weights, with the bin count from the Rice rule.

use std::collections::HashMap;

use crate::dead_points::DeadPoints;

/// Histogram estimate of one parameter's marginal posterior.
#[derive(Debug, Clone, PartialEq)]
pub struct MarginalPosterior {
    /// Density value of each bin.
    pub density: Vec<f64>,
    /// Midpoint of each bin.
    pub centers: Vec<f64>,
}

impl MarginalPosterior {
    fn empty() -> Self {
        Self {
            density: Vec::new(),
            centers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// All bins have the same width.
    pub fn bin_width(&self) -> Option<f64> {
        match self.centers.as_slice() {
            [a, b, ..] => Some(b - a),
            _ => None,
        }
    }

    /// Integral of the histogram over its support, 1 for a non-empty estimate.
    pub fn integral(&self) -> f64 {
        self.bin_width()
            .map(|width| self.density.iter().sum::<f64>() * width)
            .unwrap_or(0.)
    }
}

pub type Posteriors = HashMap<String, MarginalPosterior>;

/// Rice rule: `2 * floor(cbrt(n))` bins for `n` samples.
pub fn rice_bins(n: usize) -> usize {
    2 * (n as f64).cbrt() as usize
}

/// Posterior weight `w * L / Z` of every dead point.
pub fn posterior_weights(dead_points: &DeadPoints, evidence: f64) -> Vec<f64> {
    dead_points
        .log_l()
        .iter()
        .zip(dead_points.weight())
        .map(|(log_l, weight)| weight * log_l.exp() / evidence)
        .collect()
}

pub(crate) fn estimate(dead_points: &DeadPoints, evidence: f64) -> Posteriors {
    let weights = posterior_weights(dead_points, evidence);
    let mask: Vec<bool> = weights.iter().map(|&w| w > 0.).collect();
    let kept_weights: Vec<f64> = weights
        .iter()
        .zip(&mask)
        .filter(|(_, &keep)| keep)
        .map(|(&w, _)| w)
        .collect();
    let bins = rice_bins(kept_weights.len());

    dead_points
        .columns()
        .map(|(name, column)| {
            let values: Vec<f64> = column
                .iter()
                .zip(&mask)
                .filter(|(_, &keep)| keep)
                .map(|(&x, _)| x)
                .collect();
            (
                name.to_string(),
                weighted_histogram(&values, &kept_weights, bins),
            )
        })
        .collect()
}

/// Density-normalized weighted histogram with `bins` equal bins spanning
/// the data range. The last bin is closed.
pub(crate) fn weighted_histogram(values: &[f64], weights: &[f64], bins: usize) -> MarginalPosterior {
    assert_eq!(values.len(), weights.len());
    if values.is_empty() || bins == 0 {
        return MarginalPosterior::empty();
    }

    let (mut low, mut high) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    if low == high {
        low -= 0.5;
        high += 0.5;
    }
    let width = (high - low) / bins as f64;

    let mut mass = vec![0f64; bins];
    for (&x, &w) in values.iter().zip(weights) {
        let idx = (((x - low) / width) as usize).min(bins - 1);
        mass[idx] += w;
    }

    let total: f64 = mass.iter().sum();
    if total <= 0. || !total.is_finite() {
        return MarginalPosterior::empty();
    }

    let density = mass.iter().map(|m| m / (total * width)).collect();
    let centers = (0..bins)
        .map(|i| low + width * (i as f64 + 0.5))
        .collect();
    MarginalPosterior { density, centers }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dead_points::DeadPointBuilder;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn rice_rule() {
        assert_eq!(rice_bins(0), 0);
        assert_eq!(rice_bins(2), 2);
        assert_eq!(rice_bins(26), 4);
        assert_eq!(rice_bins(30), 6);
        assert_eq!(rice_bins(1100), 20);
    }

    #[test]
    fn histogram_edges_and_centers() {
        let hist = weighted_histogram(&[0., 1., 2., 3., 4.], &[1.; 5], 4);
        assert_eq!(hist.centers, vec![0.5, 1.5, 2.5, 3.5]);
        // the maximum lands in the closed last bin
        assert_eq!(hist.density, vec![0.2, 0.2, 0.2, 0.4]);
        assert_relative_eq!(hist.integral(), 1.);
    }

    #[test]
    fn constant_values_get_unit_range() {
        let hist = weighted_histogram(&[2., 2., 2.], &[0.1, 0.2, 0.3], 2);
        assert_eq!(hist.centers, vec![1.75, 2.25]);
        assert_relative_eq!(hist.integral(), 1.);
    }

    #[test]
    fn masked_points_are_dropped() {
        let mut builder = DeadPointBuilder::with_capacity(1, 4);
        builder.push(f64::NEG_INFINITY, 0.5, &[100.]);
        builder.push(0., 0.25, &[0.]);
        builder.push(0., 0.125, &[1.]);
        builder.push(0., 0.125, &[2.]);
        let dead = builder.finalize(vec!["x".to_string()]);

        let posteriors = estimate(&dead, 0.5);
        let x = &posteriors["x"];
        // three points survive the mask -> 2 * floor(cbrt(3)) = 2 bins over [0, 2]
        assert_eq!(x.centers, vec![0.5, 1.5]);
        assert_relative_eq!(x.integral(), 1.);
    }

    #[test]
    fn zero_evidence_gives_empty_marginals() {
        let mut builder = DeadPointBuilder::with_capacity(1, 2);
        builder.push(f64::NEG_INFINITY, 0.5, &[0.]);
        builder.push(f64::NEG_INFINITY, 0.5, &[1.]);
        let dead = builder.finalize(vec!["x".to_string()]);
        let posteriors = estimate(&dead, 0.);
        assert!(posteriors["x"].is_empty());
        assert_eq!(posteriors["x"].integral(), 0.);
    }

    proptest! {
        #[test]
        fn histogram_is_density_normalized(
            points in prop::collection::vec((-100f64..100f64, 0.001f64..10f64), 1..300)
        ) {
            let (values, weights): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();
            let bins = rice_bins(values.len());
            let hist = weighted_histogram(&values, &weights, bins);
            prop_assert_eq!(hist.density.len(), bins);
            prop_assert!((hist.integral() - 1.).abs() < 1e-9);
        }
    }
}
