use itertools::Itertools;

use crate::math::{finite_or_zero, shell_weight};

/// Accumulated statistics of a nested sampling run.
///
/// The engine is the only writer. Stopping criteria and callers get a
/// shared reference and can only read it.
#[derive(Debug, Clone)]
pub struct RunState {
    population_size: usize,
    alpha: f64,
    n_iterations: u64,
    evidence: f64,
    h_sum: f64,
    information: f64,
    last_log_likelihood: f64,
    max_live_log_likelihood: f64,
}

impl RunState {
    pub(crate) fn new(population_size: usize) -> Self {
        let n = population_size as f64;
        RunState {
            population_size,
            alpha: n / (n + 1.),
            n_iterations: 0,
            evidence: 0.,
            h_sum: 0.,
            information: 0.,
            last_log_likelihood: f64::NEG_INFINITY,
            max_live_log_likelihood: f64::NEG_INFINITY,
        }
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    /// Expected fraction of the remaining prior mass kept per iteration.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn n_iterations(&self) -> u64 {
        self.n_iterations
    }

    pub fn evidence(&self) -> f64 {
        self.evidence
    }

    pub fn information(&self) -> f64 {
        self.information
    }

    /// Log-likelihood of the most recently discarded point.
    pub fn last_log_likelihood(&self) -> f64 {
        self.last_log_likelihood
    }

    /// Largest log-likelihood in the current live population.
    pub fn max_live_log_likelihood(&self) -> f64 {
        self.max_live_log_likelihood
    }

    /// Prior mass not yet covered by discarded points, `alpha^n`.
    pub fn remaining_prior_mass(&self) -> f64 {
        self.alpha.powf(self.n_iterations as f64)
    }

    /// Running estimate of the error of `ln Z`, `sqrt(H / population_size)`.
    ///
    /// H is a KL divergence; rounding can leave it slightly below zero for
    /// flat likelihoods, which counts as zero here.
    pub fn log_evidence_error(&self) -> f64 {
        (self.information.max(0.) / self.population_size as f64).sqrt()
    }

    /// Start the next iteration and return the weight of its dead point.
    pub(crate) fn advance(&mut self) -> f64 {
        self.n_iterations += 1;
        shell_weight(self.alpha, self.n_iterations)
    }

    pub(crate) fn set_max_live_log_likelihood(&mut self, log_l: f64) {
        self.max_live_log_likelihood = log_l;
    }

    /// Add a likelihood contribution `weight * L` with `ln L = log_l`.
    pub(crate) fn accumulate(&mut self, weight: f64, log_l: f64) {
        self.last_log_likelihood = log_l;
        let dz = finite_or_zero(weight * log_l.exp());
        self.accumulate_mass(dz, log_l);
    }

    /// Add the contribution of the remaining prior mass, `weight * l_mean`.
    pub(crate) fn accumulate_remainder(&mut self, weight: f64, l_mean: f64) {
        let dz = finite_or_zero(weight * l_mean);
        self.accumulate_mass(dz, l_mean.ln());
    }

    fn accumulate_mass(&mut self, dz: f64, log_l: f64) {
        self.evidence += dz;
        self.h_sum += finite_or_zero(dz * log_l);
        if self.evidence > 0. {
            self.information = -self.evidence.ln() + self.h_sum / self.evidence;
        }
    }
}

/// The current population of live points.
///
/// Values are stored row-major, one row per live point.
#[derive(Debug, Clone)]
pub(crate) struct LivePoints {
    dim: usize,
    values: Vec<f64>,
    log_likelihoods: Vec<f64>,
}

impl LivePoints {
    pub(crate) fn new(dim: usize, values: Vec<f64>, log_likelihoods: Vec<f64>) -> Self {
        assert_eq!(values.len(), dim * log_likelihoods.len());
        LivePoints {
            dim,
            values,
            log_likelihoods,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.log_likelihoods.len()
    }

    pub(crate) fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    pub(crate) fn log_likelihood(&self, index: usize) -> f64 {
        self.log_likelihoods[index]
    }

    pub(crate) fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    pub(crate) fn replace(&mut self, index: usize, position: &[f64], log_l: f64) {
        assert_eq!(position.len(), self.dim);
        self.values[index * self.dim..(index + 1) * self.dim].copy_from_slice(position);
        self.log_likelihoods[index] = log_l;
    }

    /// Index of the lowest log-likelihood. Ties go to the first row.
    pub(crate) fn argmin(&self) -> usize {
        self.log_likelihoods
            .iter()
            .copied()
            .position_min_by(|a, b| a.total_cmp(b))
            .expect("Live population is never empty")
    }

    pub(crate) fn max_log_likelihood(&self) -> f64 {
        self.log_likelihoods
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        self.values
            .chunks_exact(self.dim)
            .zip(self.log_likelihoods.iter().copied())
    }
}
