//! The classic nested sampling loop.
//!
//! A population of live points drawn from the prior shrinks the prior mass
//! it covers by the expected factor `alpha = n / (n + 1)` per iteration:
//! the lowest-likelihood point is recorded as a dead point with weight
//! `alpha^(k-1) - alpha^k` and replaced by a new point from the sampler that
//! has a higher likelihood. When the stopping criterion fires, the remaining
//! live points share the leftover prior mass `alpha^k`.

use std::{cell::OnceCell, collections::HashSet};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::{
    dead_points::{DeadPointBuilder, DeadPoints},
    error::NestedSamplingError,
    math::nan_to_neg_infinity,
    model::LogLikelihood,
    parameter::SampledParameter,
    posterior::{self, Posteriors},
    sampler::Sampler,
    state::{LivePoints, RunState},
    stopping::StoppingCriterion,
};

/// Settings for a nested sampling run
#[derive(Debug, Clone, Copy)]
pub struct NestedSamplingSettings {
    /// The number of live points. Must be at least 2.
    pub population_size: usize,
    /// Seed of the random number generator that draws the initial
    /// population, picks survivors and drives the sampler.
    pub seed: u64,
    /// Report progress every this many iterations when running verbosely.
    pub progress_every: u64,
    /// Fail the run if the sampler returns a point below the threshold.
    pub check_sampler_contract: bool,
}

impl Default for NestedSamplingSettings {
    fn default() -> Self {
        Self {
            population_size: 100,
            seed: 0,
            progress_every: 10,
            check_sampler_contract: true,
        }
    }
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Progress {
    pub iteration: u64,
    pub evidence: f64,
    /// `exp(sqrt(H / population_size))` at this iteration.
    pub evidence_error: f64,
    pub remaining_prior_mass: f64,
    /// Log-likelihood of the point discarded in this iteration.
    pub log_l: f64,
}

impl Progress {
    fn new(state: &RunState) -> Self {
        Self {
            iteration: state.n_iterations(),
            evidence: state.evidence(),
            evidence_error: state.log_evidence_error().exp(),
            remaining_prior_mass: state.remaining_prior_mass(),
            log_l: state.last_log_likelihood(),
        }
    }
}

pub struct ProgressCallback {
    pub callback: Box<dyn FnMut(&Progress)>,
    /// Call every this many iterations.
    pub every: u64,
}

/// Results that only exist after a finished run.
#[derive(Debug)]
struct Finished {
    log_evidence: f64,
    log_evidence_error: f64,
    evidence_error: f64,
    dead_points: DeadPoints,
}

/// A classic nested sampler.
///
/// Runs exactly once: `run` consumes the prior draws and leaves the frozen
/// dead points behind. All accumulated values are exposed read-only.
pub struct NestedSampling<L, S, C> {
    parameters: Vec<SampledParameter>,
    loglikelihood: L,
    sampler: S,
    stopping_criterion: C,
    settings: NestedSamplingSettings,
    rng: ChaCha8Rng,
    state: RunState,
    progress_callback: Option<ProgressCallback>,
    finished: Option<Finished>,
    posteriors: OnceCell<Posteriors>,
}

impl<L, S, C> NestedSampling<L, S, C>
where
    L: LogLikelihood,
    S: Sampler,
    C: StoppingCriterion,
{
    pub fn new(
        parameters: Vec<SampledParameter>,
        loglikelihood: L,
        sampler: S,
        stopping_criterion: C,
        settings: NestedSamplingSettings,
    ) -> Result<Self, NestedSamplingError> {
        if settings.population_size < 2 {
            return Err(NestedSamplingError::PopulationTooSmall(
                settings.population_size,
            ));
        }
        if parameters.is_empty() {
            return Err(NestedSamplingError::NoParameters);
        }
        let duplicate = {
            let mut names = HashSet::new();
            parameters
                .iter()
                .find(|param| !names.insert(param.name()))
                .map(|param| param.name().to_string())
        };
        if let Some(name) = duplicate {
            return Err(NestedSamplingError::DuplicateParameter(name));
        }

        Ok(Self {
            parameters,
            loglikelihood,
            sampler,
            stopping_criterion,
            rng: ChaCha8Rng::seed_from_u64(settings.seed),
            state: RunState::new(settings.population_size),
            settings,
            progress_callback: None,
            finished: None,
            posteriors: OnceCell::new(),
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Run the sampler until the stopping criterion fires.
    ///
    /// Returns `(ln Z, error of ln Z)`. A run in which every point had zero
    /// likelihood finishes with `ln Z = -inf`. A NaN log-likelihood counts
    /// as zero likelihood.
    ///
    /// With `verbose` set, the first iteration and every
    /// `settings.progress_every`-th iteration are logged as `tracing` events
    /// at `info` level, followed by a summary when the run finishes. They are
    /// only printed if the caller installs a `tracing` subscriber.
    pub fn run(&mut self, verbose: bool) -> Result<(f64, f64)> {
        if self.finished.is_some() {
            return Err(NestedSamplingError::AlreadyFinished.into());
        }

        let population_size = self.settings.population_size;
        let dim = self.parameters.len();

        if verbose {
            info!(population_size, "Generating the initial live points");
        }
        let mut live = self.initial_population();
        let mut dead = DeadPointBuilder::with_capacity(dim, 2 * population_size);

        let mut worst = live.argmin();
        loop {
            let weight = self.state.advance();
            if self.state.n_iterations() > 1 {
                self.replace(&mut live, worst)
                    .with_context(|| {
                        format!(
                            "Failed to replace live point in iteration {}",
                            self.state.n_iterations()
                        )
                    })?;
                worst = live.argmin();
            }

            let log_l = live.log_likelihood(worst);
            dead.push(log_l, weight, live.row(worst));
            self.state.accumulate(weight, log_l);
            self.state.set_max_live_log_likelihood(live.max_log_likelihood());

            self.report(verbose);

            if self.stopping_criterion.should_stop(&self.state) {
                break;
            }
        }

        Ok(self.finalize(live, dead, worst, verbose))
    }

    fn initial_population(&mut self) -> LivePoints {
        let population_size = self.settings.population_size;
        let dim = self.parameters.len();

        let columns: Vec<Vec<f64>> = self
            .parameters
            .iter()
            .map(|param| param.rvs(&mut self.rng, population_size))
            .collect();

        let mut values = Vec::with_capacity(population_size * dim);
        for row in 0..population_size {
            values.extend(columns.iter().map(|column| column[row]));
        }
        let log_likelihoods = values
            .chunks_exact(dim)
            .map(|position| nan_to_neg_infinity(self.loglikelihood.loglikelihood(position)))
            .collect();

        LivePoints::new(dim, values, log_likelihoods)
    }

    /// Overwrite the row `worst` with a new point evolved from a random
    /// survivor.
    fn replace(&mut self, live: &mut LivePoints, worst: usize) -> Result<()> {
        let threshold = live.log_likelihood(worst);

        let mut survivor = self.rng.random_range(0..live.len() - 1);
        if survivor >= worst {
            survivor += 1;
        }

        let proposal = self.sampler.propose(
            &mut self.rng,
            &self.parameters,
            &self.loglikelihood,
            live.row(survivor),
            threshold,
        )?;

        if proposal.position.len() != self.parameters.len() {
            return Err(NestedSamplingError::DimensionMismatch {
                expected: self.parameters.len(),
                got: proposal.position.len(),
            }
            .into());
        }
        if self.settings.check_sampler_contract && !(proposal.log_likelihood >= threshold) {
            return Err(NestedSamplingError::SamplerContractViolation {
                threshold,
                proposed: proposal.log_likelihood,
            }
            .into());
        }

        live.replace(
            worst,
            &proposal.position,
            nan_to_neg_infinity(proposal.log_likelihood),
        );
        Ok(())
    }

    fn report(&mut self, verbose: bool) {
        let iteration = self.state.n_iterations();
        if verbose && is_logged(iteration, self.settings.progress_every) {
            let progress = Progress::new(&self.state);
            info!(
                iteration,
                evidence = progress.evidence,
                evidence_error = progress.evidence_error,
                remaining_prior_mass = progress.remaining_prior_mass,
                log_l = progress.log_l,
                "Nested sampling progress"
            );
        }
        if let Some(progress_callback) = self.progress_callback.as_mut() {
            if iteration % progress_callback.every.max(1) == 0 {
                (progress_callback.callback)(&Progress::new(&self.state));
            }
        }
    }

    /// Spread the remaining prior mass over the live points other than
    /// `worst`, which was already recorded by the last iteration.
    fn finalize(
        &mut self,
        live: LivePoints,
        mut dead: DeadPointBuilder,
        worst: usize,
        verbose: bool,
    ) -> (f64, f64) {
        let weight = self.state.remaining_prior_mass();
        let survivors = live.len() - 1;

        let l_mean = live
            .log_likelihoods()
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != worst)
            .map(|(_, log_l)| log_l.exp())
            .sum::<f64>()
            / survivors as f64;
        self.state.accumulate_remainder(weight, l_mean);

        let shared_weight = weight / survivors as f64;
        live.rows()
            .enumerate()
            .filter(|&(idx, _)| idx != worst)
            .for_each(|(_, (position, log_l))| dead.push(log_l, shared_weight, position));

        let log_evidence_error = self.state.log_evidence_error();
        let log_evidence = self.state.evidence().ln();
        if verbose {
            debug!(
                iterations = self.state.n_iterations(),
                dead_points = dead.len(),
                remaining_prior_mass = weight,
                "Absorbed the remaining live points"
            );
            info!(
                log_evidence,
                log_evidence_error,
                information = self.state.information(),
                "Nested sampling finished"
            );
        }

        let names = self
            .parameters
            .iter()
            .map(|param| param.name().to_string())
            .collect();
        self.finished = Some(Finished {
            log_evidence,
            log_evidence_error,
            evidence_error: log_evidence_error.exp(),
            dead_points: dead.finalize(names),
        });

        (log_evidence, log_evidence_error)
    }
}

fn is_logged(iteration: u64, every: u64) -> bool {
    iteration == 1 || iteration % every.max(1) == 0
}

impl<L, S, C> NestedSampling<L, S, C> {
    pub fn parameters(&self) -> &[SampledParameter] {
        &self.parameters
    }

    pub fn settings(&self) -> &NestedSamplingSettings {
        &self.settings
    }

    /// The accumulated run state. Updated while the run is in progress.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn n_iterations(&self) -> u64 {
        self.state.n_iterations()
    }

    /// Estimate of the Bayesian evidence Z.
    pub fn evidence(&self) -> f64 {
        self.state.evidence()
    }

    /// Rough multiplicative error of Z, `exp(sqrt(H / population_size))`.
    ///
    /// Zero before the run has finished.
    pub fn evidence_error(&self) -> f64 {
        self.finished
            .as_ref()
            .map_or(0., |finished| finished.evidence_error)
    }

    /// Estimate of `ln Z`. Zero before the run has finished.
    pub fn log_evidence(&self) -> f64 {
        self.finished
            .as_ref()
            .map_or(0., |finished| finished.log_evidence)
    }

    /// Rough error of `ln Z`, `sqrt(H / population_size)`. Zero before the
    /// run has finished.
    pub fn log_evidence_error(&self) -> f64 {
        self.finished
            .as_ref()
            .map_or(0., |finished| finished.log_evidence_error)
    }

    /// Estimate of the information H, the KL divergence from prior to
    /// posterior.
    pub fn information(&self) -> f64 {
        self.state.information()
    }

    /// The dead points of a finished run.
    pub fn dead_points(&self) -> Option<&DeadPoints> {
        self.finished.as_ref().map(|finished| &finished.dead_points)
    }

    /// Histogram estimates of the marginal posterior of every parameter.
    ///
    /// Computed on the first call and cached afterwards.
    pub fn posteriors(&self) -> Result<&Posteriors, NestedSamplingError> {
        let finished = self
            .finished
            .as_ref()
            .ok_or(NestedSamplingError::NotFinished)?;
        Ok(self
            .posteriors
            .get_or_init(|| posterior::estimate(&finished.dead_points, self.state.evidence())))
    }
}
