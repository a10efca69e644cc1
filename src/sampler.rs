use anyhow::Result;
use rand::Rng;

use crate::{error::NestedSamplingError, model::LogLikelihood, parameter::SampledParameter};

/// A replacement point produced by a [`Sampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub position: Vec<f64>,
    pub log_likelihood: f64,
}

/// Draws new live points under the likelihood constraint.
///
/// Given a surviving live point and the log-likelihood of the point that
/// was just discarded, produce a new point distributed according to the
/// prior restricted to `loglikelihood >= threshold`.
///
/// The returned `log_likelihood` must be at least `threshold` and must be
/// the value of `loglikelihood` at `position`. The evidence estimate is
/// biased otherwise.
pub trait Sampler {
    fn propose<L, R>(
        &mut self,
        rng: &mut R,
        parameters: &[SampledParameter],
        loglikelihood: &L,
        survivor: &[f64],
        threshold: f64,
    ) -> Result<Proposal>
    where
        L: LogLikelihood + ?Sized,
        R: Rng;
}

#[derive(Debug, Clone, Copy)]
pub struct RejectionSettings {
    /// Give up after this many prior draws for a single replacement.
    pub max_attempts: usize,
}

impl Default for RejectionSettings {
    fn default() -> Self {
        Self {
            max_attempts: 1_000_000,
        }
    }
}

/// Draw from the full prior until a point clears the threshold.
///
/// Exact, but the acceptance rate falls with the remaining prior mass, so it
/// only suits short runs and cheap likelihoods.
#[derive(Debug, Clone, Default)]
pub struct RejectionSampler {
    settings: RejectionSettings,
}

impl RejectionSampler {
    pub fn new(settings: RejectionSettings) -> Self {
        Self { settings }
    }
}

impl Sampler for RejectionSampler {
    fn propose<L, R>(
        &mut self,
        rng: &mut R,
        parameters: &[SampledParameter],
        loglikelihood: &L,
        _survivor: &[f64],
        threshold: f64,
    ) -> Result<Proposal>
    where
        L: LogLikelihood + ?Sized,
        R: Rng,
    {
        let mut position = vec![0f64; parameters.len()];
        for _ in 0..self.settings.max_attempts {
            position
                .iter_mut()
                .zip(parameters)
                .for_each(|(x, param)| *x = param.prior_distribution().sample(rng));
            let log_likelihood = loglikelihood.loglikelihood(&position);
            if log_likelihood >= threshold {
                return Ok(Proposal {
                    position,
                    log_likelihood,
                });
            }
        }
        Err(NestedSamplingError::ProposalExhausted(self.settings.max_attempts).into())
    }
}
