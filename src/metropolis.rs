//! Component-wise random-walk Metropolis under a hard likelihood constraint.
//!
//! The chain starts at the survivor, which satisfies the constraint by
//! construction. Each sweep perturbs one parameter at a time with a normal
//! step; a move is accepted with the usual Metropolis ratio of the prior
//! densities and rejected outright when its log-likelihood falls below the
//! threshold. Step widths persist between calls and are adapted towards a
//! target acceptance rate, so they shrink together with the constrained
//! region as the run progresses.

use anyhow::Result;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::{
    error::NestedSamplingError,
    model::LogLikelihood,
    parameter::SampledParameter,
    sampler::{Proposal, Sampler},
};

#[derive(Debug, Clone, Copy)]
pub struct MetropolisSettings {
    /// Number of sweeps whose final state is returned.
    pub steps: usize,
    /// Extra sweeps at the start of every call.
    pub burn_in: usize,
    /// Initial step width as a fraction of each prior's scale.
    pub initial_step: f64,
    /// Adapt the step widths after each call.
    pub adapt: bool,
    /// Acceptance rate the adaptation aims for.
    pub target_acceptance: f64,
    /// Lower bound of a step width as a fraction of the prior scale.
    pub min_step: f64,
}

impl Default for MetropolisSettings {
    fn default() -> Self {
        Self {
            steps: 20,
            burn_in: 0,
            initial_step: 0.5,
            adapt: true,
            target_acceptance: 0.5,
            min_step: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetropolisComponentWise {
    settings: MetropolisSettings,
    widths: Vec<f64>,
    last_acceptance: Vec<f64>,
}

impl MetropolisComponentWise {
    pub fn new(settings: MetropolisSettings) -> Self {
        Self {
            settings,
            widths: Vec::new(),
            last_acceptance: Vec::new(),
        }
    }

    /// Current step width per parameter. Empty before the first proposal.
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Per-parameter acceptance rate of the most recent call.
    pub fn last_acceptance(&self) -> &[f64] {
        &self.last_acceptance
    }

    fn init_widths(&mut self, parameters: &[SampledParameter]) {
        if self.widths.len() == parameters.len() {
            return;
        }
        self.widths = parameters
            .iter()
            .map(|param| self.settings.initial_step * param.prior_distribution().scale())
            .collect();
    }

    fn adapt_widths(&mut self, parameters: &[SampledParameter], accepted: &[usize], tries: usize) {
        self.last_acceptance = accepted
            .iter()
            .map(|&count| count as f64 / tries as f64)
            .collect();
        if !self.settings.adapt {
            return;
        }
        let target = self.settings.target_acceptance;
        let min_step = self.settings.min_step;
        self.widths
            .iter_mut()
            .zip(&self.last_acceptance)
            .zip(parameters)
            .for_each(|((width, &rate), param)| {
                let scale = param.prior_distribution().scale();
                *width = (*width * (rate - target).exp()).clamp(min_step * scale, scale);
            });
    }
}

impl Default for MetropolisComponentWise {
    fn default() -> Self {
        Self::new(MetropolisSettings::default())
    }
}

impl Sampler for MetropolisComponentWise {
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
        R: Rng,
    {
        if survivor.len() != parameters.len() {
            return Err(NestedSamplingError::DimensionMismatch {
                expected: parameters.len(),
                got: survivor.len(),
            }
            .into());
        }
        self.init_widths(parameters);

        let mut position = survivor.to_vec();
        let mut log_likelihood = loglikelihood.loglikelihood(&position);
        let mut accepted = vec![0usize; parameters.len()];
        let sweeps = self.settings.burn_in + self.settings.steps;

        for _ in 0..sweeps {
            for (idx, param) in parameters.iter().enumerate() {
                let current = position[idx];
                let step: f64 = rng.sample(StandardNormal);
                let candidate = current + self.widths[idx] * step;

                let log_ratio = param.log_prior(candidate) - param.log_prior(current);
                if log_ratio == f64::NEG_INFINITY || rng.random::<f64>().ln() >= log_ratio {
                    continue;
                }

                position[idx] = candidate;
                let candidate_log_l = loglikelihood.loglikelihood(&position);
                if candidate_log_l >= threshold {
                    log_likelihood = candidate_log_l;
                    accepted[idx] += 1;
                } else {
                    position[idx] = current;
                }
            }
        }

        self.adapt_widths(parameters, &accepted, sweeps.max(1));

        Ok(Proposal {
            position,
            log_likelihood,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::test_logps::NormalLogLikelihood,
        parameter::{NormalPrior, UniformPrior},
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn parameters() -> Vec<SampledParameter> {
        vec![
            SampledParameter::new("x", UniformPrior::new(-5., 5.).unwrap()),
            SampledParameter::new("y", NormalPrior::new(0., 2.).unwrap()),
        ]
    }

    #[test]
    fn proposals_stay_inside_constraint() {
        let params = parameters();
        let logl = NormalLogLikelihood { mu: 1., sigma: 0.5 };
        let mut sampler = MetropolisComponentWise::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let survivor = [1.2, 0.9];
        let threshold = logl.loglikelihood(&[1.6, 1.6]);
        assert!(logl.loglikelihood(&survivor) >= threshold);

        for _ in 0..100 {
            let proposal = sampler
                .propose(&mut rng, &params, &logl, &survivor, threshold)
                .unwrap();
            assert!(proposal.log_likelihood >= threshold);
            assert_eq!(
                proposal.log_likelihood,
                logl.loglikelihood(&proposal.position)
            );
            assert!((-5. ..5.).contains(&proposal.position[0]));
        }
        assert_eq!(sampler.widths().len(), 2);
        assert_eq!(sampler.last_acceptance().len(), 2);
    }

    #[test]
    fn widths_shrink_in_tight_region() {
        let params = parameters();
        let logl = NormalLogLikelihood { mu: 0., sigma: 0.01 };
        let mut sampler = MetropolisComponentWise::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let survivor = [0., 0.];
        let threshold = logl.loglikelihood(&[0.02, 0.02]);

        sampler
            .propose(&mut rng, &params, &logl, &survivor, threshold)
            .unwrap();
        let first = sampler.widths().to_vec();
        for _ in 0..20 {
            sampler
                .propose(&mut rng, &params, &logl, &survivor, threshold)
                .unwrap();
        }
        assert!(sampler
            .widths()
            .iter()
            .zip(&first)
            .all(|(now, before)| now < before));
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let params = parameters();
        let logl = |_: &[f64]| 0.;
        let mut sampler = MetropolisComponentWise::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = sampler
            .propose(&mut rng, &params, &logl, &[0.], 0.)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NestedSamplingError>(),
            Some(NestedSamplingError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }
}
