//! Model parameters and their prior distributions.
//!
//! A [`SampledParameter`] ties a unique name to a [`Prior`]. The engine only
//! draws from the priors to build the initial live population, samplers use
//! the densities to move points around inside the likelihood constraint.

use std::f64::consts::PI;
use std::fmt::Debug;

use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};

use crate::error::{NestedSamplingError, Result};

/// A univariate prior distribution.
pub trait Prior: Debug + Send + Sync {
    /// Draw one value from the prior.
    fn sample(&self, rng: &mut dyn RngCore) -> f64;

    /// Natural logarithm of the prior density at `value`.
    ///
    /// Returns `-inf` outside of the support.
    fn log_density(&self, value: f64) -> f64;

    fn density(&self, value: f64) -> f64 {
        self.log_density(value).exp()
    }

    /// A characteristic width of the distribution. Samplers use it to pick
    /// initial step sizes.
    fn scale(&self) -> f64;
}

/// Uniform prior on `[low, high)`.
#[derive(Debug, Clone, Copy)]
pub struct UniformPrior {
    low: f64,
    high: f64,
}

impl UniformPrior {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(NestedSamplingError::InvalidPrior(format!(
                "uniform bounds must be finite with low < high, got [{low}, {high})"
            )));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }
}

impl Prior for UniformPrior {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.low + (self.high - self.low) * rng.random::<f64>()
    }

    fn log_density(&self, value: f64) -> f64 {
        if (self.low..self.high).contains(&value) {
            -(self.high - self.low).ln()
        } else {
            f64::NEG_INFINITY
        }
    }

    fn scale(&self) -> f64 {
        self.high - self.low
    }
}

/// Normal prior with mean `mean` and standard deviation `std`.
#[derive(Debug, Clone, Copy)]
pub struct NormalPrior {
    dist: Normal<f64>,
}

impl NormalPrior {
    pub fn new(mean: f64, std: f64) -> Result<Self> {
        if !(std.is_finite() && std > 0.) {
            return Err(NestedSamplingError::InvalidPrior(format!(
                "normal standard deviation must be positive and finite, got {std}"
            )));
        }
        let dist = Normal::new(mean, std)
            .map_err(|err| NestedSamplingError::InvalidPrior(err.to_string()))?;
        Ok(Self { dist })
    }

    pub fn mean(&self) -> f64 {
        self.dist.mean()
    }

    pub fn std(&self) -> f64 {
        self.dist.std_dev()
    }
}

impl Prior for NormalPrior {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.dist.sample(rng)
    }

    fn log_density(&self, value: f64) -> f64 {
        let z = (value - self.mean()) / self.std();
        -0.5 * z * z - self.std().ln() - 0.5 * (2. * PI).ln()
    }

    fn scale(&self) -> f64 {
        self.std()
    }
}

/// A named model parameter that is sampled during the run.
#[derive(Debug)]
pub struct SampledParameter {
    name: String,
    prior: Box<dyn Prior>,
}

impl SampledParameter {
    pub fn new(name: impl Into<String>, prior: impl Prior + 'static) -> Self {
        Self {
            name: name.into(),
            prior: Box::new(prior),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prior_distribution(&self) -> &dyn Prior {
        self.prior.as_ref()
    }

    /// Draw `n` independent values from the prior.
    pub fn rvs<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.prior.sample(rng)).collect()
    }

    /// Prior density at `value`.
    pub fn prior(&self, value: f64) -> f64 {
        self.prior.density(value)
    }

    pub fn log_prior(&self, value: f64) -> f64 {
        self.prior.log_density(value)
    }
}

/// Joint log prior of a parameter vector under independent priors.
pub fn joint_log_prior(parameters: &[SampledParameter], position: &[f64]) -> f64 {
    parameters
        .iter()
        .zip(position)
        .map(|(param, &value)| param.log_prior(value))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn uniform_draws_stay_in_bounds() {
        let param = SampledParameter::new("k", UniformPrior::new(-2., 3.).unwrap());
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws = param.rvs(&mut rng, 1000);
        assert_eq!(draws.len(), 1000);
        assert!(draws.iter().all(|x| (-2. ..3.).contains(x)));
        assert_relative_eq!(param.prior(0.), 0.2);
        assert_eq!(param.prior(3.5), 0.);
        assert_eq!(param.log_prior(-2.5), f64::NEG_INFINITY);
    }

    #[test]
    fn normal_density_matches_closed_form() {
        let prior = NormalPrior::new(1., 2.).unwrap();
        let expected = 1. / (2. * (2. * PI).sqrt());
        assert_relative_eq!(prior.density(1.), expected, epsilon = 1e-12);
        assert_relative_eq!(
            prior.log_density(3.),
            expected.ln() - 0.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn invalid_priors_are_rejected() {
        assert!(matches!(
            UniformPrior::new(1., 1.),
            Err(NestedSamplingError::InvalidPrior(_))
        ));
        assert!(NormalPrior::new(0., -1.).is_err());
        assert!(NormalPrior::new(0., f64::NAN).is_err());
    }

    #[test]
    fn joint_prior_sums_components() {
        let params = vec![
            SampledParameter::new("a", UniformPrior::new(0., 1.).unwrap()),
            SampledParameter::new("b", UniformPrior::new(0., 4.).unwrap()),
        ];
        assert_relative_eq!(joint_log_prior(&params, &[0.5, 1.]), -(4f64).ln());
        assert_eq!(joint_log_prior(&params, &[1.5, 1.]), f64::NEG_INFINITY);
    }
}
