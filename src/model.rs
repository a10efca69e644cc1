//! The log-likelihood seam between a model and the sampler.

/// Log-likelihood of a parameter vector.
///
/// The vector holds one value per sampled parameter, in the order the
/// parameters were passed to the engine. Returning `-inf` marks a point with
/// zero likelihood; that is a valid value and not an error.
///
/// Any `Fn(&[f64]) -> f64` closure implements this trait.
pub trait LogLikelihood {
    fn loglikelihood(&self, position: &[f64]) -> f64;
}

impl<F> LogLikelihood for F
where
    F: Fn(&[f64]) -> f64,
{
    fn loglikelihood(&self, position: &[f64]) -> f64 {
        self(position)
    }
}
