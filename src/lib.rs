//! Classic nested sampling for Bayesian evidence estimation.
//!
//! A [`NestedSampling`] run draws a population of live points from the
//! priors of its [`SampledParameter`]s, repeatedly discards the point with
//! the lowest likelihood and replaces it through a [`Sampler`] until a
//! [`StoppingCriterion`] fires. The result is an estimate of `ln Z` with a
//! rough error, the weighted [`DeadPoints`] and histogram estimates of the
//! marginal posteriors.

pub(crate) mod dead_points;
pub(crate) mod error;
pub(crate) mod math;
pub(crate) mod metropolis;
pub(crate) mod model;
pub(crate) mod model_selection;
pub(crate) mod nested;
pub(crate) mod parameter;
pub(crate) mod posterior;
pub(crate) mod sampler;
pub(crate) mod state;
pub(crate) mod stopping;

pub use dead_points::{DeadPoint, DeadPoints};
pub use error::NestedSamplingError;
pub use metropolis::{MetropolisComponentWise, MetropolisSettings};
pub use model::LogLikelihood;
pub use model_selection::{ModelComparison, ModelEvidence};
pub use nested::{NestedSampling, NestedSamplingSettings, Progress, ProgressCallback};
pub use parameter::{joint_log_prior, NormalPrior, Prior, SampledParameter, UniformPrior};
pub use posterior::{posterior_weights, rice_bins, MarginalPosterior, Posteriors};
pub use sampler::{Proposal, RejectionSampler, RejectionSettings, Sampler};
pub use state::RunState;
pub use stopping::{NumberOfIterations, RemainingEvidence, RemainingPriorMass, StoppingCriterion};
