//! Termination rules for the nested sampling loop.

use crate::state::RunState;

/// Decides after every iteration whether the run should end.
///
/// Implementations only get read access to the run state. Any
/// `Fn(&RunState) -> bool` closure can be used directly.
pub trait StoppingCriterion {
    fn should_stop(&self, state: &RunState) -> bool;
}

impl<F> StoppingCriterion for F
where
    F: Fn(&RunState) -> bool,
{
    fn should_stop(&self, state: &RunState) -> bool {
        self(state)
    }
}

/// Stop after a fixed number of iterations.
#[derive(Debug, Clone, Copy)]
pub struct NumberOfIterations(pub u64);

impl StoppingCriterion for NumberOfIterations {
    fn should_stop(&self, state: &RunState) -> bool {
        state.n_iterations() >= self.0
    }
}

/// Stop once the prior mass not yet covered by dead points, `alpha^n`,
/// drops below the cutoff.
#[derive(Debug, Clone, Copy)]
pub struct RemainingPriorMass(pub f64);

impl StoppingCriterion for RemainingPriorMass {
    fn should_stop(&self, state: &RunState) -> bool {
        state.remaining_prior_mass() < self.0
    }
}

/// Stop once the evidence the live points could still add is a small
/// fraction of the current estimate.
///
/// The bound is `max_live_L * alpha^n / Z`.
#[derive(Debug, Clone, Copy)]
pub struct RemainingEvidence {
    pub tolerance: f64,
}

impl RemainingEvidence {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl StoppingCriterion for RemainingEvidence {
    fn should_stop(&self, state: &RunState) -> bool {
        let evidence = state.evidence();
        if evidence <= 0. {
            return false;
        }
        let remaining =
            state.max_live_log_likelihood().exp() * state.remaining_prior_mass() / evidence;
        remaining < self.tolerance
    }
}
