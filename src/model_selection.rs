//! Compare competing models by their evidence.
//!
//! The Bayes factor of model `a` over model `b` is `Z_a / Z_b`. All
//! computations stay in log space so that evidences far below the smallest
//! positive `f64` still compare correctly.

use crate::{math::logaddexp, nested::NestedSampling};

/// The evidence estimate of one named model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEvidence {
    pub name: String,
    pub log_evidence: f64,
    pub log_evidence_error: f64,
}

impl ModelEvidence {
    pub fn new(name: impl Into<String>, log_evidence: f64, log_evidence_error: f64) -> Self {
        Self {
            name: name.into(),
            log_evidence,
            log_evidence_error,
        }
    }

    /// Take the estimate of a finished run.
    pub fn from_run<L, S, C>(name: impl Into<String>, run: &NestedSampling<L, S, C>) -> Self {
        Self::new(name, run.log_evidence(), run.log_evidence_error())
    }
}

/// A set of models ranked from highest to lowest log evidence.
#[derive(Debug, Clone)]
pub struct ModelComparison {
    models: Vec<ModelEvidence>,
}

impl ModelComparison {
    pub fn new(models: impl IntoIterator<Item = ModelEvidence>) -> Self {
        let mut models: Vec<_> = models.into_iter().collect();
        models.sort_by(|a, b| b.log_evidence.total_cmp(&a.log_evidence));
        Self { models }
    }

    pub fn models(&self) -> &[ModelEvidence] {
        &self.models
    }

    /// The model with the largest evidence.
    pub fn best(&self) -> Option<&ModelEvidence> {
        self.models.first()
    }

    pub fn get(&self, name: &str) -> Option<&ModelEvidence> {
        self.models.iter().find(|model| model.name == name)
    }

    /// `ln(Z_numerator / Z_denominator)`.
    pub fn log_bayes_factor(&self, numerator: &str, denominator: &str) -> Option<f64> {
        Some(self.get(numerator)?.log_evidence - self.get(denominator)?.log_evidence)
    }

    /// `Z_numerator / Z_denominator`.
    pub fn bayes_factor(&self, numerator: &str, denominator: &str) -> Option<f64> {
        self.log_bayes_factor(numerator, denominator)
            .map(f64::exp)
    }

    /// Matrix of Bayes factors in ranking order, entry `[row][col]` is
    /// `Z_col / Z_row`.
    pub fn bayes_factor_matrix(&self) -> Vec<Vec<f64>> {
        self.models
            .iter()
            .map(|row| {
                self.models
                    .iter()
                    .map(|col| (col.log_evidence - row.log_evidence).exp())
                    .collect()
            })
            .collect()
    }

    /// Posterior probability of each model in ranking order, assuming equal
    /// prior odds.
    pub fn posterior_probabilities(&self) -> Vec<(&str, f64)> {
        let log_total = self
            .models
            .iter()
            .map(|model| model.log_evidence)
            .fold(f64::NEG_INFINITY, logaddexp);
        self.models
            .iter()
            .map(|model| {
                let log_p = model.log_evidence - log_total;
                (model.name.as_str(), if log_p.is_nan() { 0. } else { log_p.exp() })
            })
            .collect()
    }
}
