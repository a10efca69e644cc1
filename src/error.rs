use thiserror::Error;

#[derive(Error, Debug)]
pub enum NestedSamplingError {
    #[error("population size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("at least one sampled parameter is required")]
    NoParameters,
    #[error("sampled parameter `{0}` is defined more than once")]
    DuplicateParameter(String),
    #[error("invalid prior: {0}")]
    InvalidPrior(String),
    #[error("sampler returned log-likelihood {proposed} below the threshold {threshold}")]
    SamplerContractViolation { threshold: f64, proposed: f64 },
    #[error("sampler returned a parameter vector of length {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("no point above the likelihood threshold after {0} prior draws")]
    ProposalExhausted(usize),
    #[error("the nested sampling run has already finished")]
    AlreadyFinished,
    #[error("the nested sampling run has not finished yet")]
    NotFinished,
}

pub type Result<T> = std::result::Result<T, NestedSamplingError>;
