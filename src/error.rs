use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data: need {needed} points, have {available}")]
    InsufficientData { needed: usize, available: usize },

    #[error(
        "Non-monotonic input at sample {index}: {current_s:.6}s does not follow {previous_s:.6}s"
    )]
    NonMonotonicInput {
        index: usize,
        previous_s: f64,
        current_s: f64,
    },

    #[error("Non-finite value in sample {index}")]
    NonFiniteInput { index: usize },

    #[error("Invalid resample window: {0}")]
    InvalidWindow(String),

    #[error("Invalid smoothing block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Derivative never rises above {threshold} mbar/ms; descent trigger not found")]
    TriggerNotFound { threshold: f64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
