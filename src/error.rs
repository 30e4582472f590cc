use thiserror::Error;

/// Errors raised while scoring a single comparable
///
/// These never abort a valuation: the engine drops the offending comparable and carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("criterion {criterion} produced a non-finite score: {value}")]
    NonFiniteScore { criterion: &'static str, value: f64 },

    #[error("comparable {id} has an unusable price: {price}")]
    InvalidPrice { id: String, price: f64 },

    #[error("comparable {id} has an out-of-range timestamp: {timestamp}")]
    InvalidTimestamp { id: String, timestamp: i64 },
}

/// Errors that can stop the command-line run
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
