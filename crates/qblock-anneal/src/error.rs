//! Error types for the anneal crate.

use thiserror::Error;

/// Errors produced while sampling a binary quadratic model.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AnnealError {
    /// `num_reads` must be ≥ 1.
    #[error("num_reads must be at least 1, got {0}")]
    InvalidReads(usize),

    /// `num_sweeps` must be ≥ 1.
    #[error("num_sweeps must be at least 1, got {0}")]
    InvalidSweeps(usize),

    /// β range must be positive, finite and ordered hot to cold.
    #[error("Invalid beta range ({hot}, {cold}): expected 0 < hot <= cold")]
    InvalidBetaRange {
        /// Starting (hot) inverse temperature.
        hot: f64,
        /// Final (cold) inverse temperature.
        cold: f64,
    },

    /// A bias or the offset is NaN or infinite.
    #[error("Non-finite bias on {0}")]
    NonFiniteBias(String),
}

/// Result type for annealing operations.
pub type AnnealResult<T> = Result<T, AnnealError>;
