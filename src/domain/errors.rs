//! Design-level error taxonomy shared across the whole core.
//!
//! Every fallible boundary in this crate returns `AppError` (or wraps one via
//! `anyhow::Error`). The five variants mirror spec.md §7 exactly; they are
//! deliberately coarser than `rustrade`'s per-concern error enums
//! (`TradingError`, `RiskViolation`, `MarketDataError`, `PortfolioError`)
//! because this system has one coherent external boundary rather than four.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream transport error: {0}")]
    TransientUpstream(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status code this error would surface as over the inbound
    /// collaborator described in spec.md §7: 400 (Validation), 404
    /// (NotFound), 500 (everything else). `TransientUpstream` is not named
    /// its own code there — it is recovered at the tick boundary during
    /// ingestion/dispatch and only reaches this mapping if it somehow
    /// escapes to the external surface, so it collapses to 500 too.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::TransientUpstream(_) | AppError::Store(_) | AppError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::TransientUpstream(_) => "UPSTREAM_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::TransientUpstream(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
