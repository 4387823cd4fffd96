use thiserror::Error;

/// Failure of a single data-service call. Kept as an owned message so the
/// value can live inside the shared stats state, which must be `Clone`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// A whole refresh cycle failed. The two counts are not independently
/// actionable to callers, so the first failing sub-query is reported as a
/// single aggregated error.
#[derive(Debug, Clone, Error)]
#[error("stats refresh failed: {source}")]
pub struct AggregationError {
    #[from]
    source: ServiceError,
}
