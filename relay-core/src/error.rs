use http::StatusCode;

use crate::signal::Failure;

/// Errors that can terminate an endpoint pipeline run.
///
/// The pipeline catches once at its boundary, classifies, and writes: a
/// [`Failure`] responds with the code it carries, anything else with 500.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EndpointError {
    /// A status-coded failure; responds with the code it carries.
    #[error(transparent)]
    Failure(#[from] Failure),

    /// Any other error; responds with 500 Internal Server Error.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl EndpointError {
    /// Wrap an unclassified error.
    pub fn internal(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Internal(err.into())
    }

    /// Status code used when this error terminates a request.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Failure(failure) => failure.status_code,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
