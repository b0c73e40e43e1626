//! Authentication seam and the 401-normalizing adapter.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use relay_core::{fail_with_code, ApiRequest, EndpointError};

/// Request authenticator supplied by the embedding application.
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate the request. The returned value reaches the handler as
    /// its `authentication` context.
    ///
    /// # Errors
    /// Return a coded [`Failure`](relay_core::Failure) to choose the
    /// response status; any other error is normalized to 401 by the
    /// pipeline.
    async fn authenticate(&self, req: &ApiRequest) -> Result<Value, EndpointError>;
}

/// Run the configured authenticator, normalizing unclassified errors.
///
/// Coded failures propagate untouched, preserving the authenticator's
/// chosen status. Anything else becomes a 401 carrying the error's message,
/// or a generic message when there is none.
pub(crate) async fn run_authenticator(
    authenticator: Option<&Arc<dyn Authenticator>>,
    req: &ApiRequest,
) -> Result<Option<Value>, EndpointError> {
    let Some(authenticator) = authenticator else {
        return Ok(None);
    };
    match authenticator.authenticate(req).await {
        Ok(value) => Ok(Some(value)),
        Err(err) => match err {
            EndpointError::Failure(_) => Err(err),
            other => {
                tracing::warn!(error = %other, "authentication failed");
                let message = other.to_string();
                let message = if message.is_empty() {
                    "Authentication failed".to_owned()
                } else {
                    message
                };
                Err(fail_with_code(401, message).into())
            }
        },
    }
}
