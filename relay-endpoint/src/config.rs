//! Factory-level configuration shared by every endpoint it builds.

use std::sync::Arc;

use serde_json::Value;

use relay_core::{mini_serialize_error, ApiRequest, EndpointError};

use crate::auth::Authenticator;

/// Derives extra per-request context from the request and the definition's
/// extra options.
pub type ExtraApiFn = Arc<dyn Fn(&ApiRequest, Option<&Value>) -> Value + Send + Sync>;

/// Converts a pipeline error into the JSON payload written to the client.
pub type SerializeErrorFn = Arc<dyn Fn(&EndpointError) -> Value + Send + Sync>;

/// Configuration applied to every endpoint built by one factory.
///
/// Constructed once per deployment; endpoints hold it behind an `Arc`.
#[derive(Clone)]
pub struct FactoryConfig {
    pub(crate) authenticate: Option<Arc<dyn Authenticator>>,
    pub(crate) extra_api: Option<ExtraApiFn>,
    pub(crate) serialize_error: SerializeErrorFn,
}

impl FactoryConfig {
    /// Configuration with no authenticator, no extra context, and the
    /// default error serializer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            authenticate: None,
            extra_api: None,
            serialize_error: Arc::new(default_serialize_error),
        }
    }

    /// Authenticate every request of every endpoint built from this
    /// configuration. Endpoints may opt out with
    /// [`disable_authentication`](crate::EndpointBuilder::disable_authentication).
    #[must_use]
    pub fn authenticate(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticate = Some(Arc::new(authenticator));
        self
    }

    /// Derive extra context attached to every handler's input. Receives the
    /// request and the definition's extra options.
    #[must_use]
    pub fn extra_api<F>(mut self, extra_api: F) -> Self
    where
        F: Fn(&ApiRequest, Option<&Value>) -> Value + Send + Sync + 'static,
    {
        self.extra_api = Some(Arc::new(extra_api));
        self
    }

    /// Replace the default error serializer.
    #[must_use]
    pub fn serialize_error<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&EndpointError) -> Value + Send + Sync + 'static,
    {
        self.serialize_error = Arc::new(serialize);
        self
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_serialize_error(err: &EndpointError) -> Value {
    serde_json::to_value(mini_serialize_error(err))
        .unwrap_or_else(|_| Value::String(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::fail_with_code;
    use serde_json::json;

    #[test]
    fn default_serializer_produces_the_wire_shape() {
        let config = FactoryConfig::new();
        let err = EndpointError::from(fail_with_code(400, "Invalid body"));
        let payload = (config.serialize_error)(&err);
        assert_eq!(payload, json!({ "message": "Invalid body", "code": "400" }));
    }

    #[test]
    fn custom_serializer_replaces_the_default() {
        let config = FactoryConfig::new()
            .serialize_error(|err| json!({ "message": err.to_string(), "doNotRetry": false }));
        let err = EndpointError::internal("try again");
        let payload = (config.serialize_error)(&err);
        assert_eq!(payload, json!({ "message": "try again", "doNotRetry": false }));
    }
}
