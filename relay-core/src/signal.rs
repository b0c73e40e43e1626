use http::StatusCode;
use serde_json::Value;

/// Status-coded failure raised by handlers, parsers, validators, or the
/// authenticator.
///
/// Carries the HTTP status to respond with, a human-readable message, and
/// optional metadata for a custom error serializer. Prefer the
/// [`fail_with_code`] constructor where a bare numeric code is at hand.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
#[non_exhaustive]
pub struct Failure {
    /// HTTP status code to respond with.
    pub status_code: StatusCode,
    /// Message included in the serialized error payload.
    pub message: String,
    /// Additional information, only visible to a custom `serialize_error`.
    pub meta: Option<Value>,
}

impl Failure {
    /// Create a failure with the given status and message.
    #[must_use]
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            meta: None,
        }
    }

    /// Attach metadata for a custom error serializer.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Build a [`Failure`] from a bare status code.
///
/// Codes outside the valid HTTP range fall back to 500.
#[must_use]
pub fn fail_with_code(code: u16, message: impl Into<String>) -> Failure {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Failure::new(status, message)
}

/// Status-coded success returned by handlers that want a code other than the
/// automatic 200/204.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct Success {
    /// HTTP status code to respond with.
    pub status_code: StatusCode,
    /// JSON payload written as the response body.
    pub payload: Value,
}

impl Success {
    /// Create a success with the given status and payload.
    #[must_use]
    pub fn new(status_code: StatusCode, payload: impl Into<Value>) -> Self {
        Self {
            status_code,
            payload: payload.into(),
        }
    }
}

/// Build a [`Success`] from a bare status code.
///
/// Codes outside the valid HTTP range fall back to 200.
#[must_use]
pub fn succeed_with_code(code: u16, payload: impl Into<Value>) -> Success {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::OK);
    Success::new(status, payload)
}

/// Everything a handler can resolve to.
///
/// The variants are mutually exclusive: a handler outcome is exactly one of
/// these, or an `Err` carrying an [`EndpointError`](crate::EndpointError)
/// which the pipeline's outer catch classifies instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The response was already written through the
    /// [`ResponseWriter`](crate::ResponseWriter); the pipeline must not write
    /// anything further.
    Sent,
    /// No payload: respond 204 No Content with an empty body.
    Empty,
    /// Plain payload: respond 200 OK with the value as JSON body.
    Value(Value),
    /// Status-coded success: respond with the code and payload it carries.
    Success(Success),
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Success> for Reply {
    fn from(success: Success) -> Self {
        Self::Success(success)
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fail_with_code_uses_given_status() {
        let failure = fail_with_code(403, "forbidden");
        assert_eq!(failure.status_code, StatusCode::FORBIDDEN);
        assert_eq!(failure.message, "forbidden");
        assert!(failure.meta.is_none());
    }

    #[test]
    fn fail_with_code_invalid_status_falls_back_to_500() {
        let failure = fail_with_code(42, "bad code");
        assert_eq!(failure.status_code, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn failure_display_is_the_message() {
        let failure = fail_with_code(400, "Invalid body");
        assert_eq!(failure.to_string(), "Invalid body");
    }

    #[test]
    fn failure_with_meta_keeps_meta_for_custom_serializers() {
        let failure = fail_with_code(400, "nope").with_meta(json!({ "doNotRetry": true }));
        assert_eq!(failure.meta, Some(json!({ "doNotRetry": true })));
    }

    #[test]
    fn succeed_with_code_invalid_status_falls_back_to_200() {
        let success = succeed_with_code(1000, json!("data"));
        assert_eq!(success.status_code, StatusCode::OK);
    }

    #[test]
    fn reply_from_unit_is_empty() {
        assert_eq!(Reply::from(()), Reply::Empty);
    }

    #[test]
    fn reply_from_success_keeps_code_and_payload() {
        let reply = Reply::from(succeed_with_code(201, json!({ "id": 1 })));
        match reply {
            Reply::Success(s) => {
                assert_eq!(s.status_code, StatusCode::CREATED);
                assert_eq!(s.payload, json!({ "id": 1 }));
            }
            other => panic!("expected Success, got {other:?}"),
        }
    }
}
