use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// Safe, JSON-serializable rendition of a pipeline error.
///
/// Every field is string-typed and optional; absent fields are omitted from
/// the payload, so the body never leaks non-string internals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedError {
    /// Error name, for custom serializers that want to expose one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable code. The default serializer puts the numeric status
    /// of a coded failure here, as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Default error serializer.
///
/// `message` is the error's display text (omitted when empty); `code` is set
/// for coded failures only. [`Failure::meta`](crate::Failure) is deliberately
/// not copied; a custom serializer can opt in to exposing it.
#[must_use]
pub fn mini_serialize_error(err: &EndpointError) -> SerializedError {
    let message = err.to_string();
    SerializedError {
        name: None,
        message: (!message.is_empty()).then_some(message),
        code: match err {
            EndpointError::Failure(failure) => Some(failure.status_code.as_str().to_owned()),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::fail_with_code;
    use serde_json::json;

    #[test]
    fn coded_failure_serializes_message_and_code() {
        let err = EndpointError::from(fail_with_code(400, "Invalid body"));
        let serialized = mini_serialize_error(&err);
        assert_eq!(serialized.message.as_deref(), Some("Invalid body"));
        assert_eq!(serialized.code.as_deref(), Some("400"));
        assert!(serialized.name.is_none());
    }

    #[test]
    fn internal_error_serializes_message_only() {
        let err = EndpointError::internal("bad token");
        let serialized = mini_serialize_error(&err);
        assert_eq!(serialized.message.as_deref(), Some("bad token"));
        assert!(serialized.code.is_none());
    }

    #[test]
    fn meta_is_not_exposed_by_default() {
        let err =
            EndpointError::from(fail_with_code(400, "nope").with_meta(json!({ "secret": true })));
        let value = match serde_json::to_value(mini_serialize_error(&err)) {
            Ok(v) => v,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(value, json!({ "message": "nope", "code": "400" }));
    }

    #[test]
    fn absent_fields_are_omitted_from_the_payload() {
        let value = match serde_json::to_value(SerializedError::default()) {
            Ok(v) => v,
            Err(e) => panic!("serialization failed: {e}"),
        };
        assert_eq!(value, json!({}));
    }

    proptest::proptest! {
        #[test]
        fn proptest_serialized_output_is_always_a_json_object(message in ".{0,128}") {
            let err = EndpointError::internal(message);
            let value = serde_json::to_value(mini_serialize_error(&err));
            proptest::prop_assert!(matches!(value, Ok(serde_json::Value::Object(_))));
        }
    }
}
