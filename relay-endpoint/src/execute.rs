//! The per-request execution pipeline.
//!
//! Sequences authentication, parsing, validation, handler invocation,
//! response classification, and error serialization for one request. Every
//! path terminates with exactly one response write, except when the handler
//! signals that it already wrote the response itself.

use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;

use relay_core::{fail_with_code, ApiRequest, EndpointError, Reply, ResponseWriter};

use crate::auth::run_authenticator;
use crate::config::FactoryConfig;
use crate::definition::{HandlerContext, MethodDefinition, ValidatorFn};

/// Execute one method definition against one request, writing the terminal
/// response into `res`.
///
/// This is what an [`Endpoint`](crate::Endpoint) runs after routing; it is
/// public so embedders doing their own method routing can drive a single
/// definition directly.
pub async fn execute_definition(
    config: &FactoryConfig,
    definition: &MethodDefinition,
    disable_authentication: bool,
    req: Arc<ApiRequest>,
    res: &ResponseWriter,
) {
    if let Err(err) = run(config, definition, disable_authentication, req, res).await {
        res.status(err.status_code())
            .json(&(config.serialize_error)(&err));
    }
}

async fn run(
    config: &FactoryConfig,
    definition: &MethodDefinition,
    disable_authentication: bool,
    req: Arc<ApiRequest>,
    res: &ResponseWriter,
) -> Result<(), EndpointError> {
    let authentication = if disable_authentication {
        None
    } else {
        run_authenticator(config.authenticate.as_ref(), &req).await?
    };

    // No ordering dependency between the two parses; both must finish
    // before the handler runs.
    let (body, query) = tokio::try_join!(
        parse_body(definition, &req),
        parse_query_step(definition, &req),
    )?;

    validate(definition.body_validator.as_ref(), &body, 400, "Invalid body")?;
    validate(
        definition.query_validator.as_ref(),
        &query,
        400,
        "Invalid query",
    )?;

    let extra = config
        .extra_api
        .as_ref()
        .map(|extra_api| extra_api(&req, definition.extra_options.as_ref()));

    let ctx = HandlerContext {
        req: Arc::clone(&req),
        body,
        query,
        authentication,
        extra,
        res: res.clone(),
    };
    let reply = (definition.handler)(ctx).await?;

    if reply == Reply::Sent || res.writable_ended() {
        return Ok(());
    }
    let response_validator = definition.response_validator.as_ref();
    match reply {
        Reply::Success(success) => {
            validate(response_validator, &success.payload, 500, "Invalid response")?;
            res.status(success.status_code).json(&success.payload);
        }
        Reply::Value(value) => {
            validate(response_validator, &value, 500, "Invalid response")?;
            res.status(StatusCode::OK).json(&value);
        }
        Reply::Empty => {
            validate(response_validator, &Value::Null, 500, "Invalid response")?;
            res.status(StatusCode::NO_CONTENT).end();
        }
        Reply::Sent => {}
    }
    Ok(())
}

async fn parse_body(
    definition: &MethodDefinition,
    req: &Arc<ApiRequest>,
) -> Result<Value, EndpointError> {
    match &definition.body_parser {
        Some(parser) => parser(req.body().clone(), Arc::clone(req)).await,
        None => req.body_json().map_err(EndpointError::from),
    }
}

async fn parse_query_step(
    definition: &MethodDefinition,
    req: &Arc<ApiRequest>,
) -> Result<Value, EndpointError> {
    match &definition.query_parser {
        Some(parser) => parser(req.query().clone(), Arc::clone(req)).await,
        None => Ok(req.query_value()),
    }
}

fn validate(
    validator: Option<&ValidatorFn>,
    value: &Value,
    default_code: u16,
    default_message: &str,
) -> Result<(), EndpointError> {
    if let Some(validator) = validator {
        if !validator(value)? {
            return Err(fail_with_code(default_code, default_message).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::MethodDefinition;
    use bytes::Bytes;
    use http::{header, HeaderMap, HeaderValue, Method, Uri};
    use serde_json::json;

    fn json_request(body: &str) -> Arc<ApiRequest> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Arc::new(ApiRequest::new(
            Method::POST,
            Uri::from_static("/v1/test?tag=blue"),
            headers,
            Bytes::from(body.to_owned()),
        ))
    }

    async fn run_pipeline(
        config: &FactoryConfig,
        definition: &MethodDefinition,
        req: Arc<ApiRequest>,
    ) -> http::Response<Bytes> {
        let res = ResponseWriter::new();
        execute_definition(config, definition, false, req, &res).await;
        res.into_response()
    }

    fn body_of(response: &http::Response<Bytes>) -> Value {
        match serde_json::from_slice(response.body()) {
            Ok(v) => v,
            Err(e) => panic!("response body is not JSON: {e}"),
        }
    }

    #[tokio::test]
    async fn default_parsers_expose_json_body_and_query_object() {
        let definition = MethodDefinition::new(|ctx: HandlerContext| async move {
            assert_eq!(ctx.body, json!({ "a": 1 }));
            assert_eq!(ctx.query, json!({ "tag": "blue" }));
            Ok(json!("ok"))
        });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("{\"a\":1}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_of(&response), json!("ok"));
    }

    #[tokio::test]
    async fn empty_reply_writes_204_with_empty_body() {
        let definition = MethodDefinition::new(|_ctx| async { Ok(()) });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn coded_failure_writes_its_status_and_serialized_message() {
        let definition = MethodDefinition::new(|_ctx| async {
            Err::<Reply, _>(fail_with_code(400, "Invalid body").into())
        });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&response)["message"], json!("Invalid body"));
    }

    #[tokio::test]
    async fn unclassified_error_writes_500() {
        let definition = MethodDefinition::new(|_ctx| async {
            Err::<Reply, _>(EndpointError::internal("No body provided"))
        });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(&response)["message"], json!("No body provided"));
    }

    #[tokio::test]
    async fn sentinel_leaves_direct_write_untouched() {
        let definition = MethodDefinition::new(|ctx: HandlerContext| async move {
            ctx.res.status(StatusCode::RESET_CONTENT).json(&json!("foo"));
            Ok(Reply::Sent)
        });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::RESET_CONTENT);
        assert_eq!(body_of(&response), json!("foo"));
    }

    #[tokio::test]
    async fn ended_writer_suppresses_classification_even_without_sentinel() {
        let definition = MethodDefinition::new(|ctx: HandlerContext| async move {
            ctx.res.status(StatusCode::RESET_CONTENT).json(&json!("foo"));
            Ok(json!("ignored"))
        });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::RESET_CONTENT);
        assert_eq!(body_of(&response), json!("foo"));
    }

    #[tokio::test]
    async fn body_validator_false_rejects_with_default_message() {
        let definition = MethodDefinition::new(|_ctx| async { Ok(json!("unreachable")) })
            .body_validator(|body| Ok(body == &json!("foo")));
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("\"bar\"")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&response)["message"], json!("Invalid body"));
    }

    #[tokio::test]
    async fn query_validator_false_rejects_with_default_message() {
        let definition = MethodDefinition::new(|_ctx| async { Ok(json!("unreachable")) })
            .query_validator(|query| Ok(query["tag"] == json!("red")));
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&response)["message"], json!("Invalid query"));
    }

    #[tokio::test]
    async fn response_validator_false_rejects_with_500() {
        let definition = MethodDefinition::new(|_ctx| async { Ok(json!("hi")) })
            .response_validator(|response| Ok(response == &json!("bye")));
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(&response)["message"], json!("Invalid response"));
    }

    #[tokio::test]
    async fn response_validator_coded_failure_keeps_its_code() {
        let definition = MethodDefinition::new(|_ctx| async { Ok(json!("hi")) })
            .response_validator(|response| {
                if response == &json!("bye") {
                    Ok(true)
                } else {
                    Err(fail_with_code(404, "Whoopsie").into())
                }
            });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(&response)["message"], json!("Whoopsie"));
    }

    #[tokio::test]
    async fn body_parser_failure_short_circuits_before_handler() {
        // If the handler ran anyway, the 500 below would replace the 400.
        let definition = MethodDefinition::new(|_ctx| async {
            Err::<Reply, _>(EndpointError::internal("handler must not run"))
        })
        .body_parser(|_body, _req| async { Err(fail_with_code(400, "Invalid body").into()) });
        let response = run_pipeline(&FactoryConfig::new(), &definition, json_request("{}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&response)["message"], json!("Invalid body"));
    }

    #[tokio::test]
    async fn extra_api_receives_the_definitions_extra_options() {
        let config = FactoryConfig::new().extra_api(|_req, options| {
            json!({ "has_options": options.is_some() })
        });
        let definition = MethodDefinition::new(|ctx: HandlerContext| async move {
            Ok(ctx.extra.unwrap_or(Value::Null))
        })
        .extra_options(json!({ "include": true }));
        let response = run_pipeline(&config, &definition, json_request("")).await;
        assert_eq!(body_of(&response), json!({ "has_options": true }));
    }
}
