//! Per-method handler definitions and the handler's input context.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;

use relay_core::{ApiRequest, EndpointError, Reply, ResponseWriter};

/// Boxed future used across the handler plumbing.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Outcome of a handler invocation, before classification.
pub type HandlerResult = Result<Reply, EndpointError>;

/// Type-erased method handler.
pub type MethodHandler = Arc<dyn Fn(HandlerContext) -> BoxFuture<HandlerResult> + Send + Sync>;

/// Async transform-or-reject function for the raw request body.
pub type BodyParser =
    Arc<dyn Fn(Bytes, Arc<ApiRequest>) -> BoxFuture<Result<Value, EndpointError>> + Send + Sync>;

/// Async transform-or-reject function for the raw query mapping.
pub type QueryParser = Arc<
    dyn Fn(IndexMap<String, String>, Arc<ApiRequest>) -> BoxFuture<Result<Value, EndpointError>>
        + Send
        + Sync,
>;

/// Sync check run against the parsed body/query or the handler's response.
///
/// `Ok(false)` rejects with the stage's default coded failure; `Err` rejects
/// with the error it carries.
pub type ValidatorFn = Arc<dyn Fn(&Value) -> Result<bool, EndpointError> + Send + Sync>;

/// Everything a handler receives for one request.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// The inbound request.
    pub req: Arc<ApiRequest>,
    /// Parsed (or default-interpreted) body.
    pub body: Value,
    /// Parsed query.
    pub query: Value,
    /// Authenticator output; `None` when authentication is disabled or not
    /// configured.
    pub authentication: Option<Value>,
    /// Extra context computed by the factory's `extra_api`.
    pub extra: Option<Value>,
    /// Shared writer for responding directly; return [`Reply::Sent`] after
    /// using it.
    pub res: ResponseWriter,
}

/// A single method's handler plus its parse/validate configuration.
#[derive(Clone)]
pub struct MethodDefinition {
    pub(crate) handler: MethodHandler,
    pub(crate) body_parser: Option<BodyParser>,
    pub(crate) query_parser: Option<QueryParser>,
    pub(crate) body_validator: Option<ValidatorFn>,
    pub(crate) query_validator: Option<ValidatorFn>,
    pub(crate) response_validator: Option<ValidatorFn>,
    pub(crate) extra_options: Option<Value>,
}

impl MethodDefinition {
    /// Define a method from its handler.
    ///
    /// The handler may resolve to anything convertible into a [`Reply`]:
    /// `()` for 204, a JSON value for 200, a
    /// [`Success`](relay_core::Success) for an explicit code, or
    /// [`Reply::Sent`] after writing through the context's writer.
    pub fn new<F, Fut, R>(handler: F) -> Self
    where
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, EndpointError>> + Send + 'static,
        R: Into<Reply>,
    {
        let handler: MethodHandler = Arc::new(move |ctx| {
            let fut = handler(ctx);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        Self {
            handler,
            body_parser: None,
            query_parser: None,
            body_validator: None,
            query_validator: None,
            response_validator: None,
            extra_options: None,
        }
    }

    /// Replace the default body interpretation with a parser.
    ///
    /// The parser receives the raw body bytes and the request; reject with a
    /// coded failure (400 by convention) or any other error for a 500.
    #[must_use]
    pub fn body_parser<F, Fut>(mut self, parser: F) -> Self
    where
        F: Fn(Bytes, Arc<ApiRequest>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EndpointError>> + Send + 'static,
    {
        let parser: BodyParser = Arc::new(move |body, req| Box::pin(parser(body, req)));
        self.body_parser = Some(parser);
        self
    }

    /// Replace the default query interpretation with a parser.
    #[must_use]
    pub fn query_parser<F, Fut>(mut self, parser: F) -> Self
    where
        F: Fn(IndexMap<String, String>, Arc<ApiRequest>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EndpointError>> + Send + 'static,
    {
        let parser: QueryParser = Arc::new(move |query, req| Box::pin(parser(query, req)));
        self.query_parser = Some(parser);
        self
    }

    /// Check the parsed body; `Ok(false)` rejects with 400 "Invalid body".
    #[must_use]
    pub fn body_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, EndpointError> + Send + Sync + 'static,
    {
        self.body_validator = Some(Arc::new(validator));
        self
    }

    /// Check the parsed query; `Ok(false)` rejects with 400 "Invalid query".
    #[must_use]
    pub fn query_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, EndpointError> + Send + Sync + 'static,
    {
        self.query_validator = Some(Arc::new(validator));
        self
    }

    /// Check the handler's response payload; `Ok(false)` rejects with 500
    /// "Invalid response". Runs against `Null` for a 204 outcome.
    #[must_use]
    pub fn response_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, EndpointError> + Send + Sync + 'static,
    {
        self.response_validator = Some(Arc::new(validator));
        self
    }

    /// Options forwarded to the factory's `extra_api` for this method.
    #[must_use]
    pub fn extra_options(mut self, options: Value) -> Self {
        self.extra_options = Some(options);
        self
    }
}
