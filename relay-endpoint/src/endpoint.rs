//! Endpoint factory, builder, and the per-request method router.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use indexmap::IndexMap;

use relay_core::{ApiRequest, ResponseWriter};

use crate::config::FactoryConfig;
use crate::decorate::{decorate_handler, Decorator, EndpointHandler};
use crate::definition::MethodDefinition;
use crate::execute::execute_definition;

/// Errors detected while building an [`Endpoint`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    /// `OPTIONS` is answered by the router itself and cannot be defined.
    #[error("method OPTIONS cannot be given a handler")]
    ReservedMethod,
}

/// Hands out endpoint builders sharing one [`FactoryConfig`].
#[derive(Clone)]
pub struct EndpointFactory {
    config: Arc<FactoryConfig>,
}

impl EndpointFactory {
    /// Create a factory from its deployment-wide configuration.
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Start defining an endpoint.
    #[must_use]
    pub fn endpoint(&self) -> EndpointBuilder {
        EndpointBuilder {
            config: Arc::clone(&self.config),
            methods: IndexMap::new(),
            default: None,
            disable_authentication: false,
            decorators: Vec::new(),
        }
    }
}

impl Default for EndpointFactory {
    fn default() -> Self {
        Self::new(FactoryConfig::new())
    }
}

/// Builder for a single endpoint's method mapping and options.
pub struct EndpointBuilder {
    config: Arc<FactoryConfig>,
    methods: IndexMap<Method, MethodDefinition>,
    default: Option<MethodDefinition>,
    disable_authentication: bool,
    decorators: Vec<Box<dyn Decorator>>,
}

impl EndpointBuilder {
    /// Define the handler for a method. Declaration order is preserved and
    /// reflected in the `Allow` header.
    #[must_use]
    pub fn method(mut self, method: Method, definition: MethodDefinition) -> Self {
        self.methods.insert(method, definition);
        self
    }

    /// Conditionally define a handler; `None` behaves as if the method was
    /// never mentioned.
    #[must_use]
    pub fn method_opt(self, method: Method, definition: Option<MethodDefinition>) -> Self {
        match definition {
            Some(definition) => self.method(method, definition),
            None => self,
        }
    }

    /// Catch-all definition used when the requested method has no specific
    /// handler.
    #[must_use]
    pub fn default_method(mut self, definition: MethodDefinition) -> Self {
        self.default = Some(definition);
        self
    }

    /// Skip the factory's authenticator for this endpoint; handlers see
    /// `authentication: None`.
    #[must_use]
    pub fn disable_authentication(mut self) -> Self {
        self.disable_authentication = true;
        self
    }

    /// Add a decorator. Decorators apply right to left: the first added
    /// observes the request first.
    #[must_use]
    pub fn decorate(mut self, decorator: impl Decorator + 'static) -> Self {
        self.decorators.push(Box::new(decorator));
        self
    }

    /// Build the immutable endpoint.
    ///
    /// # Errors
    /// Returns [`BuildError::ReservedMethod`] if `OPTIONS` was given a
    /// definition.
    pub fn build(self) -> Result<Endpoint, BuildError> {
        if self.methods.contains_key(&Method::OPTIONS) {
            return Err(BuildError::ReservedMethod);
        }
        let inner = Arc::new(EndpointInner {
            config: self.config,
            methods: self.methods,
            default: self.default,
            disable_authentication: self.disable_authentication,
        });
        let routed: EndpointHandler = {
            let inner = Arc::clone(&inner);
            Arc::new(move |req| {
                let inner = Arc::clone(&inner);
                Box::pin(async move { route(inner, req).await })
            })
        };
        let handler = decorate_handler(routed, &self.decorators);
        Ok(Endpoint { inner, handler })
    }
}

struct EndpointInner {
    config: Arc<FactoryConfig>,
    methods: IndexMap<Method, MethodDefinition>,
    default: Option<MethodDefinition>,
    disable_authentication: bool,
}

/// An immutable endpoint: the method mapping plus the decorated combined
/// handler. Cheap to clone; built once at startup.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
    handler: EndpointHandler,
}

impl Endpoint {
    /// Route and execute one request, producing the final response.
    pub async fn handle(&self, req: ApiRequest) -> http::Response<Bytes> {
        (self.handler)(req).await
    }

    /// Methods with a specific definition, in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.inner.methods.keys()
    }

    /// Whether the given method has a specific definition.
    #[must_use]
    pub fn has_method(&self, method: &Method) -> bool {
        self.inner.methods.contains_key(method)
    }

    /// The `Allow` header value: declared methods, uppercase, comma-joined,
    /// in declaration order.
    #[must_use]
    pub fn allow_header(&self) -> String {
        allow_header_value(&self.inner.methods)
    }
}

async fn route(inner: Arc<EndpointInner>, req: ApiRequest) -> http::Response<Bytes> {
    let res = ResponseWriter::new();
    if req.method() == Method::OPTIONS {
        res.set_header(header::ALLOW, allow_header(&inner.methods));
        res.status(StatusCode::NO_CONTENT).end();
    } else if let Some(definition) = inner.methods.get(req.method()) {
        execute_definition(
            &inner.config,
            definition,
            inner.disable_authentication,
            Arc::new(req),
            &res,
        )
        .await;
    } else if let Some(definition) = &inner.default {
        execute_definition(
            &inner.config,
            definition,
            inner.disable_authentication,
            Arc::new(req),
            &res,
        )
        .await;
    } else {
        res.set_header(header::ALLOW, allow_header(&inner.methods));
        res.status(StatusCode::METHOD_NOT_ALLOWED).end();
    }
    res.into_response()
}

fn allow_header_value(methods: &IndexMap<Method, MethodDefinition>) -> String {
    methods
        .keys()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn allow_header(methods: &IndexMap<Method, MethodDefinition>) -> HeaderValue {
    // Method names are always valid header characters.
    HeaderValue::from_str(&allow_header_value(methods))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}
