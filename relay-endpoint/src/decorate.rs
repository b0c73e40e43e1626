//! Decorator chain applied to the routed endpoint handler.

use std::sync::Arc;

use bytes::Bytes;

use relay_core::ApiRequest;

use crate::definition::BoxFuture;

/// Type-erased endpoint handler: request in, final response out.
pub type EndpointHandler = Arc<dyn Fn(ApiRequest) -> BoxFuture<http::Response<Bytes>> + Send + Sync>;

/// Cross-cutting wrapper around an endpoint handler.
///
/// Decorators compose right to left: `[a, b]` produces `a(b(handler))`, so
/// the first listed decorator observes the request first and can
/// short-circuit before later ones run.
pub trait Decorator: Send + Sync {
    /// Wrap `next`, returning the decorated handler.
    fn decorate(&self, next: EndpointHandler) -> EndpointHandler;
}

impl<F> Decorator for F
where
    F: Fn(EndpointHandler) -> EndpointHandler + Send + Sync,
{
    fn decorate(&self, next: EndpointHandler) -> EndpointHandler {
        self(next)
    }
}

/// Fold the decorators over `handler`, right to left.
pub(crate) fn decorate_handler(
    handler: EndpointHandler,
    decorators: &[Box<dyn Decorator>],
) -> EndpointHandler {
    decorators
        .iter()
        .rev()
        .fold(handler, |next, decorator| decorator.decorate(next))
}
