//! Typed endpoint factory and request execution pipeline.
//!
//! Wraps an HTTP request-handler convention with validation, authentication,
//! and error-formatting scaffolding: build an [`EndpointFactory`] once per
//! deployment, define per-method handlers, and let the pipeline sequence
//! authenticate → parse → validate → invoke → classify → serialize for every
//! request.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod config;
pub mod decorate;
pub mod definition;
pub mod endpoint;
pub mod execute;

pub use auth::Authenticator;
pub use config::{ExtraApiFn, FactoryConfig, SerializeErrorFn};
pub use decorate::{Decorator, EndpointHandler};
pub use definition::{BoxFuture, HandlerContext, HandlerResult, MethodDefinition};
pub use endpoint::{BuildError, Endpoint, EndpointBuilder, EndpointFactory};
pub use execute::execute_definition;

pub use relay_core::{
    fail_with_code, mini_serialize_error, succeed_with_code, ApiRequest, EndpointError, Failure,
    Reply, ResponseWriter, SerializedError, Success,
};
