//! Core types for the relay endpoint pipeline.
//!
//! Defines the handler outcome signals, the pipeline error taxonomy, the
//! default error serializer, and the request/response primitives shared by
//! every layer.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod request;
pub mod response;
pub mod serialize;
pub mod signal;

pub use error::EndpointError;
pub use request::{parse_query, ApiRequest};
pub use response::ResponseWriter;
pub use serialize::{mini_serialize_error, SerializedError};
pub use signal::{fail_with_code, succeed_with_code, Failure, Reply, Success};
