//! Demonstration HTTP gateway for the relay endpoint library.
//!
//! Mounts a small note API built entirely with relay endpoints behind an
//! axum server: token authentication, body validation, extra request
//! context, and direct response writes are all exercised end to end.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod routes;
pub mod store;
