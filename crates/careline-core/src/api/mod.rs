//! Authenticated HTTP request pipeline.
//!
//! This module provides the `ApiClient` that every caller goes through,
//! the `RequestDescriptor` it accepts, and the closed `ErrorKind`
//! taxonomy that failures are classified into.
//!
//! The API uses JWT bearer authentication; the credential is read from
//! the shared `SessionStore` for each call.

pub mod client;
pub mod error;
pub mod request;

use serde_json::Value;

pub use client::ApiClient;
pub use error::{classify, ApiError, ErrorKind};
pub use request::{Body, Method, RequestDescriptor};

/// Terminal result of a single call.
pub type Outcome<T = Value> = Result<T, ApiError>;
