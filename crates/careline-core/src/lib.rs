//! Client-side session and request layer for careline.
//!
//! - `auth`: credential storage, token validation, session lifecycle
//! - `api`: authenticated request pipeline and error classification
//! - `notify`: routing of outcomes to user-visible notifications
//! - `services`: callers of remote services built on the pipeline

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notify;
pub mod services;

pub use api::{ApiClient, ApiError, ErrorKind, Outcome, RequestDescriptor};
pub use auth::{Session, SessionContext, SessionStore};
pub use config::Config;
pub use notify::{NotificationEvent, NotificationRouter, NotificationSink, Severity};
