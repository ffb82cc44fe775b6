//! User-visible notifications.
//!
//! The `NotificationRouter` maps request outcomes and standard
//! operation/entity messages onto `NotificationEvent`s and hands them to a
//! `NotificationSink`. Two sinks are provided: `ToastStack` (in-memory,
//! most recent on top) and `TracingSink` (writes to the log).

pub mod router;
pub mod sink;
pub mod templates;

pub use router::NotificationRouter;
pub use sink::{
    NotificationEvent, NotificationSink, Severity, ToastHandle, ToastId, ToastStack, TracingSink,
};
pub use templates::{standard_message, StandardMessage};
