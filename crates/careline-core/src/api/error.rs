use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure categories shared by user messaging and control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    Validation,
    ServerError,
    NetworkError,
    NotFound,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Unauthenticated,
        ErrorKind::Forbidden,
        ErrorKind::Validation,
        ErrorKind::ServerError,
        ErrorKind::NetworkError,
        ErrorKind::NotFound,
        ErrorKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Validation => "validation",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an HTTP status to an [`ErrorKind`].
///
/// `None` means the request failed before any response arrived (DNS,
/// refused connection, TLS). Only the status is consulted; response bodies
/// never change the kind.
pub fn classify(status: Option<u16>) -> ErrorKind {
    match status {
        None => ErrorKind::NetworkError,
        Some(400) => ErrorKind::Validation,
        Some(401) => ErrorKind::Unauthenticated,
        Some(403) => ErrorKind::Forbidden,
        Some(404) => ErrorKind::NotFound,
        Some(s) if s >= 500 => ErrorKind::ServerError,
        Some(_) => ErrorKind::Unknown,
    }
}

/// Terminal failure of a single pipeline call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Structured error payload returned by the server on non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    message: Option<String>,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind: classify(status),
            status,
            message: message.into(),
        }
    }

    /// Failure raised before a response was received.
    pub fn network(err: &reqwest::Error) -> Self {
        Self::new(None, format!("Network error: {}", err))
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build a failure from a non-success response.
    ///
    /// The message comes from the `error` (or `message`) field of a JSON
    /// body. A body that is not JSON at all yields `HTTP <status>: <reason>`;
    /// JSON without either field yields `HTTP <status>`.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        let message = match serde_json::from_str::<ErrorPayload>(body) {
            Ok(payload) => payload
                .error
                .or(payload.message)
                .filter(|m| !m.is_empty())
                .map(|m| Self::truncate_body(&m))
                .unwrap_or_else(|| format!("HTTP {}", code)),
            Err(_) => format!(
                "HTTP {}: {}",
                code,
                status.canonical_reason().unwrap_or_default()
            ),
        };
        Self::new(Some(code), message)
    }

    /// A success status whose body could not be decoded.
    pub fn invalid_body(status: reqwest::StatusCode, body: &str) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: Some(status.as_u16()),
            message: format!("Invalid response: {}", Self::truncate_body(body)),
        }
    }

    /// A success payload that does not have the shape the caller expects.
    pub fn unexpected_payload(what: &str, err: &serde_json::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            status: None,
            message: format!("Unexpected {} payload: {}", what, err),
        }
    }

    /// The stored credential was found expired without a request.
    pub fn session_expired() -> Self {
        Self {
            kind: ErrorKind::Unauthenticated,
            status: None,
            message: "Session expired".to_string(),
        }
    }

    /// Whether the message was synthesized from the status line rather
    /// than supplied by the server.
    pub fn is_synthesized_message(&self) -> bool {
        match self.status {
            Some(code) => {
                let bare = format!("HTTP {}", code);
                self.message == bare || self.message.starts_with(&format!("{}:", bare))
            }
            None => false,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        self.kind == ErrorKind::Unauthenticated
    }
}
