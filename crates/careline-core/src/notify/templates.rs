//! Static message catalog consumed by the notification router.

use crate::api::ErrorKind;

/// Fixed title and description for a failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTemplate {
    pub title: &'static str,
    pub description: &'static str,
    /// Whether the server-supplied message replaces `description`.
    pub use_server_message: bool,
}

pub fn failure_template(kind: ErrorKind) -> FailureTemplate {
    match kind {
        ErrorKind::Unauthenticated => FailureTemplate {
            title: "Authentication Required",
            description: "Your session has expired. Please log in again.",
            use_server_message: false,
        },
        ErrorKind::Forbidden => FailureTemplate {
            title: "Access Denied",
            description: "You don't have permission to perform this action. Contact your administrator if you believe this is an error.",
            use_server_message: false,
        },
        ErrorKind::Validation => FailureTemplate {
            title: "Validation Failed",
            description: "Please check all required fields and try again.",
            use_server_message: true,
        },
        ErrorKind::NotFound => FailureTemplate {
            title: "Not Found",
            description: "The requested resource could not be found. It may have been moved or deleted.",
            use_server_message: true,
        },
        ErrorKind::ServerError => FailureTemplate {
            title: "Server Error",
            description: "A server error occurred. Please try again in a few moments or contact support.",
            use_server_message: false,
        },
        ErrorKind::NetworkError => FailureTemplate {
            title: "Connection Error",
            description: "Unable to connect to the server. Please check your internet connection and try again.",
            use_server_message: false,
        },
        ErrorKind::Unknown => FailureTemplate {
            title: "Request Failed",
            description: "An unexpected error occurred. Please try again.",
            use_server_message: true,
        },
    }
}

/// Operation/entity pair rendered as a standard message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardMessage {
    pub operation: String,
    pub entity: String,
    pub details: Option<String>,
}

impl StandardMessage {
    pub fn new(operation: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            entity: entity.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Predefined messages keyed by a stable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub operation: &'static str,
    pub entity: &'static str,
    pub details: &'static str,
}

impl From<&CatalogEntry> for StandardMessage {
    fn from(entry: &CatalogEntry) -> Self {
        StandardMessage::new(entry.operation, entry.entity).with_details(entry.details)
    }
}

pub const STANDARD_MESSAGES: &[CatalogEntry] = &[
    CatalogEntry { key: "LOGIN_SUCCESS", operation: "Successful", entity: "Login", details: "You have been logged in successfully." },
    CatalogEntry { key: "LOGOUT_SUCCESS", operation: "Successful", entity: "Logout", details: "You have been logged out successfully." },
    CatalogEntry { key: "SESSION_EXPIRED", operation: "Expired", entity: "Session", details: "Your session has expired. Please log in again." },
    CatalogEntry { key: "USER_CREATED", operation: "Created", entity: "User", details: "New user account has been created successfully." },
    CatalogEntry { key: "USER_UPDATED", operation: "Updated", entity: "User", details: "User information has been updated successfully." },
    CatalogEntry { key: "CLIENT_CREATED", operation: "Created", entity: "Client", details: "New client profile has been created successfully." },
    CatalogEntry { key: "CLIENT_UPDATED", operation: "Updated", entity: "Client", details: "Client information has been updated successfully." },
    CatalogEntry { key: "CASE_NOTE_CREATED", operation: "Created", entity: "Case Note", details: "New case note has been saved successfully." },
    CatalogEntry { key: "CASE_NOTE_UPDATED", operation: "Updated", entity: "Case Note", details: "Case note has been updated successfully." },
    CatalogEntry { key: "INCIDENT_CREATED", operation: "Created", entity: "Incident Report", details: "Incident report has been submitted successfully." },
    CatalogEntry { key: "INCIDENT_RESOLVED", operation: "Resolved", entity: "Incident", details: "Incident has been marked as resolved successfully." },
    CatalogEntry { key: "MEDICATION_ADMINISTERED", operation: "Administered", entity: "Medication", details: "Medication administration has been recorded successfully." },
    CatalogEntry { key: "FILE_UPLOADED", operation: "Uploaded", entity: "File", details: "File has been uploaded successfully." },
    CatalogEntry { key: "PERMISSION_DENIED", operation: "Denied", entity: "Permission", details: "You don't have permission to perform this action." },
];

pub fn standard_message(key: &str) -> Option<StandardMessage> {
    STANDARD_MESSAGES
        .iter()
        .find(|entry| entry.key == key)
        .map(StandardMessage::from)
}

pub fn success_text(msg: &StandardMessage) -> (String, String) {
    let title = format!("{} {}", msg.entity, msg.operation);
    let description = msg.details.clone().unwrap_or_else(|| {
        format!(
            "{} has been {} successfully.",
            msg.entity,
            msg.operation.to_lowercase()
        )
    });
    (title, description)
}

pub fn error_text(msg: &StandardMessage) -> (String, String) {
    let title = format!("Failed to {} {}", msg.operation, msg.entity);
    let description = msg.details.clone().unwrap_or_else(|| {
        format!(
            "Unable to {} the {}. Please try again.",
            msg.operation.to_lowercase(),
            msg.entity.to_lowercase()
        )
    });
    (title, description)
}

pub fn warning_text(msg: &StandardMessage) -> (String, String) {
    let title = format!("{} {} Warning", msg.entity, msg.operation);
    let description = msg.details.clone().unwrap_or_else(|| {
        format!(
            "{} completed with warnings for {}.",
            msg.operation,
            msg.entity.to_lowercase()
        )
    });
    (title, description)
}

pub fn info_text(msg: &StandardMessage) -> (String, String) {
    let title = format!("{} {}", msg.entity, msg.operation);
    let description = msg.details.clone().unwrap_or_else(|| {
        format!(
            "{} information for {}.",
            msg.operation,
            msg.entity.to_lowercase()
        )
    });
    (title, description)
}
