use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError, RequestDescriptor};
use crate::notify::{NotificationEvent, Severity};

/// Upper bound on text length accepted by the service.
const MAX_TEXT_LENGTH: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpellCheckTarget {
    CaseNote,
    Incident,
}

impl SpellCheckTarget {
    fn endpoint(&self) -> &'static str {
        match self {
            SpellCheckTarget::CaseNote => "/api/ai-spellcheck/case-note",
            SpellCheckTarget::Incident => "/api/ai-spellcheck/incident",
        }
    }

    fn min_length(&self) -> usize {
        match self {
            SpellCheckTarget::CaseNote => 100,
            SpellCheckTarget::Incident => 50,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SpellCheckTarget::CaseNote => "Case note",
            SpellCheckTarget::Incident => "Incident narrative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellCheckResponse {
    pub corrected: String,
    pub original_length: usize,
    pub corrected_length: usize,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpellCheckError {
    #[error("{label} must be at least {min} characters for spell checking")]
    TooShort { label: &'static str, min: usize },

    #[error("{label} is too long for spell checking (max {max} characters)")]
    TooLong { label: &'static str, max: usize },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Caller of the spell-check endpoints with its own notification policy.
#[derive(Clone)]
pub struct SpellCheckClient {
    api: ApiClient,
}

impl SpellCheckClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Validate `text` locally, then submit it for correction.
    pub async fn check(
        &self,
        target: SpellCheckTarget,
        text: &str,
    ) -> Result<SpellCheckResponse, SpellCheckError> {
        if let Err(e) = Self::validate(target, text) {
            let title = match e {
                SpellCheckError::TooShort { .. } => "Text Too Short",
                _ => "Text Too Long",
            };
            self.notify(Severity::Error, title, format!("{}.", e));
            return Err(e);
        }

        debug!(endpoint = target.endpoint(), length = text.len(), "Submitting spell check");
        let request = RequestDescriptor::post(target.endpoint())
            .body(json!({ "text": text }))
            .suppress_notification(true);

        let result = self
            .api
            .send(request)
            .await
            .and_then(|value| {
                serde_json::from_value::<SpellCheckResponse>(value)
                    .map_err(|e| ApiError::unexpected_payload("spell check", &e))
            });

        match result {
            Ok(response) => {
                self.notify(
                    Severity::Success,
                    "Spell Check Complete",
                    format!(
                        "Reviewed {} characters. Ready to apply corrections.",
                        response.original_length
                    ),
                );
                Ok(response)
            }
            Err(err) => {
                let description = if err.message.is_empty() {
                    "Unable to check spelling. Please try again.".to_string()
                } else {
                    err.message.clone()
                };
                self.notify(Severity::Error, "Spell Check Failed", description);
                Err(err.into())
            }
        }
    }

    fn validate(target: SpellCheckTarget, text: &str) -> Result<(), SpellCheckError> {
        if text.trim().chars().count() < target.min_length() {
            return Err(SpellCheckError::TooShort {
                label: target.label(),
                min: target.min_length(),
            });
        }
        if text.chars().count() > MAX_TEXT_LENGTH {
            return Err(SpellCheckError::TooLong {
                label: target.label(),
                max: MAX_TEXT_LENGTH,
            });
        }
        Ok(())
    }

    fn notify(&self, severity: Severity, title: &str, description: String) {
        self.api
            .router()
            .show(NotificationEvent::new(severity, title, Some(description)));
    }
}

/// Whether the corrected text differs from what was submitted.
pub fn has_changes(original: &str, corrected: &str) -> bool {
    original.trim() != corrected.trim()
}
