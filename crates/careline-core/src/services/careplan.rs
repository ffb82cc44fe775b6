//! Care-plan section generation.
//!
//! Validates the writer's input locally, then asks the server to draft a
//! section of a care support plan. Notifications are this caller's own; the
//! pipeline's generic failure toast is suppressed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError, RequestDescriptor};
use crate::notify::{NotificationEvent, Severity};

const ABOUT_ME_ENDPOINT: &str = "/api/care-support-plans/generate-about-me-direct";
const SECTION_ENDPOINT: &str = "/api/care-support-plans/generate-section-direct";

/// Used when the server rejects without saying why.
const GENERATION_FAILED: &str = "AI generation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarePlanSection {
    AboutMe,
    Goals,
    Adl,
    Communication,
    Routine,
    Mealtime,
    Emergency,
}

impl CarePlanSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarePlanSection::AboutMe => "aboutme",
            CarePlanSection::Goals => "goals",
            CarePlanSection::Adl => "adl",
            CarePlanSection::Communication => "communication",
            CarePlanSection::Routine => "routine",
            CarePlanSection::Mealtime => "mealtime",
            CarePlanSection::Emergency => "emergency",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CarePlanSection::AboutMe => "About Me",
            CarePlanSection::Goals => "Support Goals",
            CarePlanSection::Adl => "ADL (Activities of Daily Living)",
            CarePlanSection::Communication => "Communication Strategy",
            CarePlanSection::Routine => "Structure and Routine",
            CarePlanSection::Mealtime => "Mealtime Risk Assessment",
            CarePlanSection::Emergency => "Emergency Protocols",
        }
    }
}

impl fmt::Display for CarePlanSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bullet of the About Me section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutMePoint {
    pub point: String,
    pub order: u32,
}

impl AboutMePoint {
    pub fn new(point: impl Into<String>, order: u32) -> Self {
        Self {
            point: point.into(),
            order,
        }
    }
}

/// Who the plan is for; both fields are optional context for the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSection {
    pub section: CarePlanSection,
    pub generated_content: String,
    pub success: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarePlanAiError {
    #[error("Please provide input before using AI assistance.")]
    NoInput,

    #[error("Please ensure all points have content before using AI assistance.")]
    EmptyPoints,

    #[error("Please provide content before using AI assistance.")]
    EmptyInput,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CarePlanAiError {
    /// Notification title for a locally rejected input.
    fn title(&self) -> &'static str {
        match self {
            CarePlanAiError::NoInput => "No Input Provided",
            CarePlanAiError::EmptyPoints => "Empty Points",
            CarePlanAiError::EmptyInput => "Empty Input",
            CarePlanAiError::Api(_) => "AI Generation Failed",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AboutMeRequest<'a> {
    user_points: &'a [AboutMePoint],
    #[serde(flatten)]
    subject: &'a PlanSubject,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SectionRequest<'a> {
    section_type: CarePlanSection,
    user_input: &'a Value,
    #[serde(flatten)]
    subject: &'a PlanSubject,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AboutMeResponse {
    about_me_elaboration: String,
    #[serde(default)]
    success: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionResponse {
    generated_content: String,
    #[serde(default)]
    success: bool,
}

/// Caller of the care-plan generation endpoints.
#[derive(Clone)]
pub struct CarePlanAiClient {
    api: ApiClient,
}

impl CarePlanAiClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Draft the About Me section from the writer's points. Blank points
    /// are dropped before sending.
    pub async fn generate_about_me(
        &self,
        points: &[AboutMePoint],
        subject: &PlanSubject,
    ) -> Result<GeneratedSection, CarePlanAiError> {
        let points = match Self::usable_points(points) {
            Ok(points) => points,
            Err(e) => return Err(self.reject(e)),
        };

        let body = AboutMeRequest {
            user_points: &points,
            subject,
        };
        let result = self
            .post(ABOUT_ME_ENDPOINT, &body, CarePlanSection::AboutMe)
            .await
            .and_then(|value| {
                let response: AboutMeResponse = serde_json::from_value(value)
                    .map_err(|e| ApiError::unexpected_payload("about me", &e))?;
                Ok(GeneratedSection {
                    section: CarePlanSection::AboutMe,
                    generated_content: response.about_me_elaboration,
                    success: response.success,
                })
            });
        self.finish(result)
    }

    /// Draft any section. The About Me section expects a list of points
    /// and is handed to [`generate_about_me`](Self::generate_about_me).
    pub async fn generate_section(
        &self,
        section: CarePlanSection,
        input: &Value,
        subject: &PlanSubject,
    ) -> Result<GeneratedSection, CarePlanAiError> {
        if section == CarePlanSection::AboutMe {
            let points: Vec<AboutMePoint> = match serde_json::from_value(input.clone()) {
                Ok(points) => points,
                Err(_) => return Err(self.reject(CarePlanAiError::NoInput)),
            };
            return self.generate_about_me(&points, subject).await;
        }

        if let Err(e) = Self::validate_input(input) {
            return Err(self.reject(e));
        }

        let body = SectionRequest {
            section_type: section,
            user_input: input,
            subject,
        };
        let result = self.post(SECTION_ENDPOINT, &body, section).await.and_then(|value| {
            let response: SectionResponse = serde_json::from_value(value)
                .map_err(|e| ApiError::unexpected_payload("care plan section", &e))?;
            Ok(GeneratedSection {
                section,
                generated_content: response.generated_content,
                success: response.success,
            })
        });
        self.finish(result)
    }

    fn usable_points(points: &[AboutMePoint]) -> Result<Vec<AboutMePoint>, CarePlanAiError> {
        if points.is_empty() {
            return Err(CarePlanAiError::NoInput);
        }
        let usable: Vec<_> = points
            .iter()
            .filter(|p| !p.point.trim().is_empty())
            .cloned()
            .collect();
        if usable.is_empty() {
            return Err(CarePlanAiError::EmptyPoints);
        }
        Ok(usable)
    }

    fn validate_input(input: &Value) -> Result<(), CarePlanAiError> {
        match input {
            Value::Null => Err(CarePlanAiError::NoInput),
            Value::String(s) if s.is_empty() => Err(CarePlanAiError::NoInput),
            Value::String(s) if s.trim().is_empty() => Err(CarePlanAiError::EmptyInput),
            _ => Ok(()),
        }
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
        section: CarePlanSection,
    ) -> Result<Value, ApiError> {
        debug!(endpoint, section = %section, "Requesting care plan generation");
        let request = RequestDescriptor::post(endpoint)
            .json(body)
            .map_err(|e| ApiError::unexpected_payload("care plan request", &e))?
            .suppress_notification(true);

        self.api.send(request).await.map_err(|mut err| {
            if err.is_synthesized_message() {
                err.message = GENERATION_FAILED.to_string();
            }
            err
        })
    }

    fn finish(
        &self,
        result: Result<GeneratedSection, ApiError>,
    ) -> Result<GeneratedSection, CarePlanAiError> {
        match result {
            Ok(generated) => {
                self.notify(
                    Severity::Success,
                    "AI Generation Complete",
                    format!(
                        "{} section has been enhanced with AI assistance.",
                        generated.section.display_name()
                    ),
                );
                Ok(generated)
            }
            Err(err) => {
                let description = if err.message.is_empty() {
                    "Unable to generate AI content. Please try again.".to_string()
                } else {
                    err.message.clone()
                };
                self.notify(Severity::Error, "AI Generation Failed", description);
                Err(err.into())
            }
        }
    }

    fn reject(&self, err: CarePlanAiError) -> CarePlanAiError {
        self.notify(Severity::Error, err.title(), err.to_string());
        err
    }

    fn notify(&self, severity: Severity, title: &str, description: String) {
        self.api
            .router()
            .show(NotificationEvent::new(severity, title, Some(description)));
    }
}
