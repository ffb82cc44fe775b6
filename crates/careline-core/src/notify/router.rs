use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use super::sink::{NotificationEvent, NotificationSink, Severity, ToastHandle};
use super::templates::{self, StandardMessage};
use crate::api::ApiError;

/// Description shown under a loading placeholder.
const LOADING_DESCRIPTION: &str = "Please wait...";

/// Turns outcomes into notifications. Cheap to clone; all clones share
/// the same sink.
#[derive(Clone)]
pub struct NotificationRouter {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationRouter {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Show a raw event.
    pub fn show(&self, event: NotificationEvent) -> ToastHandle {
        let id = self.sink.show(event);
        ToastHandle::new(id, self.sink.clone())
    }

    fn emit(&self, severity: Severity, (title, description): (String, String)) {
        self.show(NotificationEvent::new(severity, title, Some(description)));
    }

    /// One error notification for a failed request.
    pub fn failure(&self, err: &ApiError) {
        let template = templates::failure_template(err.kind);
        let description = if template.use_server_message && !err.message.is_empty() {
            err.message.clone()
        } else {
            template.description.to_string()
        };
        debug!(kind = %err.kind, status = ?err.status, "Routing failure notification");
        self.show(NotificationEvent::new(
            Severity::Error,
            template.title,
            Some(description),
        ));
    }

    pub fn success(&self, msg: &StandardMessage) {
        self.emit(Severity::Success, templates::success_text(msg));
    }

    pub fn error(&self, msg: &StandardMessage) {
        self.emit(Severity::Error, templates::error_text(msg));
    }

    pub fn warning(&self, msg: &StandardMessage) {
        self.emit(Severity::Warning, templates::warning_text(msg));
    }

    pub fn info(&self, msg: &StandardMessage) {
        self.emit(Severity::Info, templates::info_text(msg));
    }

    /// Show a loading placeholder while `operation` runs, then replace it
    /// with a success or failure notification. The result is returned as-is.
    pub async fn with_loading<T, F>(
        &self,
        loading_title: &str,
        success: &StandardMessage,
        operation: F,
    ) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        let placeholder = self.show(NotificationEvent::new(
            Severity::Info,
            loading_title,
            Some(LOADING_DESCRIPTION.to_string()),
        ));

        let result = operation.await;
        placeholder.dismiss();

        match &result {
            Ok(_) => self.success(success),
            Err(err) => self.failure(err),
        }
        result
    }
}
