//! Authenticated request pipeline.
//!
//! Every call goes through [`ApiClient::send`]: headers and the stored
//! bearer credential are attached, the response is normalized into an
//! [`Outcome`], failures are classified and routed to the notification
//! sink (unless suppressed), then returned to the caller. Nothing is
//! retried; retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Url};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::request::{Body, RequestDescriptor};
use super::{ApiError, Outcome};
use crate::auth::SessionStore;
use crate::config::Config;
use crate::notify::NotificationRouter;

const JSON_CONTENT_TYPE: &str = "application/json";

/// API client shared by every caller.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
    router: NotificationRouter,
    clear_on_unauthenticated: bool,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        config: &Config,
        session: Arc<SessionStore>,
        router: NotificationRouter,
    ) -> Result<Self> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base URL: {}", config.base_url))?;

        Ok(Self {
            client,
            base_url,
            session,
            router,
            clear_on_unauthenticated: config.clear_session_on_unauthenticated,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.router
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Issue one request and return its terminal outcome.
    pub async fn send(&self, request: RequestDescriptor) -> Outcome {
        // Read once so the whole call sees a single credential
        let credential = if request.is_anonymous() {
            None
        } else {
            self.session.credential()
        };

        debug!(
            method = %request.method(),
            url = request.url(),
            authenticated = credential.is_some(),
            "Sending request"
        );

        let result = self.execute(&request, credential.as_deref()).await;

        if let Err(ref err) = result {
            warn!(
                method = %request.method(),
                url = request.url(),
                kind = %err.kind,
                status = ?err.status,
                "Request failed: {}",
                err
            );

            if err.is_auth_error() && self.clear_on_unauthenticated {
                if let Some(ref credential) = credential {
                    if self.session.expire_if_current(credential) {
                        info!("Session cleared after authentication failure");
                    }
                }
            }

            if !request.is_suppressed() {
                self.router.failure(err);
            }
        }

        result
    }

    async fn execute(&self, request: &RequestDescriptor, credential: Option<&str>) -> Outcome {
        let url = self.resolve_url(request.url())?;
        let headers = Self::build_headers(request, credential)?;

        let mut builder = self
            .client
            .request(request.method().into(), url)
            .headers(headers);
        if let Some(body) = request.wire_body() {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::network(&e))?;
        Self::read_response(response).await
    }

    /// Normalize a response into an outcome.
    async fn read_response(response: reqwest::Response) -> Outcome {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let body = response.text().await.map_err(|e| {
            ApiError::new(
                Some(status.as_u16()),
                format!("Failed to read response body: {}", e),
            )
        })?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|_| ApiError::invalid_body(status, &body))
    }

    /// Absolute URLs pass through; anything else is joined to the base URL.
    fn resolve_url(&self, url: &str) -> Result<Url, ApiError> {
        let resolved = if url.starts_with("http://") || url.starts_with("https://") {
            Url::parse(url)
        } else {
            self.base_url.join(url)
        };
        resolved.map_err(|e| ApiError::new(None, format!("Invalid URL {}: {}", url, e)))
    }

    /// Defaults first, then the credential, then caller headers, so callers
    /// can override anything.
    fn build_headers(
        request: &RequestDescriptor,
        credential: Option<&str>,
    ) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(JSON_CONTENT_TYPE),
        );

        if let Some(token) = credential {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::new(None, "Stored credential is not a valid header value"))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        for (name, value) in request.headers() {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::new(None, format!("Invalid header name: {}", name)))?;
            let value = header::HeaderValue::from_str(value)
                .map_err(|_| ApiError::new(None, format!("Invalid value for header {}", name)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    // ===== Convenience methods =====

    pub async fn get(&self, url: &str) -> Outcome {
        self.send(RequestDescriptor::get(url)).await
    }

    pub async fn post(&self, url: &str, body: impl Into<Body>) -> Outcome {
        self.send(RequestDescriptor::post(url).body(body)).await
    }

    pub async fn put(&self, url: &str, body: impl Into<Body>) -> Outcome {
        self.send(RequestDescriptor::put(url).body(body)).await
    }

    pub async fn patch(&self, url: &str, body: impl Into<Body>) -> Outcome {
        self.send(RequestDescriptor::patch(url).body(body)).await
    }

    pub async fn delete(&self, url: &str) -> Outcome {
        self.send(RequestDescriptor::delete(url)).await
    }
}
