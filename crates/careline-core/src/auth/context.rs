//! Session lifecycle exposed to the rest of the application.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::credentials::open_slot;
use super::session::{Session, SessionState, SessionStore};
use crate::api::{ApiClient, ApiError, RequestDescriptor};
use crate::config::Config;
use crate::models::{AuthResponse, LoginCredentials, RegisterData, UserProfile};
use crate::notify::{NotificationRouter, NotificationSink};

pub const ME_ENDPOINT: &str = "/api/auth/me";
pub const LOGIN_ENDPOINT: &str = "/api/auth/login";
pub const REGISTER_ENDPOINT: &str = "/api/auth/register";
pub const LOGOUT_ENDPOINT: &str = "/api/auth/logout";

/// Message used when the login endpoint rejects without saying why.
const LOGIN_FAILED: &str = "Login failed";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to persist credential: {0}")]
    Storage(String),
}

/// Composes the session store, token validator, and request pipeline.
///
/// Clone is cheap; clones share the same store.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<SessionStore>,
    api: ApiClient,
}

impl SessionContext {
    pub fn new(api: ApiClient) -> Self {
        Self {
            store: api.session().clone(),
            api,
        }
    }

    /// Wire a context from configuration, delivering notifications to `sink`.
    pub fn from_config(config: &Config, sink: Arc<dyn NotificationSink>) -> anyhow::Result<Self> {
        let slot = open_slot(config.credential_store, config.cache_dir()?);
        let store = Arc::new(SessionStore::new(slot));
        let api = ApiClient::new(config, store, NotificationRouter::new(sink))?;
        Ok(Self::new(api))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn router(&self) -> &NotificationRouter {
        self.api.router()
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn session(&self) -> Session {
        self.store.session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.store.user()
    }

    /// Resolve the startup state from the persisted credential.
    ///
    /// Only the first call does any work; later calls return the current
    /// session.
    pub async fn initialize(&self) -> Session {
        if !self.store.is_loading() {
            return self.session();
        }

        let Some(credential) = self.store.credential() else {
            debug!("No persisted credential");
            self.store.resolve_startup(SessionState::Anonymous);
            return self.session();
        };

        // Known-dead credentials never reach the network
        if !self.store.validate_credential() {
            info!("Persisted credential is expired or malformed");
            self.store.resolve_startup(SessionState::Anonymous);
            return self.session();
        }

        match self.fetch_user(true).await {
            Ok(user) => {
                info!(user = %user.username, "Session restored");
                self.store.resolve_startup(SessionState::Authenticated(user));
            }
            Err(e) => {
                warn!(error = %e, "Session verification failed");
                self.store.purge_if_current(&credential);
                self.store.resolve_startup(SessionState::Anonymous);
            }
        }
        self.session()
    }

    /// Mark `user` as logged in. The credential is persisted separately by
    /// whoever completed the authentication exchange.
    pub fn login(&self, user: UserProfile) {
        info!(user = %user.username, "Logged in");
        self.store.set_user(user);
    }

    /// Log out locally, then tell the server.
    ///
    /// The credential is purged before the first suspension point; the
    /// server call is best effort and its failure is ignored.
    pub async fn logout(&self) {
        self.store.sign_out();
        info!("Logged out");

        let request = RequestDescriptor::post(LOGOUT_ENDPOINT).suppress_notification(true);
        if let Err(e) = self.api.send(request).await {
            debug!(error = %e, "Ignoring failed logout notification");
        }
    }

    /// Exchange identifier and secret for a credential, persist it, and log in.
    ///
    /// Failures are not notified; the login form reports them itself.
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserProfile, AuthError> {
        // A rejected re-login must not touch the session it would replace
        let request = RequestDescriptor::post(LOGIN_ENDPOINT)
            .json(credentials)
            .map_err(|e| ApiError::unexpected_payload("login request", &e))?
            .anonymous()
            .suppress_notification(true);

        let value = self.api.send(request).await.map_err(|mut err| {
            if err.is_synthesized_message() {
                err.message = LOGIN_FAILED.to_string();
            }
            err
        })?;

        let auth: AuthResponse = parse(value, "login response")?;
        self.complete_login(auth)
    }

    /// Create an account and log in with the returned credential.
    pub async fn register(&self, data: &RegisterData) -> Result<UserProfile, AuthError> {
        let request = RequestDescriptor::post(REGISTER_ENDPOINT)
            .json(data)
            .map_err(|e| ApiError::unexpected_payload("register request", &e))?
            .anonymous();

        let value = self.api.send(request).await?;
        let auth: AuthResponse = parse(value, "register response")?;
        self.complete_login(auth)
    }

    fn complete_login(&self, auth: AuthResponse) -> Result<UserProfile, AuthError> {
        self.store
            .set_credential(&auth.token)
            .map_err(|e| AuthError::Storage(format!("{:#}", e)))?;
        self.login(auth.user.clone());
        Ok(auth.user)
    }

    /// Fetch the profile of the current credential holder.
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.fetch_user(false).await
    }

    async fn fetch_user(&self, suppress: bool) -> Result<UserProfile, ApiError> {
        let value = self
            .api
            .send(RequestDescriptor::get(ME_ENDPOINT).suppress_notification(suppress))
            .await?;
        parse(value, "user profile")
    }

    /// Offline validity check of the stored credential.
    ///
    /// An invalid credential is purged; if a user was logged in the
    /// session drops to `Anonymous` and an authentication notification is
    /// shown.
    pub fn check_credential(&self) -> bool {
        if self.store.validate_credential() {
            return true;
        }
        if self.store.is_authenticated() {
            self.store.sign_out();
            self.router().failure(&ApiError::session_expired());
        }
        false
    }
}

fn parse<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::unexpected_payload(what, &e))
}
