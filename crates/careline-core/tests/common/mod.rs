#![allow(dead_code)]

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use careline_core::auth::{CredentialSlot, MemorySlot, SessionContext, SessionStore};
use careline_core::notify::{NotificationRouter, ToastStack};
use careline_core::{ApiClient, Config};
use chrono::{Duration, Utc};
use serde_json::json;

pub struct Harness {
    pub ctx: SessionContext,
    pub api: ApiClient,
    pub toasts: Arc<ToastStack>,
    pub slot: Arc<MemorySlot>,
}

impl Harness {
    pub fn new(base_url: &str, credential: Option<&str>) -> Self {
        let slot = Arc::new(match credential {
            Some(c) => MemorySlot::with_credential(c),
            None => MemorySlot::default(),
        });
        let toasts = Arc::new(ToastStack::new());
        let config = Config {
            base_url: base_url.to_string(),
            ..Config::default()
        };
        let store = Arc::new(SessionStore::new(Box::new(slot.clone())));
        let api = ApiClient::new(&config, store, NotificationRouter::new(toasts.clone()))
            .expect("client builds");
        Self {
            ctx: SessionContext::new(api.clone()),
            api,
            toasts,
            slot,
        }
    }

    pub fn persisted(&self) -> Option<String> {
        self.slot.load().expect("memory slot never fails")
    }
}

/// Unsigned credential carrying `claims`.
pub fn token_with_claims(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

/// Unsigned credential expiring `hours` from now (negative for the past).
pub fn token_expiring_in(hours: i64) -> String {
    token_with_claims(json!({"exp": expiry_in(hours), "sub": "7"}))
}

/// Unix timestamp `hours` from now.
pub fn expiry_in(hours: i64) -> i64 {
    (Utc::now() + Duration::hours(hours)).timestamp()
}

pub fn user_json() -> serde_json::Value {
    json!({"id": 7, "username": "jsmith", "name": "Jo Smith", "role": "carer"})
}
