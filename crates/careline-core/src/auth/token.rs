//! Offline inspection of bearer credentials.
//!
//! Credentials are JWT-shaped (`header.payload.signature`). Only the payload
//! is decoded; the signature is not verified and expiry is judged against
//! the local clock.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Credential is not in header.payload.signature form")]
    Malformed,

    #[error("Credential payload is not valid base64: {0}")]
    Encoding(String),

    #[error("Credential payload is not valid JSON: {0}")]
    Payload(String),

    #[error("Credential has no expiry claim")]
    MissingExpiry,
}

/// Claims read from the credential payload.
///
/// Only `exp` is typed strictly. Issuers disagree on the shape of `iat`
/// and `sub` (numeric user ids, fractional timestamps), so those are kept
/// as raw JSON and never make an otherwise usable credential invalid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<Value>,
    #[serde(default)]
    pub sub: Option<Value>,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        let iat = self.iat.as_ref()?;
        let secs = iat.as_i64().or_else(|| iat.as_f64().map(|f| f.trunc() as i64))?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Subject as text, whether the issuer wrote it as a string or a number.
    pub fn subject(&self) -> Option<String> {
        match self.sub.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Expiry compared in milliseconds against `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> Result<bool, TokenError> {
        let exp = self.exp.ok_or(TokenError::MissingExpiry)?;
        Ok(exp.saturating_mul(1000) <= now.timestamp_millis())
    }
}

/// Decode the payload segment of a credential.
pub fn decode_claims(credential: &str) -> Result<Claims, TokenError> {
    let mut segments = credential.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(TokenError::Malformed),
    };

    // Accept padded payloads too
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload(e.to_string()))
}

/// Whether the credential is well formed, carries an expiry, and has not
/// expired at `now`. Never errors; anything undecodable is invalid.
pub fn is_valid_at(credential: &str, now: DateTime<Utc>) -> bool {
    decode_claims(credential)
        .and_then(|claims| claims.is_expired_at(now))
        .map(|expired| !expired)
        .unwrap_or(false)
}

pub fn is_valid(credential: &str) -> bool {
    is_valid_at(credential, Utc::now())
}
