use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use super::credentials::CredentialSlot;
use super::token::{self, Claims};
use crate::models::UserProfile;

/// Lifecycle of the in-memory session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup verification has not finished yet.
    Unknown,
    Authenticated(UserProfile),
    Anonymous,
}

/// Snapshot of who is logged in, derived from [`SessionState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl From<&SessionState> for Session {
    fn from(state: &SessionState) -> Self {
        let user = match state {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        };
        Self {
            is_authenticated: user.is_some(),
            is_loading: matches!(state, SessionState::Unknown),
            user,
        }
    }
}

struct Inner {
    state: SessionState,
    credential: Option<String>,
}

/// Sole owner of the credential and the session state.
///
/// Every mutation happens inside one write-lock section with no suspension
/// point, so readers never see a half-applied transition.
pub struct SessionStore {
    slot: Box<dyn CredentialSlot>,
    inner: RwLock<Inner>,
}

impl SessionStore {
    /// Create a store, loading any persisted credential from `slot`.
    pub fn new(slot: Box<dyn CredentialSlot>) -> Self {
        let credential = match slot.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted credential, starting anonymous");
                None
            }
        };
        debug!(has_credential = credential.is_some(), "Session store opened");

        Self {
            slot,
            inner: RwLock::new(Inner {
                state: SessionState::Unknown,
                credential,
            }),
        }
    }

    // ===== Credential =====

    /// Current bearer credential, if any.
    pub fn credential(&self) -> Option<String> {
        self.inner.read().credential.clone()
    }

    pub fn has_credential(&self) -> bool {
        self.inner.read().credential.is_some()
    }

    /// Persist a new credential, replacing any previous one.
    ///
    /// Memory is only updated once the slot write has succeeded.
    pub fn set_credential(&self, credential: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.write();
        self.slot.store(credential)?;
        inner.credential = Some(credential.to_string());
        debug!("Credential stored");
        Ok(())
    }

    /// Drop the credential from memory and the durable slot.
    pub fn purge(&self) {
        let mut inner = self.inner.write();
        self.purge_locked(&mut inner);
    }

    /// Purge only if `credential` is still the stored one. Returns whether a
    /// purge happened. A credential replaced by a newer login is kept.
    pub fn purge_if_current(&self, credential: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.credential.as_deref() != Some(credential) {
            return false;
        }
        self.purge_locked(&mut inner);
        true
    }

    /// React to an authentication failure of a request that carried
    /// `credential`: purge it and drop to `Anonymous`, unless a newer
    /// credential has been stored since.
    pub fn expire_if_current(&self, credential: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.credential.as_deref() != Some(credential) {
            return false;
        }
        inner.state = SessionState::Anonymous;
        self.purge_locked(&mut inner);
        true
    }

    fn purge_locked(&self, inner: &mut Inner) {
        inner.credential = None;
        // In-memory state is already gone; a stale slot only costs a failed
        // verification on next startup.
        if let Err(e) = self.slot.clear() {
            warn!(error = %e, "Failed to clear persisted credential");
        }
        debug!("Credential purged");
    }

    /// Check the stored credential offline.
    ///
    /// A missing, malformed, or expired credential yields `false` and is
    /// purged before returning, so no caller can observe a stale credential
    /// after a negative answer.
    pub fn validate_credential(&self) -> bool {
        let mut inner = self.inner.write();
        let valid = inner
            .credential
            .as_deref()
            .map(token::is_valid)
            .unwrap_or(false);
        if !valid {
            self.purge_locked(&mut inner);
        }
        valid
    }

    /// Claims of the stored credential, when it decodes.
    pub fn claims(&self) -> Option<Claims> {
        let inner = self.inner.read();
        inner
            .credential
            .as_deref()
            .and_then(|c| token::decode_claims(c).ok())
    }

    // ===== Session state =====

    pub fn state(&self) -> SessionState {
        self.inner.read().state.clone()
    }

    pub fn session(&self) -> Session {
        Session::from(&self.inner.read().state)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.inner.read().state, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.inner.read().state, SessionState::Unknown)
    }

    pub fn user(&self) -> Option<UserProfile> {
        match &self.inner.read().state {
            SessionState::Authenticated(user) => Some(user.clone()),
            _ => None,
        }
    }

    /// Any state → `Authenticated(user)`. Does not touch the credential.
    pub fn set_user(&self, user: UserProfile) {
        self.inner.write().state = SessionState::Authenticated(user);
    }

    /// Any state → `Anonymous`, purging the credential in the same step.
    pub fn sign_out(&self) {
        let mut inner = self.inner.write();
        inner.state = SessionState::Anonymous;
        self.purge_locked(&mut inner);
    }

    /// Leave `Unknown` for `next`. Returns `false` when startup was already
    /// resolved (for example by a login that raced the verification call).
    pub(crate) fn resolve_startup(&self, next: SessionState) -> bool {
        let mut inner = self.inner.write();
        if inner.state != SessionState::Unknown {
            return false;
        }
        inner.state = next;
        true
    }
}
