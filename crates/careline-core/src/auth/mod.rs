//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `SessionStore`: sole owner of the credential and session state
//! - `SessionContext`: startup verification, login, logout
//! - `CredentialSlot`: durable storage for the raw credential (keyring, file, memory)
//! - `token`: offline decoding and expiry checks of bearer credentials

pub mod context;
pub mod credentials;
pub mod session;
pub mod token;

pub use context::{AuthError, SessionContext};
pub use credentials::{CredentialSlot, FileSlot, KeyringSlot, MemorySlot};
pub use session::{Session, SessionState, SessionStore};
