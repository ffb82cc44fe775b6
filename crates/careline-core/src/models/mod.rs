//! Data models exchanged with the authentication endpoints.
//!
//! - `UserProfile`: identity returned by `/api/auth/me` and login
//! - `LoginCredentials`, `RegisterData`: request bodies
//! - `AuthResponse`: user plus freshly issued credential

pub mod user;

pub use user::{AuthResponse, LoginCredentials, RegisterData, UserProfile};
