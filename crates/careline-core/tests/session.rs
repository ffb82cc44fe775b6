// Integration tests for the session lifecycle

mod common;

use careline_core::auth::{AuthError, SessionState};
use careline_core::models::{LoginCredentials, UserProfile};
use careline_core::notify::Severity;
use careline_core::ErrorKind;
use common::{expiry_in, token_expiring_in, token_with_claims, user_json, Harness};
use mockito::{Matcher, Server};
use serde_json::json;

#[tokio::test]
async fn test_startup_with_expired_credential_ends_anonymous() {
    let mut server = Server::new_async().await;
    // Known-expired credentials never reach the identity endpoint
    let me = server
        .mock("GET", "/api/auth/me")
        .expect(0)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token_expiring_in(-1)));
    assert!(h.ctx.is_loading());

    let session = h.ctx.initialize().await;

    me.assert_async().await;
    assert!(!session.is_authenticated);
    assert!(!session.is_loading);
    assert!(session.user.is_none());
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn test_startup_without_credential_is_anonymous() {
    let h = Harness::new("http://127.0.0.1:1", None);
    let session = h.ctx.initialize().await;
    assert_eq!(h.ctx.store().state(), SessionState::Anonymous);
    assert!(!session.is_loading);
}

#[tokio::test]
async fn test_startup_verification_success_restores_user() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let me = server
        .mock("GET", "/api/auth/me")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_body(user_json().to_string())
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    let session = h.ctx.initialize().await;

    me.assert_async().await;
    assert!(session.is_authenticated);
    assert!(!session.is_loading);
    assert_eq!(session.user.unwrap().username, "jsmith");
    assert_eq!(h.persisted(), Some(token));
}

#[tokio::test]
async fn test_startup_accepts_numeric_subject_claim() {
    let token = token_with_claims(json!({"exp": expiry_in(1), "sub": 7, "iat": 1_700_000_000.25}));
    let mut server = Server::new_async().await;
    let me = server
        .mock("GET", "/api/auth/me")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_body(user_json().to_string())
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    let session = h.ctx.initialize().await;

    me.assert_async().await;
    assert!(session.is_authenticated);
    assert_eq!(h.persisted(), Some(token));
}

#[tokio::test]
async fn test_startup_verification_failure_purges_silently() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/auth/me")
        .with_status(401)
        .with_body(r#"{"error":"revoked"}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    let session = h.ctx.initialize().await;

    assert!(!session.is_authenticated);
    assert!(!session.is_loading);
    assert!(h.persisted().is_none());
    // Verification is not user-initiated, so nothing is shown
    assert!(h.toasts.history().is_empty());
}

#[tokio::test]
async fn test_startup_network_failure_ends_anonymous() {
    let h = Harness::new("http://127.0.0.1:1", Some(&token_expiring_in(1)));
    let session = h.ctx.initialize().await;
    assert!(!session.is_authenticated);
    assert!(!session.is_loading);
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn test_initialize_runs_once() {
    let mut server = Server::new_async().await;
    let me = server
        .mock("GET", "/api/auth/me")
        .with_status(200)
        .with_body(user_json().to_string())
        .expect(1)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token_expiring_in(1)));
    h.ctx.initialize().await;
    h.ctx.initialize().await;
    me.assert_async().await;
}

#[tokio::test]
async fn test_login_is_visible_immediately() {
    let h = Harness::new("http://127.0.0.1:1", None);
    let user = UserProfile::new(3, "amira");
    h.ctx.login(user.clone());

    let session = h.ctx.session();
    assert!(session.is_authenticated);
    assert_eq!(session.user, Some(user));
    // login() does not persist anything
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn test_logout_twice_never_fails() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let logout = server
        .mock("POST", "/api/auth/logout")
        .match_header("authorization", Matcher::Missing)
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    h.ctx.login(UserProfile::new(1, "jsmith"));

    h.ctx.logout().await;
    assert!(!h.ctx.is_authenticated());
    h.ctx.logout().await;
    assert!(!h.ctx.is_authenticated());

    logout.assert_async().await;
    assert_eq!(h.ctx.store().state(), SessionState::Anonymous);
    assert!(h.persisted().is_none());
    // Best-effort server call failures are swallowed
    assert!(h.toasts.history().is_empty());
}

#[tokio::test]
async fn test_logout_offline_still_succeeds_locally() {
    let h = Harness::new("http://127.0.0.1:1", Some(&token_expiring_in(1)));
    h.ctx.login(UserProfile::new(1, "jsmith"));
    h.ctx.logout().await;
    assert!(!h.ctx.is_authenticated());
    assert!(h.ctx.store().credential().is_none());
}

#[tokio::test]
async fn test_authenticate_persists_credential_and_logs_in() {
    let token = token_expiring_in(2);
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(json!({"identifier": "jsmith", "secret": "pw"})))
        .with_status(200)
        .with_body(json!({"user": user_json(), "token": token}).to_string())
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let user = h
        .ctx
        .authenticate(&LoginCredentials::new("jsmith", "pw"))
        .await
        .unwrap();

    login.assert_async().await;
    assert_eq!(user.display_name(), "Jo Smith");
    assert!(h.ctx.is_authenticated());
    assert_eq!(h.persisted(), Some(token));
}

#[tokio::test]
async fn test_failed_relogin_keeps_existing_session() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/auth/login")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_body(r#"{"error":"Invalid username or password"}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    h.ctx.login(UserProfile::new(7, "jsmith"));

    let err = h
        .ctx
        .authenticate(&LoginCredentials::new("jsmith", "wrong"))
        .await
        .unwrap_err();

    login.assert_async().await;
    assert_eq!(err.to_string(), "Invalid username or password");
    assert!(h.ctx.is_authenticated());
    assert_eq!(h.ctx.store().credential(), Some(token.clone()));
    assert_eq!(h.persisted(), Some(token));
}

#[tokio::test]
async fn test_register_sends_no_stored_credential() {
    let old = token_expiring_in(1);
    let new = token_expiring_in(2);
    let mut server = Server::new_async().await;
    let register = server
        .mock("POST", "/api/auth/register")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(json!({"user": user_json(), "token": new}).to_string())
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&old));
    let data = careline_core::models::RegisterData {
        username: "jsmith".to_string(),
        password: "pw".to_string(),
        email: None,
        name: None,
    };
    h.ctx.register(&data).await.unwrap();

    register.assert_async().await;
    assert_eq!(h.persisted(), Some(new));
}

#[tokio::test]
async fn test_authenticate_failure_uses_server_error_or_fallback() {
    let mut server = Server::new_async().await;
    let _with_message = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::PartialJson(json!({"identifier": "a"})))
        .with_status(401)
        .with_body(r#"{"error":"Invalid username or password"}"#)
        .create_async()
        .await;
    let _without_message = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::PartialJson(json!({"identifier": "b"})))
        .with_status(401)
        .with_body("{}")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);

    let err = h
        .ctx
        .authenticate(&LoginCredentials::new("a", "x"))
        .await
        .unwrap_err();
    match err {
        AuthError::Api(e) => {
            assert_eq!(e.kind, ErrorKind::Unauthenticated);
            assert_eq!(e.message, "Invalid username or password");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = h
        .ctx
        .authenticate(&LoginCredentials::new("b", "x"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Login failed");

    assert!(!h.ctx.is_authenticated());
    // The login form reports failures itself
    assert!(h.toasts.history().is_empty());
}

#[tokio::test]
async fn test_register_failure_is_notified() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/auth/register")
        .with_status(400)
        .with_body(r#"{"error":"Username already taken"}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let data = careline_core::models::RegisterData {
        username: "jsmith".to_string(),
        password: "pw".to_string(),
        email: None,
        name: None,
    };
    assert!(h.ctx.register(&data).await.is_err());

    let events = h.toasts.history();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].description.as_deref(), Some("Username already taken"));
}

#[tokio::test]
async fn test_request_after_unauthenticated_does_not_reattach_credential() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let _first = server
        .mock("GET", "/api/care-plans")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(401)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/care-plans")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    h.ctx.login(UserProfile::new(1, "jsmith"));

    let _ = h.ctx.api().get("/api/care-plans").await;
    assert!(!h.ctx.is_authenticated());
    let _ = h.ctx.api().get("/api/care-plans").await;

    second.assert_async().await;
    assert_eq!(h.toasts.count(Severity::Error), 2);
}

#[tokio::test]
async fn test_check_credential_expires_session() {
    let h = Harness::new("http://127.0.0.1:1", Some(&token_expiring_in(-1)));
    h.ctx.login(UserProfile::new(1, "jsmith"));

    assert!(!h.ctx.check_credential());
    assert!(!h.ctx.is_authenticated());
    assert!(h.persisted().is_none());

    let events = h.toasts.history();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Authentication Required");
}
