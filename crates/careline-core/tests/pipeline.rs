// Integration tests for the request pipeline

mod common;

use careline_core::notify::Severity;
use careline_core::{ErrorKind, RequestDescriptor};
use common::{token_expiring_in, Harness};
use mockito::{Matcher, Server};
use serde_json::json;

#[tokio::test]
async fn test_unauthenticated_failure_notifies_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/x")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"jwt expired"}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let err = h.api.send(RequestDescriptor::get("/api/x")).await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "jwt expired");

    let events = h.toasts.history();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].severity, Severity::Error);
    assert_eq!(events[0].title, "Authentication Required");
}

#[tokio::test]
async fn test_post_success_returns_payload() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/y")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({"a": 1})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let value = h
        .api
        .send(RequestDescriptor::post("/api/y").body(json!({"a": 1})))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(value, json!({"ok": true}));
    assert_eq!(h.toasts.count(Severity::Error), 0);
}

#[tokio::test]
async fn test_concurrent_calls_have_independent_outcomes() {
    let mut server = Server::new_async().await;
    let _ok_mock = server
        .mock("GET", "/api/ok")
        .with_status(200)
        .with_body(r#"{"n":1}"#)
        .create_async()
        .await;
    let _boom_mock = server
        .mock("GET", "/api/boom")
        .with_status(500)
        .with_body("internal failure")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let (ok, boom) = futures::join!(h.api.get("/api/ok"), h.api.get("/api/boom"));

    assert_eq!(ok.unwrap(), json!({"n": 1}));
    let err = boom.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServerError);
    assert_eq!(err.status, Some(500));
    assert_eq!(err.message, "HTTP 500: Internal Server Error");
    assert_eq!(h.toasts.count(Severity::Error), 1);
}

#[tokio::test]
async fn test_suppressed_failure_emits_nothing_but_still_fails() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("DELETE", "/api/z")
        .with_status(403)
        .with_body(r#"{"error":"forbidden"}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let err = h
        .api
        .send(RequestDescriptor::delete("/api/z").suppress_notification(true))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Forbidden);
    assert!(h.toasts.history().is_empty());
}

#[tokio::test]
async fn test_bearer_credential_attached_when_present() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/secure")
        .match_header("authorization", format!("Bearer {}", token).as_str())
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    h.api.get("/api/secure").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_authorization_header_when_anonymous() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/public")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    assert_eq!(h.api.get("/api/public").await.unwrap(), json!([]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_never_sends_body_and_raw_body_passes_through() {
    let mut server = Server::new_async().await;
    let get = server
        .mock("GET", "/api/items")
        .match_body(Matcher::Exact(String::new()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/api/items/1")
        .match_body(Matcher::Exact(r#"{"name":"raw"}"#.to_string()))
        .with_status(204)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    h.api
        .send(RequestDescriptor::get("/api/items").body(json!({"ignored": true})))
        .await
        .unwrap();
    let value = h.api.put("/api/items/1", r#"{"name":"raw"}"#).await.unwrap();

    get.assert_async().await;
    put.assert_async().await;
    // Empty success body
    assert_eq!(value, serde_json::Value::Null);
}

#[tokio::test]
async fn test_caller_header_overrides_content_type() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PATCH", "/api/notes/3")
        .match_header("content-type", "text/plain")
        .match_header("x-request-source", "careline")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    h.api
        .send(
            RequestDescriptor::patch("/api/notes/3")
                .body("plain text")
                .header("Content-Type", "text/plain")
                .header("X-Request-Source", "careline"),
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_validation_failure_message_reaches_notification() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/clients")
        .with_status(400)
        .with_body(r#"{"error":"Surname is required"}"#)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let err = h.api.post("/api/clients", json!({})).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let events = h.toasts.history();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Validation Failed");
    assert_eq!(events[0].description.as_deref(), Some("Surname is required"));
}

#[tokio::test]
async fn test_invalid_success_body_is_unknown_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/html")
        .with_status(200)
        .with_body("<html></html>")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    let err = h.api.get("/api/html").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert_eq!(err.status, Some(200));
    assert_eq!(h.toasts.count(Severity::Error), 1);
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    // Nothing listens on port 1
    let h = Harness::new("http://127.0.0.1:1", None);
    let err = h.api.get("/api/x").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NetworkError);
    assert_eq!(err.status, None);

    let events = h.toasts.history();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Connection Error");
}

#[tokio::test]
async fn test_unauthenticated_response_purges_stored_credential() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/x")
        .with_status(401)
        .with_body("{}")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    let _ = h.api.get("/api/x").await;

    assert!(h.api.session().credential().is_none());
    assert!(h.persisted().is_none());
}

#[tokio::test]
async fn test_no_retry_on_failure() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/flaky")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let h = Harness::new(&server.url(), None);
    assert!(h.api.get("/api/flaky").await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_anonymous_request_leaves_session_alone() {
    let token = token_expiring_in(1);
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/public/feedback")
        .match_header("authorization", Matcher::Missing)
        .with_status(401)
        .with_body("{}")
        .create_async()
        .await;

    let h = Harness::new(&server.url(), Some(&token));
    let err = h
        .api
        .send(RequestDescriptor::post("/api/public/feedback").anonymous())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.kind, ErrorKind::Unauthenticated);
    assert_eq!(h.persisted(), Some(token));
}
