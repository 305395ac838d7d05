//! Integration tests for the authenticated request gateway, run against a
//! scripted `tiny_http` backend. These exercise the full wire path: header
//! attachment, body encoding, `detail` unwrapping, and the clear-and-notify
//! side effect on denied responses.

mod support;

use std::sync::{Arc, Mutex};

use serde_json::json;

use platewatch::api::{ApiClient, ApiError, ExpiryNotify, MemoryTokenStore, Multipart, TokenStore};
use support::{MockServer, Scripted};

fn client_with_token(base_url: &str, token: Option<&str>) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new(token));
    let client = ApiClient::new(base_url, Box::new(Arc::clone(&store)));
    (client, store)
}

/// Records every status the expiry sink is fired with.
fn counting_sink(client: ApiClient) -> (ApiClient, Arc<Mutex<Vec<u16>>>) {
    let fired: Arc<Mutex<Vec<u16>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_fired = Arc::clone(&fired);
    let client = client.with_expiry_sink(Box::new(move |status| {
        sink_fired.lock().unwrap().push(status);
    }));
    (client, fired)
}

// ---------------------------------------------------------------------------
// Header attachment
// ---------------------------------------------------------------------------

#[test]
fn no_token_means_no_authorization_header() {
    let server = MockServer::start(vec![Scripted::json(200, "[]")]);
    let (client, _) = client_with_token(server.base_url(), None);

    client.get("/videos/").unwrap();

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].url, "/videos/");
    assert!(requests[0].header("Authorization").is_none());
}

#[test]
fn stored_token_is_sent_as_bearer() {
    let server = MockServer::start(vec![Scripted::json(200, "[]")]);
    let (client, _) = client_with_token(server.base_url(), Some("tok-123"));

    client.get("/videos/").unwrap();

    let requests = server.finish();
    assert_eq!(requests[0].header("Authorization"), Some("Bearer tok-123"));
}

#[test]
fn repeated_calls_send_identical_auth_headers() {
    let server = MockServer::start(vec![
        Scripted::json(200, "{}"),
        Scripted::json(200, "{}"),
    ]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    client.get("/stats").unwrap();
    client.get("/stats").unwrap();

    let requests = server.finish();
    assert_eq!(
        requests[0].header("Authorization"),
        requests[1].header("Authorization")
    );
    assert_eq!(requests[0].url, requests[1].url);
}

// ---------------------------------------------------------------------------
// Body encoding
// ---------------------------------------------------------------------------

#[test]
fn json_body_gets_json_content_type() {
    let server = MockServer::start(vec![Scripted::json(200, "{}")]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    client
        .post("/v2/agent-settings", &json!({"collage_size": 6}))
        .unwrap();

    let requests = server.finish();
    assert_eq!(requests[0].method, "POST");
    assert!(
        requests[0]
            .header("Content-Type")
            .unwrap()
            .starts_with("application/json")
    );
    assert_eq!(requests[0].body_str(), r#"{"collage_size":6}"#);
}

#[test]
fn bodiless_patch_sends_no_payload() {
    let server = MockServer::start(vec![Scripted::json(200, "{}")]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    client.patch("/detections/9?plate_number=KA01", None).unwrap();

    let requests = server.finish();
    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].url, "/detections/9?plate_number=KA01");
    assert!(requests[0].body.is_empty());
}

#[test]
fn upload_sends_multipart_not_json() {
    let server = MockServer::start(vec![Scripted::json(200, "{}")]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    let mut form = Multipart::new();
    form.add_file("file", "clip.mp4", "video/mp4", b"fake-bytes");
    client.upload("/videos/upload", form).unwrap();

    let requests = server.finish();
    let content_type = requests[0].header("Content-Type").unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(!content_type.contains("json"));
    let body = requests[0].body_str();
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"clip.mp4\""));
    assert!(body.contains("fake-bytes"));
    assert_eq!(requests[0].header("Authorization"), Some("Bearer tok"));
}

// ---------------------------------------------------------------------------
// Error unwrapping
// ---------------------------------------------------------------------------

#[test]
fn success_payload_passes_through_unvalidated() {
    let server = MockServer::start(vec![Scripted::json(200, r#"[{"anything": true}]"#)]);
    let (client, _) = client_with_token(server.base_url(), None);

    let value = client.get("/videos/").unwrap();
    assert_eq!(value, json!([{"anything": true}]));
    server.finish();
}

#[test]
fn detail_message_surfaces_on_failure() {
    let server = MockServer::start(vec![Scripted::json(
        422,
        r#"{"detail": "plate_number is required"}"#,
    )]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    let err = client.get("/detections/").unwrap_err();
    assert_eq!(err.to_string(), "plate_number is required");
    assert_eq!(err.status(), Some(422));
    assert!(!err.is_denied());
    server.finish();
}

#[test]
fn missing_detail_falls_back_to_generic_message() {
    let server = MockServer::start(vec![Scripted::json(500, r#"{"error": "oops"}"#)]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    let err = client.get("/stats").unwrap_err();
    assert_eq!(err.to_string(), "Something went wrong");
    server.finish();
}

#[test]
fn upload_failure_uses_upload_fallback_and_keeps_token() {
    let server = MockServer::start(vec![Scripted::json(500, "not json at all")]);
    let (client, store) = client_with_token(server.base_url(), Some("tok"));

    let err = client.upload("/videos/upload", Multipart::new()).unwrap_err();
    assert_eq!(err.to_string(), "Upload failed");
    // 500 is not a denial; the session survives.
    assert_eq!(store.load(), Some("tok".to_string()));
    server.finish();
}

#[test]
fn upload_detail_still_surfaces() {
    let server = MockServer::start(vec![Scripted::json(500, r#"{"detail": "disk full"}"#)]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));

    let err = client.upload("/videos/upload", Multipart::new()).unwrap_err();
    assert_eq!(err.to_string(), "disk full");
    server.finish();
}

// ---------------------------------------------------------------------------
// Denial: clear and notify
// ---------------------------------------------------------------------------

#[test]
fn denied_request_clears_token_and_notifies() {
    let server = MockServer::start(vec![Scripted::json(403, r#"{"detail": "expired"}"#)]);
    let (client, store) = client_with_token(server.base_url(), Some("tok"));
    let (client, fired) = counting_sink(client);

    let err = client.get("/videos/").unwrap_err();
    assert!(err.is_denied());
    assert_eq!(err.to_string(), "expired");
    assert_eq!(store.load(), None);
    assert_eq!(*fired.lock().unwrap(), vec![403]);
    server.finish();
}

#[test]
fn denial_clears_token_even_with_malformed_body() {
    let server = MockServer::start(vec![Scripted::json(401, "<html>gateway error</html>")]);
    let (client, store) = client_with_token(server.base_url(), Some("tok"));

    let err = client.get("/videos/").unwrap_err();
    assert!(err.is_denied());
    assert_eq!(err.to_string(), "Something went wrong");
    assert_eq!(store.load(), None);
    server.finish();
}

#[test]
fn rejected_login_does_not_fire_the_expiry_sink() {
    let server = MockServer::start(vec![Scripted::json(
        401,
        r#"{"detail": "Incorrect email or password"}"#,
    )]);
    let (client, _) = client_with_token(server.base_url(), None);
    let (client, fired) = counting_sink(client);

    let err = client
        .post_form("/auth/login", &[("username", "a@b.c"), ("password", "nope")])
        .unwrap_err();
    assert_eq!(err.to_string(), "Incorrect email or password");
    assert!(fired.lock().unwrap().is_empty());
    server.finish();
}

#[test]
fn upload_401_is_not_a_denial() {
    let server = MockServer::start(vec![Scripted::json(401, r#"{"detail": "expired"}"#)]);
    let (client, store) = client_with_token(server.base_url(), Some("tok"));
    let (client, fired) = counting_sink(client);

    let err = client.upload("/videos/upload", Multipart::new()).unwrap_err();
    assert!(!err.is_denied());
    assert_eq!(store.load(), Some("tok".to_string()));
    assert!(fired.lock().unwrap().is_empty());
    server.finish();
}

#[test]
fn upload_403_notifies_even_on_auth_paths() {
    let server = MockServer::start(vec![Scripted::json(403, r#"{"detail": "expired"}"#)]);
    let (client, store) = client_with_token(server.base_url(), Some("tok"));
    let (client, fired) = counting_sink(client);

    let err = client.upload("/auth/avatar", Multipart::new()).unwrap_err();
    assert!(err.is_denied());
    assert_eq!(store.load(), None);
    assert_eq!(*fired.lock().unwrap(), vec![403]);
    server.finish();
}

#[test]
fn notify_policies_are_configurable() {
    // Swap the defaults: requests always notify, uploads skip auth paths.
    let server = MockServer::start(vec![
        Scripted::json(401, r#"{"detail": "expired"}"#),
        Scripted::json(403, r#"{"detail": "expired"}"#),
    ]);
    let (client, _) = client_with_token(server.base_url(), Some("tok"));
    let client = client.with_notify_policies(ExpiryNotify::Always, ExpiryNotify::SkipAuthPaths);
    let (client, fired) = counting_sink(client);

    let _ = client.get("/auth/me").unwrap_err();
    assert_eq!(*fired.lock().unwrap(), vec![401]);

    let _ = client.upload("/auth/avatar", Multipart::new()).unwrap_err();
    assert_eq!(*fired.lock().unwrap(), vec![401]);
    server.finish();
}

#[test]
fn transport_errors_are_not_denials() {
    // Nothing is listening on this port.
    let (client, store) = client_with_token("http://127.0.0.1:1", Some("tok"));

    let err = client.get("/videos/").unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.is_denied());
    assert_eq!(store.load(), Some("tok".to_string()));
}
