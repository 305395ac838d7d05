//! Authenticated request gateway.
//!
//! Single choke point for all backend communication. Every call attaches the
//! bearer token (when one is stored), parses the JSON body regardless of
//! status, and surfaces the backend's `detail` message on failure. A denied
//! response (401/403) clears the stored token before the error is raised —
//! the terminal analog of the dashboard redirecting to the login page.
//!
//! The upstream dashboard treated denial differently between plain requests
//! (redirect only when not already on the login page, 401 and 403 alike) and
//! uploads (redirect unconditionally, 403 only). Whether that divergence is
//! intentional is an open product question, so both behaviors are preserved
//! here as explicit [`ExpiryNotify`] policies instead of being silently
//! unified.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, GENERIC_FAILURE, UPLOAD_FAILURE};
use super::multipart::Multipart;
use super::token::TokenStore;

/// When to fire the session-expiry notification after a denied response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpiryNotify {
    /// Suppress the notification when the failing call targets an `/auth/`
    /// path — a rejected login attempt is not an expired session.
    SkipAuthPaths,
    /// Always notify.
    Always,
}

/// Callback invoked (with the HTTP status) when a denied response has
/// cleared the session token.
pub type ExpirySink = Box<dyn Fn(u16) + Send + Sync>;

/// Which flavor of call produced a response; decides the denied statuses,
/// the fallback error message, and the notify policy applied.
#[derive(Debug, Clone, Copy)]
enum CallKind {
    Request,
    Upload,
}

impl CallKind {
    fn is_denied(self, status: u16) -> bool {
        match self {
            Self::Request => status == 401 || status == 403,
            Self::Upload => status == 403,
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Self::Request => GENERIC_FAILURE,
            Self::Upload => UPLOAD_FAILURE,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous client for the ALPR backend REST API.
///
/// Holds the base origin (including the `/api` root), a reusable transport
/// agent, and the injected [`TokenStore`]. Calls are one-shot: no retry, no
/// caching, no circuit breaking.
pub struct ApiClient {
    base_url: String,
    agent: ureq::Agent,
    tokens: Box<dyn TokenStore>,
    expiry_sink: Option<ExpirySink>,
    request_notify: ExpiryNotify,
    upload_notify: ExpiryNotify,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("request_notify", &self.request_notify)
            .field("upload_notify", &self.upload_notify)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client against the given API root (e.g.
    /// `http://localhost:8000/api`). A trailing slash is stripped so paths
    /// can always start with `/`.
    pub fn new(base_url: &str, tokens: Box<dyn TokenStore>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::agent(),
            tokens,
            expiry_sink: None,
            request_notify: ExpiryNotify::SkipAuthPaths,
            upload_notify: ExpiryNotify::Always,
        }
    }

    /// Install the session-expiry notification sink.
    pub fn with_expiry_sink(mut self, sink: ExpirySink) -> Self {
        self.expiry_sink = Some(sink);
        self
    }

    /// Override the notify policies for plain requests and uploads.
    pub fn with_notify_policies(mut self, request: ExpiryNotify, upload: ExpiryNotify) -> Self {
        self.request_notify = request;
        self.upload_notify = upload;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current session token, if stored.
    pub fn token(&self) -> Option<String> {
        self.tokens.load()
    }

    /// Persist a freshly issued session token.
    pub fn store_token(&self, token: &str) -> io::Result<()> {
        self.tokens.store(token)
    }

    /// Destroy the stored session token (logout).
    pub fn clear_token(&self) {
        self.tokens.clear();
    }

    // -----------------------------------------------------------------------
    // Core request path
    // -----------------------------------------------------------------------

    /// Issue a request and return the parsed JSON body.
    ///
    /// `body`, when present, is serialized as JSON with the JSON content
    /// type. The payload is returned as-is with no schema validation.
    pub fn request(&self, method: &str, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let mut req = self.agent.request(method, &self.url(path));
        if let Some(token) = self.tokens.load() {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }

        let result = match body {
            Some(json) => req.set("Content-Type", "application/json").send_json(json),
            None => req.call(),
        };

        self.complete(path, result, CallKind::Request)
    }

    pub fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request("GET", path, None)
    }

    pub fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request("POST", path, Some(body))
    }

    pub fn patch(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request("PATCH", path, body)
    }

    pub fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request("DELETE", path, None)
    }

    /// POST form-encoded fields (the login endpoint takes OAuth2-style
    /// credentials, not JSON). The transport sets the form content type.
    pub fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Value, ApiError> {
        let mut req = self.agent.request("POST", &self.url(path));
        if let Some(token) = self.tokens.load() {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }

        let result = req.send_form(fields);
        self.complete(path, result, CallKind::Request)
    }

    /// POST a multipart form. Never sets the JSON content type — the
    /// encoded form supplies its own `multipart/form-data; boundary=…`.
    pub fn upload(&self, path: &str, form: Multipart) -> Result<Value, ApiError> {
        let (content_type, body) = form.finish();
        let mut req = self
            .agent
            .request("POST", &self.url(path))
            .set("Content-Type", &content_type);
        if let Some(token) = self.tokens.load() {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }

        let result = req.send_bytes(&body);
        self.complete(path, result, CallKind::Upload)
    }

    // -----------------------------------------------------------------------
    // Response handling
    // -----------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Uniform tail of every call: parse the body, unwrap `detail` on
    /// failure, and apply the clear-and-notify side effect on denial.
    fn complete(
        &self,
        path: &str,
        result: Result<ureq::Response, ureq::Error>,
        kind: CallKind,
    ) -> Result<Value, ApiError> {
        match result {
            Ok(resp) => resp.into_json::<Value>().map_err(ApiError::Decode),
            Err(ureq::Error::Status(status, resp)) => {
                // Best-effort: the token clear below must happen even when
                // the error body is not well-formed JSON.
                let detail = extract_detail(resp);

                if kind.is_denied(status) {
                    self.tokens.clear();
                    if self.should_notify(kind, path)
                        && let Some(sink) = &self.expiry_sink
                    {
                        sink(status);
                    }
                    Err(ApiError::Denied {
                        status,
                        message: detail.unwrap_or_else(|| kind.fallback().to_string()),
                    })
                } else {
                    Err(ApiError::Status {
                        status,
                        message: detail.unwrap_or_else(|| kind.fallback().to_string()),
                    })
                }
            }
            Err(ureq::Error::Transport(t)) => Err(ApiError::Transport(Box::new(t))),
        }
    }

    fn should_notify(&self, kind: CallKind, path: &str) -> bool {
        let policy = match kind {
            CallKind::Request => self.request_notify,
            CallKind::Upload => self.upload_notify,
        };
        match policy {
            ExpiryNotify::Always => true,
            ExpiryNotify::SkipAuthPaths => !is_auth_path(path),
        }
    }
}

/// Pull the backend's `detail` message out of a failure body, if possible.
fn extract_detail(resp: ureq::Response) -> Option<String> {
    let value: Value = resp.into_json().ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

/// Paths under the auth router — the login-page analog for the
/// `SkipAuthPaths` policy.
fn is_auth_path(path: &str) -> bool {
    path == "/auth" || path.starts_with("/auth/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::token::MemoryTokenStore;

    #[test]
    fn auth_paths_are_recognized() {
        assert!(is_auth_path("/auth/login"));
        assert!(is_auth_path("/auth/me"));
        assert!(is_auth_path("/auth"));
        assert!(!is_auth_path("/videos/"));
        assert!(!is_auth_path("/authority"));
    }

    #[test]
    fn denied_statuses_differ_between_kinds() {
        assert!(CallKind::Request.is_denied(401));
        assert!(CallKind::Request.is_denied(403));
        assert!(!CallKind::Request.is_denied(500));
        assert!(!CallKind::Upload.is_denied(401));
        assert!(CallKind::Upload.is_denied(403));
    }

    #[test]
    fn fallback_messages_per_kind() {
        assert_eq!(CallKind::Request.fallback(), "Something went wrong");
        assert_eq!(CallKind::Upload.fallback(), "Upload failed");
    }

    #[test]
    fn base_url_trailing_slash_is_stripped() {
        let client = ApiClient::new(
            "http://localhost:8000/api/",
            Box::new(MemoryTokenStore::empty()),
        );
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/videos/"), "http://localhost:8000/api/videos/");
    }

    #[test]
    fn notify_policy_respects_auth_guard() {
        let client = ApiClient::new("http://x", Box::new(MemoryTokenStore::empty()));
        assert!(!client.should_notify(CallKind::Request, "/auth/login"));
        assert!(client.should_notify(CallKind::Request, "/videos/"));
        assert!(client.should_notify(CallKind::Upload, "/auth/login"));

        let client = client.with_notify_policies(ExpiryNotify::Always, ExpiryNotify::SkipAuthPaths);
        assert!(client.should_notify(CallKind::Request, "/auth/login"));
        assert!(!client.should_notify(CallKind::Upload, "/auth/login"));
    }
}
