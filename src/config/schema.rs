//! Configuration schema and defaults for platewatch.
//!
//! Defines the TOML-serializable configuration with sections `[server]`,
//! `[polling]`, `[detections]`, and `[session]`. Every field has a built-in
//! default; users only set the values they want to override.

use serde::{Deserialize, Serialize};

use crate::api::ExpiryNotify;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level platewatch configuration.
///
/// Maps to the `~/.platewatch/config.toml` and `.platewatch.toml` file
/// schemas. All sections and fields are optional — missing values fall back
/// to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatewatchConfig {
    pub server: ServerConfig,
    pub polling: PollingConfig,
    pub detections: DetectionsConfig,
    pub session: SessionConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// API root, origin plus `/api`.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [polling]
// ---------------------------------------------------------------------------

/// Poll periods for the live views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Refresh period for the watch dashboard and agents views (seconds).
    pub dashboard_interval_secs: u64,
    /// Refresh period for `logs --follow` (seconds).
    pub log_interval_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            dashboard_interval_secs: 8,
            log_interval_secs: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// [detections]
// ---------------------------------------------------------------------------

/// Detection listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionsConfig {
    /// Rows per page for `detections list`.
    pub page_size: i64,
}

impl Default for DetectionsConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Session-expiry notification policies.
///
/// The upstream dashboard guarded the login redirect for plain requests but
/// not for uploads; both behaviors are kept configurable here pending a
/// product decision on whether the asymmetry is intentional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Policy for `request`/`get`/`post`/`patch`/`delete`:
    /// `"skip-auth-paths"` (default) or `"always"`.
    pub request_notify: ExpiryNotify,
    /// Policy for `upload`: `"always"` (default) or `"skip-auth-paths"`.
    pub upload_notify: ExpiryNotify,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_notify: ExpiryNotify::SkipAuthPaths,
            upload_notify: ExpiryNotify::Always,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default TOML
// ---------------------------------------------------------------------------

impl PlatewatchConfig {
    /// The annotated default config written by `platewatch config init`.
    pub fn default_toml() -> &'static str {
        r#"# platewatch configuration
# Values shown are the built-in defaults.

[server]
# API root of the ALPR backend (origin + /api).
base_url = "http://localhost:8000/api"

[polling]
# Refresh period for `platewatch watch` views, in seconds.
dashboard_interval_secs = 8
# Refresh period for `platewatch logs --follow`, in seconds.
log_interval_secs = 3

[detections]
# Rows per page for `platewatch detections list`.
page_size = 10

[session]
# When to print the session-expired hint after a denied response.
# "skip-auth-paths" suppresses it for /auth/ calls (a rejected login is
# not an expired session); "always" never suppresses.
request_notify = "skip-auth-paths"
upload_notify = "always"
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
