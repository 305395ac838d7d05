//! Typed wrappers over the gateway for every backend operation the
//! dashboard uses. Each wrapper is a thin deserialize-on-top-of-`request`
//! shim; the gateway keeps all auth and error semantics.

use std::fs;
use std::path::Path;

use serde_json::{Value, json};

use super::error::ApiError;
use super::gateway::ApiClient;
use super::multipart::{self, Multipart};
use super::types::{
    AgentSettings, AgentStatus, DashboardStats, Detection, DetectionPage, LogDetails,
    ProcessingLog, SystemHealth, TokenResponse, User, Video,
};

// ---------------------------------------------------------------------------
// Detection list filters
// ---------------------------------------------------------------------------

/// Filters for `GET /detections/`. Mirrors the backend's query parameters;
/// unset fields are omitted from the query string.
#[derive(Debug, Clone, Default)]
pub struct DetectionQuery {
    pub plate: Option<String>,
    pub vehicle_query: Option<String>,
    pub min_confidence: Option<f64>,
    pub recheck_status: Option<String>,
    pub video_id: Option<i64>,
    pub skip: i64,
    pub limit: i64,
}

impl DetectionQuery {
    pub fn page(page: i64, page_size: i64) -> Self {
        Self {
            skip: page * page_size,
            limit: page_size,
            ..Self::default()
        }
    }

    /// Render as a URL query string (leading `?` included, parameters
    /// percent-escaped where needed).
    pub fn to_query_string(&self) -> String {
        let mut params: Vec<String> = vec![
            format!("skip={}", self.skip),
            format!("limit={}", self.limit),
        ];
        if let Some(plate) = &self.plate {
            params.push(format!("plate={}", escape(plate)));
        }
        if let Some(q) = &self.vehicle_query {
            params.push(format!("vehicle_query={}", escape(q)));
        }
        if let Some(conf) = self.min_confidence {
            params.push(format!("min_confidence={conf}"));
        }
        if let Some(status) = &self.recheck_status {
            params.push(format!("recheck_status={}", escape(status)));
        }
        if let Some(id) = self.video_id {
            params.push(format!("video_id={id}"));
        }
        format!("?{}", params.join("&"))
    }
}

/// Percent-escape a query parameter value. Every byte outside the
/// unreserved set is encoded, so multi-byte UTF-8 (vehicle descriptions
/// are free text) survives the wire intact.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Typed endpoint surface
// ---------------------------------------------------------------------------

impl ApiClient {
    // --- Auth ---

    /// Log in with form-encoded credentials and persist the issued token.
    pub fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let value = self.post_form("/auth/login", &[("username", email), ("password", password)])?;
        let token: TokenResponse = serde_json::from_value(value)?;
        self.store_token(&token.access_token)
            .map_err(ApiError::Io)?;
        Ok(token)
    }

    /// Register a new account (JSON body; does not log in).
    pub fn register(&self, email: &str, password: &str) -> Result<Value, ApiError> {
        self.post(
            "/auth/register",
            &json!({ "email": email, "password": password }),
        )
    }

    pub fn me(&self) -> Result<User, ApiError> {
        Ok(serde_json::from_value(self.get("/auth/me")?)?)
    }

    // --- Videos ---

    pub fn list_videos(&self) -> Result<Vec<Video>, ApiError> {
        Ok(serde_json::from_value(self.get("/videos/")?)?)
    }

    pub fn video(&self, id: i64) -> Result<Video, ApiError> {
        Ok(serde_json::from_value(self.get(&format!("/videos/{id}"))?)?)
    }

    pub fn delete_video(&self, id: i64) -> Result<Value, ApiError> {
        self.delete(&format!("/videos/{id}"))
    }

    /// Upload a video file as the multipart `file` field.
    pub fn upload_video(&self, path: &Path) -> Result<Video, ApiError> {
        let bytes = fs::read(path).map_err(ApiError::Io)?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin");

        let mut form = Multipart::new();
        form.add_file("file", filename, multipart::content_type_for(path), &bytes);

        Ok(serde_json::from_value(self.upload("/videos/upload", form)?)?)
    }

    /// The generated JSON analysis report for a completed video.
    pub fn video_report(&self, id: i64) -> Result<Value, ApiError> {
        self.get(&format!("/videos/{id}/report"))
    }

    pub fn video_logs(&self, id: i64) -> Result<Vec<ProcessingLog>, ApiError> {
        Ok(serde_json::from_value(
            self.get(&format!("/videos/{id}/logs"))?,
        )?)
    }

    /// Streaming URL with the token in the query string — media players
    /// cannot send an authorization header.
    pub fn stream_url(&self, id: i64) -> Option<String> {
        let token = self.token()?;
        Some(format!(
            "{}/videos/stream/{}?token={}",
            self.base_url(),
            id,
            token
        ))
    }

    // --- Detections ---

    pub fn detections(&self, query: &DetectionQuery) -> Result<DetectionPage, ApiError> {
        Ok(serde_json::from_value(
            self.get(&format!("/detections/{}", query.to_query_string()))?,
        )?)
    }

    /// Correct a plate reading. The backend takes the plate in the query
    /// string and uppercases it server-side.
    pub fn correct_detection(&self, id: i64, plate: &str) -> Result<Detection, ApiError> {
        Ok(serde_json::from_value(self.patch(
            &format!("/detections/{id}?plate_number={}", escape(plate)),
            None,
        )?)?)
    }

    pub fn delete_detection(&self, id: i64) -> Result<Value, ApiError> {
        self.delete(&format!("/detections/{id}"))
    }

    // --- System ---

    pub fn stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(serde_json::from_value(self.get("/stats")?)?)
    }

    pub fn health(&self) -> Result<SystemHealth, ApiError> {
        Ok(serde_json::from_value(self.get("/health")?)?)
    }

    // --- Agentic v2 ---

    pub fn agent_logs(&self, video_id: i64, agent: Option<&str>) -> Result<Vec<ProcessingLog>, ApiError> {
        let path = match agent {
            Some(agent) => format!("/v2/process/video/{video_id}/logs?agent={}", escape(agent)),
            None => format!("/v2/process/video/{video_id}/logs"),
        };
        Ok(serde_json::from_value(self.get(&path)?)?)
    }

    pub fn agent_status(&self, video_id: i64) -> Result<AgentStatus, ApiError> {
        Ok(serde_json::from_value(
            self.get(&format!("/v2/process/video/{video_id}/agent-status"))?,
        )?)
    }

    pub fn agent_settings(&self) -> Result<AgentSettings, ApiError> {
        Ok(serde_json::from_value(self.get("/v2/agent-settings")?)?)
    }

    /// Push new agent settings; only the provided keys are updated.
    pub fn update_agent_settings(&self, settings: &Value) -> Result<Value, ApiError> {
        self.post("/v2/agent-settings", settings)
    }

    pub fn log_details(&self, log_id: i64) -> Result<LogDetails, ApiError> {
        Ok(serde_json::from_value(
            self.get(&format!("/v2/logs/{log_id}/details"))?,
        )?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
