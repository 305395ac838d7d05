//! Typed views of the backend's JSON payloads.
//!
//! The gateway itself passes payloads through unvalidated; these structs
//! exist for the rendering layer. Fields the backend may omit or null out
//! are `Option` or defaulted, so older records deserialize cleanly.

use std::collections::BTreeMap;

use serde::Deserialize;

/// `GET /auth/me`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub is_active: i64,
    #[serde(default)]
    pub created_at: String,
}

/// `POST /auth/login`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// A video row from `GET /videos/`.
#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
    /// JSON blob with per-video analytics; parsed via
    /// [`VideoAnalytics::from_blob`].
    #[serde(default)]
    pub analytics_data: Option<String>,
}

impl Video {
    /// Whether the video is still being worked on (the dashboard's
    /// "active background tasks" predicate).
    pub fn is_active(&self) -> bool {
        self.status == "processing" || self.status == "pending"
    }
}

/// Forensic batch nested inside a detection.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionBatch {
    pub id: i64,
    #[serde(default)]
    pub collage_path: String,
    #[serde(default)]
    pub cost_estimate: f64,
}

/// A vehicle detection row.
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    pub id: i64,
    #[serde(default)]
    pub video_id: Option<i64>,
    #[serde(default)]
    pub plate_number: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Offset into the video, in seconds.
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub recheck_status: Option<String>,
    #[serde(default)]
    pub is_validated: bool,
    #[serde(default)]
    pub vehicle_info: Option<String>,
    #[serde(default)]
    pub make_model: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub helmet_status: Option<String>,
    #[serde(default)]
    pub passenger_count: Option<i64>,
    #[serde(default)]
    pub track_id: Option<i64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub batch: Option<DetectionBatch>,
}

impl Detection {
    pub fn plate(&self) -> &str {
        self.plate_number.as_deref().unwrap_or("UNKNOWN")
    }

    /// Two-wheeler detections carry helmet/passenger safety fields.
    pub fn is_two_wheeler(&self) -> bool {
        let t = self.vehicle_type.as_deref().unwrap_or("");
        t.contains("BIKE") || t.contains("MOTORCYCLE") || t.contains("SCOOTER")
    }
}

/// `GET /detections/` — paginated envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionPage {
    pub items: Vec<Detection>,
    pub total: i64,
}

/// A processing log entry (`/videos/{id}/logs`, `/v2/process/video/{id}/logs`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingLog {
    pub id: i64,
    #[serde(default)]
    pub video_id: Option<i64>,
    pub event_type: String,
    pub message: String,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub extra_data: Option<String>,
}

/// `GET /v2/logs/{id}/details`
#[derive(Debug, Clone, Deserialize)]
pub struct LogDetails {
    pub id: i64,
    pub event_type: String,
    pub message: String,
    #[serde(default)]
    pub extra_data: Option<String>,
}

/// `GET /stats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_videos: i64,
    #[serde(default)]
    pub total_detections: i64,
    #[serde(default)]
    pub total_failed: i64,
}

/// `GET /health`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemHealth {
    #[serde(default)]
    pub cpu_name: String,
    #[serde(default)]
    pub gpu_name: String,
    #[serde(default)]
    pub gpu_caps: String,
    #[serde(default)]
    pub disk_name: String,
    #[serde(default)]
    pub memory_total: String,
    #[serde(default)]
    pub redis_status: String,
    #[serde(default)]
    pub gemini_status: String,
    #[serde(default)]
    pub roi_status: String,
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub disk_usage: f64,
    #[serde(default)]
    pub mem_usage: f64,
    #[serde(default)]
    pub os: String,
}

impl SystemHealth {
    pub fn gpu_accelerated(&self) -> bool {
        self.gpu_caps == "AI-ACCELERATED"
    }
}

/// `GET /v2/agent-settings`
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub collage_size: i64,
    pub sensitivity: String,
    #[serde(default)]
    pub detection_threshold: Option<f64>,
    pub track_persistence: i64,
    #[serde(default)]
    pub max_gemini_calls: Option<i64>,
}

/// Aggregate metrics in an agent-status reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentMetrics {
    #[serde(default)]
    pub total_batches: i64,
    #[serde(default)]
    pub total_detections: i64,
    #[serde(default)]
    pub validated_by_agent: i64,
    #[serde(default)]
    pub validation_rate: f64,
    #[serde(default)]
    pub total_cost_estimate: f64,
}

/// One agent's card in an agent-status reply.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentPanel {
    pub status: String,
    #[serde(default)]
    pub telemetry: Option<String>,
    #[serde(default)]
    pub count: i64,
}

impl AgentPanel {
    pub fn is_active(&self) -> bool {
        self.status != "Idle" && self.status != "Standby"
    }
}

/// `GET /v2/process/video/{id}/agent-status`
#[derive(Debug, Clone, Deserialize)]
pub struct AgentStatus {
    pub video_id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub agentic_metrics: AgentMetrics,
    #[serde(default)]
    pub analytics: Option<VideoAnalytics>,
    /// Keyed by agent name (DETECTOR, CAPTURER, GEMINI, QC). BTreeMap keeps
    /// render order stable across polls.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentPanel>,
}

/// Capture-pipeline metrics inside the analytics blob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptureMetrics {
    #[serde(default)]
    pub total_captured_images: i64,
    #[serde(default)]
    pub total_batches: i64,
    #[serde(default)]
    pub successful_batches: i64,
}

/// Video-file metadata inside the analytics blob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsMetadata {
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub total_frames: i64,
    #[serde(default)]
    pub avg_fps: f64,
    #[serde(default)]
    pub processing_duration_sec: f64,
}

/// The per-video analytics blob stored as a JSON string on [`Video`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoAnalytics {
    #[serde(default)]
    pub counts: BTreeMap<String, i64>,
    #[serde(default)]
    pub metadata: AnalyticsMetadata,
    #[serde(default)]
    pub capture_metrics: CaptureMetrics,
    /// Vehicle density keyed by frame number (stringly keyed in the blob).
    #[serde(default)]
    pub frame_series: BTreeMap<String, i64>,
    #[serde(default)]
    pub total_vehicles_seen: i64,
    #[serde(default)]
    pub peak_vehicle_density: i64,
    #[serde(default)]
    pub processed_at: Option<String>,
}

impl VideoAnalytics {
    /// Parse the blob off a video record.
    pub fn from_blob(blob: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(blob)
    }

    /// Frame series in frame order (keys are numeric strings; string order
    /// would put "10" before "2").
    pub fn frame_series_ordered(&self) -> Vec<(u64, i64)> {
        let mut frames: Vec<(u64, i64)> = self
            .frame_series
            .iter()
            .filter_map(|(k, v)| k.parse::<u64>().ok().map(|f| (f, *v)))
            .collect();
        frames.sort_unstable_by_key(|(f, _)| *f);
        frames
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
