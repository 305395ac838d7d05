//! Command handlers. Each handler builds on the typed API surface and
//! renders with the helpers in [`crate::ui`]; argument parsing lives in
//! `main.rs`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use regex::Regex;
use serde_json::json;

use crate::api::{ApiClient, DetectionQuery, FileTokenStore};
use crate::config::PlatewatchConfig;
use crate::ui;

/// Build the authenticated client all commands share: file-backed token
/// store, session-expiry hint on stderr, notify policies from config.
pub fn build_client(config: &PlatewatchConfig) -> Result<Arc<ApiClient>> {
    let tokens = FileTokenStore::new()
        .ok_or_else(|| anyhow!("cannot determine home directory for session storage"))?;

    let client = ApiClient::new(&config.server.base_url, Box::new(tokens))
        .with_notify_policies(config.session.request_notify, config.session.upload_notify)
        .with_expiry_sink(Box::new(ui::session_expired));

    Ok(Arc::new(client))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

pub fn login(client: &ApiClient, email: &str, password: &str) -> Result<()> {
    client
        .login(email, password)
        .with_context(|| format!("login failed for {email}"))?;
    ui::notify_success(&format!("Logged in as {email}"));
    Ok(())
}

pub fn register(client: &ApiClient, email: &str, password: &str) -> Result<()> {
    client
        .register(email, password)
        .with_context(|| format!("registration failed for {email}"))?;
    ui::notify_success(&format!("Account created for {email}; now run: platewatch login"));
    Ok(())
}

pub fn logout(client: &ApiClient) -> Result<()> {
    if client.token().is_none() {
        ui::notify_warn("No active session");
        return Ok(());
    }
    client.clear_token();
    ui::notify_success("Logged out");
    Ok(())
}

pub fn whoami(client: &ApiClient) -> Result<()> {
    let user = client.me().context("not logged in")?;
    println!("{} (user #{})", user.email.bold(), user.id);
    if !user.created_at.is_empty() {
        println!("  registered {}", ui::format_timestamp(&user.created_at).dimmed());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

pub fn videos_list(client: &ApiClient) -> Result<()> {
    let videos = client.list_videos().context("failed to list videos")?;
    if videos.is_empty() {
        ui::notify_warn("No videos uploaded yet");
        return Ok(());
    }

    println!(
        "{:<6} {:<42} {:<12} {}",
        "ID".bold(),
        "FILENAME".bold(),
        "STATUS".bold(),
        "UPLOADED".bold()
    );
    for video in &videos {
        let status = match video.status.as_str() {
            "completed" => video.status.green(),
            "failed" => video.status.red(),
            "processing" | "pending" => video.status.yellow(),
            _ => video.status.normal(),
        };
        println!(
            "{:<6} {:<42} {:<12} {}",
            video.id,
            ui::truncate(&video.filename, 42),
            status,
            ui::format_timestamp(&video.created_at).dimmed(),
        );
    }
    Ok(())
}

pub fn videos_upload(client: &ApiClient, path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{} is not a file", path.display());
    }
    let video = client
        .upload_video(path)
        .with_context(|| format!("failed to upload {}", path.display()))?;
    ui::notify_success(&format!(
        "Uploaded {} as video #{}; processing has started",
        video.filename, video.id
    ));
    println!("  follow progress with: platewatch logs {} --follow", video.id);
    Ok(())
}

pub fn videos_delete(client: &ApiClient, id: i64) -> Result<()> {
    client
        .delete_video(id)
        .with_context(|| format!("failed to delete video {id}"))?;
    ui::notify_success(&format!("Deleted video #{id} and its detections"));
    Ok(())
}

pub fn videos_stream_url(client: &ApiClient, id: i64) -> Result<()> {
    match client.stream_url(id) {
        Some(url) => {
            println!("{url}");
            Ok(())
        }
        None => bail!("not logged in; run: platewatch login"),
    }
}

// ---------------------------------------------------------------------------
// Detections
// ---------------------------------------------------------------------------

/// Free-text search routing: anything with a space or longer than a plate
/// prefix goes to the semantic vehicle search, short alphanumerics filter
/// by plate.
fn route_search(query: &str) -> (Option<String>, Option<String>) {
    if query.contains(' ') || query.len() > 4 {
        (None, Some(query.to_string()))
    } else {
        (Some(query.to_string()), None)
    }
}

#[derive(Debug, Default)]
pub struct DetectionListArgs {
    pub search: Option<String>,
    pub min_confidence: Option<f64>,
    pub recheck_status: Option<String>,
    pub video_id: Option<i64>,
    pub page: i64,
}

pub fn detections_list(
    client: &ApiClient,
    args: &DetectionListArgs,
    page_size: i64,
) -> Result<()> {
    let mut query = DetectionQuery::page(args.page, page_size);
    if let Some(search) = &args.search {
        let (plate, vehicle) = route_search(search);
        query.plate = plate;
        query.vehicle_query = vehicle;
    }
    query.min_confidence = args.min_confidence;
    query.recheck_status = args.recheck_status.clone();
    query.video_id = args.video_id;

    let page = client
        .detections(&query)
        .context("failed to fetch detections")?;
    if page.items.is_empty() {
        ui::notify_warn("No detections match");
        return Ok(());
    }

    println!(
        "{:<8} {:<14} {:<6} {:<8} {:<28} {}",
        "ID".bold(),
        "PLATE".bold(),
        "CONF".bold(),
        "TIME".bold(),
        "VEHICLE".bold(),
        "STATUS".bold()
    );
    for d in &page.items {
        let plate = if d.plate_number.is_some() {
            d.plate().bold()
        } else {
            d.plate().dimmed()
        };
        let conf = d
            .confidence
            .map(|c| format!("{:.0}%", c * 100.0))
            .unwrap_or_else(|| "-".to_string());
        let vehicle = d
            .make_model
            .as_deref()
            .or(d.vehicle_type.as_deref())
            .unwrap_or("-");
        let status = match d.recheck_status.as_deref() {
            Some("RECOVERED") => "RECOVERED".green(),
            Some("FAILED") => "FAILED".red(),
            Some(other) => other.yellow(),
            None if d.is_validated => "VALIDATED".green(),
            None => "".normal(),
        };
        println!(
            "{:<8} {:<14} {:<6} {:<8} {:<28} {}",
            d.id,
            plate,
            conf,
            ui::format_seconds(d.timestamp.unwrap_or(0.0)),
            ui::truncate(vehicle, 28),
            status,
        );
    }

    let first = query.skip + 1;
    let last = query.skip + page.items.len() as i64;
    println!(
        "{}",
        format!(
            "Showing {first}-{last} of {} (page {})",
            page.total,
            args.page + 1
        )
        .dimmed()
    );
    Ok(())
}

/// Uppercase and strip spacing, then check the result looks like a plate
/// before sending the correction.
fn normalize_plate(raw: &str) -> Result<String> {
    let plate: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let shape = Regex::new(r"^[A-Z0-9-]{2,16}$").unwrap();
    if !shape.is_match(&plate) {
        bail!("'{raw}' does not look like a plate number");
    }
    Ok(plate)
}

pub fn detections_correct(client: &ApiClient, id: i64, plate: &str) -> Result<()> {
    let plate = normalize_plate(plate)?;
    let updated = client
        .correct_detection(id, &plate)
        .with_context(|| format!("failed to correct detection {id}"))?;
    ui::notify_success(&format!("Detection #{} corrected to {}", updated.id, updated.plate()));
    Ok(())
}

pub fn detections_delete(client: &ApiClient, id: i64) -> Result<()> {
    client
        .delete_detection(id)
        .with_context(|| format!("failed to delete detection {id}"))?;
    ui::notify_success(&format!("Deleted detection #{id}"));
    Ok(())
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

pub fn agents_show(client: &ApiClient) -> Result<()> {
    let settings = client
        .agent_settings()
        .context("failed to fetch agent settings")?;
    ui::heading("Agent Settings");
    println!("  {:<22} {}", "collage_size".bold(), settings.collage_size);
    println!("  {:<22} {}", "sensitivity".bold(), settings.sensitivity);
    println!(
        "  {:<22} {}",
        "detection_threshold".bold(),
        settings
            .detection_threshold
            .map(|t| t.to_string())
            .unwrap_or_else(|| "default".to_string()),
    );
    println!(
        "  {:<22} {}",
        "track_persistence".bold(),
        settings.track_persistence
    );
    println!(
        "  {:<22} {}",
        "max_gemini_calls".bold(),
        settings
            .max_gemini_calls
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string()),
    );
    Ok(())
}

#[derive(Debug, Default)]
pub struct AgentSettingsArgs {
    pub collage_size: Option<i64>,
    pub sensitivity: Option<String>,
    pub detection_threshold: Option<f64>,
    pub track_persistence: Option<i64>,
    pub max_gemini_calls: Option<i64>,
}

pub fn agents_set(client: &ApiClient, args: &AgentSettingsArgs) -> Result<()> {
    let mut body = serde_json::Map::new();
    if let Some(v) = args.collage_size {
        body.insert("collage_size".to_string(), json!(v));
    }
    if let Some(v) = &args.sensitivity {
        let v = v.to_lowercase();
        if !["low", "medium", "high"].contains(&v.as_str()) {
            bail!("sensitivity must be low, medium, or high");
        }
        body.insert("sensitivity".to_string(), json!(v));
    }
    if let Some(v) = args.detection_threshold {
        if !(0.0..=1.0).contains(&v) {
            bail!("detection threshold must be between 0.0 and 1.0");
        }
        body.insert("detection_threshold".to_string(), json!(v));
    }
    if let Some(v) = args.track_persistence {
        body.insert("track_persistence".to_string(), json!(v));
    }
    if let Some(v) = args.max_gemini_calls {
        body.insert("max_gemini_calls".to_string(), json!(v));
    }
    if body.is_empty() {
        bail!("nothing to change; pass at least one setting flag");
    }

    client
        .update_agent_settings(&serde_json::Value::Object(body))
        .context("failed to update agent settings")?;
    ui::notify_success("Agent settings updated");
    Ok(())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub fn health(client: &ApiClient) -> Result<()> {
    let h = client.health().context("failed to fetch system health")?;
    ui::heading("System Health");
    ui::status_item("GPU", h.gpu_accelerated(), &format!("{} ({})", h.gpu_name, h.gpu_caps));
    ui::status_item("Redis", h.redis_status == "RUNNING", &h.redis_status);
    ui::status_item("Gemini", h.gemini_status == "CONFIGURED", &h.gemini_status);
    ui::status_item("ROI mask", h.roi_status == "ACTIVE", &h.roi_status);
    println!("  {:<10} {}", "CPU".bold(), h.cpu_name);
    println!("  {:<10} {} total", "Memory".bold(), h.memory_total);
    println!("  {:<10} {} ({})", "OS".bold(), h.os, h.disk_name);
    println!(
        "  {:<10} cpu {:.1}%  mem {:.1}%  disk {:.1}%",
        "Load".bold(),
        h.cpu_usage,
        h.mem_usage,
        h.disk_usage,
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_alphanumeric_routes_to_plate() {
        assert_eq!(route_search("KA01"), (Some("KA01".to_string()), None));
    }

    #[test]
    fn long_or_spaced_routes_to_vehicle_query() {
        assert_eq!(
            route_search("red swift"),
            (None, Some("red swift".to_string()))
        );
        assert_eq!(route_search("KA01AB1234"), (None, Some("KA01AB1234".to_string())));
    }

    #[test]
    fn plate_normalization_uppercases_and_strips() {
        assert_eq!(normalize_plate("ka 01 ab 1234").unwrap(), "KA01AB1234");
    }

    #[test]
    fn plate_normalization_rejects_junk() {
        assert!(normalize_plate("!!").is_err());
        assert!(normalize_plate("not a plate at all really").is_err());
        assert!(normalize_plate("").is_err());
    }
}
