//! Analysis report for a processed video (`platewatch videos report`).
//!
//! Renders the analytics blob stored on the video record: executive
//! summary, helmet compliance, vehicle mix, density over time, and the
//! tail of the processing log.

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::ApiClient;
use crate::api::types::{Video, VideoAnalytics};
use crate::ui;

/// Vehicle classes rendered in the mix table, in display order.
const VEHICLE_CLASSES: [&str; 7] = [
    "CAR",
    "MOTORCYCLE",
    "SCOOTER",
    "BICYCLE",
    "BUS",
    "TRUCK",
    "AUTO",
];

/// How many trailing log entries the report shows.
const LOG_TAIL: usize = 15;

pub fn run(client: Arc<ApiClient>, video_id: i64) -> Result<()> {
    let video = client
        .video(video_id)
        .with_context(|| format!("failed to fetch video {video_id}"))?;

    let analytics = if let Some(blob) = video.analytics_data.as_deref() {
        VideoAnalytics::from_blob(blob)
            .with_context(|| format!("malformed analytics on video {video_id}"))?
    } else {
        // No analytics on the record. A completed video can still have a
        // report generated on demand; otherwise the status tells the user
        // what to expect.
        let fallback = match video.status.as_str() {
            "completed" => generated_report(&client, video_id),
            _ => None,
        };
        match fallback {
            Some(analytics) => analytics,
            None => {
                ui::notify_warn(&match video.status.as_str() {
                    "completed" => format!(
                        "Analytics for {} are temporarily unavailable",
                        video.filename
                    ),
                    "failed" => {
                        format!("Analysis of {} failed; no report available", video.filename)
                    }
                    _ => format!(
                        "{} is still being analyzed ({}); try again later",
                        video.filename, video.status
                    ),
                });
                return Ok(());
            }
        }
    };

    render(&video, &analytics);
    render_log_tail(&client, video_id)?;
    Ok(())
}

/// Ask the backend for the generated report when the video row carries no
/// analytics blob. Best-effort: any failure falls through to the
/// unavailable message.
fn generated_report(client: &ApiClient, video_id: i64) -> Option<VideoAnalytics> {
    let value = client.video_report(video_id).ok()?;
    serde_json::from_value(value).ok()
}

// ---------------------------------------------------------------------------
// Derived figures
// ---------------------------------------------------------------------------

/// Helmet compliance figures derived from the class counts.
#[derive(Debug, PartialEq)]
struct HelmetCompliance {
    riders: i64,
    with_helmet: i64,
    rate: f64,
}

fn helmet_compliance(analytics: &VideoAnalytics) -> Option<HelmetCompliance> {
    let with_helmet = analytics.counts.get("HELMET").copied().unwrap_or(0);
    let without = analytics.counts.get("NO_HELMET").copied().unwrap_or(0);
    let riders = with_helmet + without;
    if riders == 0 {
        return None;
    }
    Some(HelmetCompliance {
        riders,
        with_helmet,
        rate: with_helmet as f64 * 100.0 / riders as f64,
    })
}

fn batch_success_rate(analytics: &VideoAnalytics) -> Option<f64> {
    let m = &analytics.capture_metrics;
    if m.total_batches == 0 {
        return None;
    }
    Some(m.successful_batches as f64 * 100.0 / m.total_batches as f64)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(video: &Video, analytics: &VideoAnalytics) {
    ui::heading(&format!("Analysis Report — {}", video.filename));
    println!();

    let meta = &analytics.metadata;
    println!(
        "  {} {}   {} {} frames @ {:.1} fps   {} {}",
        "Resolution:".bold(),
        meta.resolution.as_deref().unwrap_or("unknown"),
        "Length:".bold(),
        meta.total_frames,
        meta.avg_fps,
        "Processed in:".bold(),
        ui::format_seconds(meta.processing_duration_sec),
    );
    if let Some(at) = &analytics.processed_at {
        println!("  {} {}", "Processed at:".bold(), ui::format_timestamp(at));
    }
    println!();

    println!("{}", "Executive Summary".bold().cyan());
    println!(
        "  {} vehicles seen, peak density {} per frame",
        analytics.total_vehicles_seen.to_string().bold(),
        analytics.peak_vehicle_density,
    );
    println!(
        "  {} images captured across {} batches{}",
        analytics.capture_metrics.total_captured_images,
        analytics.capture_metrics.total_batches,
        match batch_success_rate(analytics) {
            Some(rate) => format!(" ({rate:.0}% successful)"),
            None => String::new(),
        },
    );
    println!();

    println!("{}", "Helmet Compliance".bold().cyan());
    match helmet_compliance(analytics) {
        Some(hc) => {
            let colored_rate = if hc.rate >= 80.0 {
                format!("{:.1}%", hc.rate).green()
            } else {
                format!("{:.1}%", hc.rate).yellow()
            };
            println!(
                "  {} {}  ({} of {} riders wearing helmets)",
                ui::percent_bar(hc.rate, 20),
                colored_rate,
                hc.with_helmet,
                hc.riders,
            );
        }
        None => println!("  {}", "No rider detections in this video".dimmed()),
    }
    println!();

    println!("{}", "Vehicle Mix".bold().cyan());
    let shown = render_vehicle_mix(analytics);
    if !shown {
        println!("  {}", "No vehicle classifications recorded".dimmed());
    }
    println!();

    let series: Vec<i64> = analytics
        .frame_series_ordered()
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    if !series.is_empty() {
        println!("{}", "Density Over Time".bold().cyan());
        println!("  {}", ui::sparkline(&series).blue());
        println!();
    }
}

fn render_vehicle_mix(analytics: &VideoAnalytics) -> bool {
    let total: i64 = VEHICLE_CLASSES
        .iter()
        .filter_map(|c| analytics.counts.get(*c))
        .sum();
    if total == 0 {
        return false;
    }
    for class in VEHICLE_CLASSES {
        let count = analytics.counts.get(class).copied().unwrap_or(0);
        if count == 0 {
            continue;
        }
        let share = count as f64 * 100.0 / total as f64;
        println!(
            "  {:<12} {:>5}  {} {:.1}%",
            class,
            count,
            ui::percent_bar(share, 16),
            share,
        );
    }
    true
}

fn render_log_tail(client: &ApiClient, video_id: i64) -> Result<()> {
    let logs = client
        .video_logs(video_id)
        .with_context(|| format!("failed to fetch logs for video {video_id}"))?;
    if logs.is_empty() {
        return Ok(());
    }

    println!("{}", "Processing Log (tail)".bold().cyan());
    let start = logs.len().saturating_sub(LOG_TAIL);
    for entry in &logs[start..] {
        let line = format!(
            "  {} [{}] {}",
            ui::format_time_of_day(&entry.created_at),
            entry.event_type,
            ui::truncate(&entry.message, 90),
        );
        if entry.is_error {
            println!("{}", line.red());
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn analytics_with_counts(pairs: &[(&str, i64)]) -> VideoAnalytics {
        let mut analytics = VideoAnalytics::default();
        for (k, v) in pairs {
            analytics.counts.insert((*k).to_string(), *v);
        }
        analytics
    }

    #[test]
    fn helmet_rate_from_counts() {
        let analytics = analytics_with_counts(&[("HELMET", 8), ("NO_HELMET", 2)]);
        let hc = helmet_compliance(&analytics).unwrap();
        assert_eq!(hc.riders, 10);
        assert_eq!(hc.with_helmet, 8);
        assert!((hc.rate - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn helmet_rate_absent_without_riders() {
        let analytics = analytics_with_counts(&[("CAR", 5)]);
        assert!(helmet_compliance(&analytics).is_none());
    }

    #[test]
    fn helmet_rate_zero_when_all_bareheaded() {
        let analytics = analytics_with_counts(&[("NO_HELMET", 3)]);
        let hc = helmet_compliance(&analytics).unwrap();
        assert_eq!(hc.with_helmet, 0);
        assert!(hc.rate.abs() < f64::EPSILON);
    }

    #[test]
    fn batch_success_rate_guards_division() {
        let analytics = VideoAnalytics::default();
        assert!(batch_success_rate(&analytics).is_none());

        let mut analytics = VideoAnalytics::default();
        analytics.capture_metrics.total_batches = 4;
        analytics.capture_metrics.successful_batches = 3;
        assert!((batch_success_rate(&analytics).unwrap() - 75.0).abs() < f64::EPSILON);
    }
}
