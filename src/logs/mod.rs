//! Processing-log viewer and follower.
//!
//! One-shot mode prints the current log for a video; `--follow` re-fetches
//! on a fixed timer (3 s by default) and prints only entries not yet seen,
//! the terminal analog of the dashboard's log modal polling loop.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use colored::{ColoredString, Colorize};

use crate::api::ApiClient;
use crate::api::types::ProcessingLog;
use crate::ui;

/// Fetch the log once and print it, or follow it until interrupted.
pub fn run(
    client: Arc<ApiClient>,
    video_id: i64,
    agent: Option<&str>,
    follow: bool,
    interval: Duration,
) -> Result<()> {
    let entries = fetch(&client, video_id, agent)?;

    if entries.is_empty() {
        println!(
            "{}",
            "No logs generated yet. Processing starting...".dimmed()
        );
    }
    for entry in &entries {
        print_entry(entry);
    }

    if !follow {
        return Ok(());
    }

    // Entries arrive ordered by created_at; ids are append-only, so the
    // highest id seen is the resume point.
    let mut last_id = entries.iter().map(|e| e.id).max().unwrap_or(0);
    loop {
        thread::sleep(interval);
        match fetch(&client, video_id, agent) {
            Ok(entries) => last_id = print_new_entries(&entries, last_id),
            // Failures leave the previous output intact; next tick retries.
            Err(err) => ui::notify_warn(&format!("log fetch failed: {err}")),
        }
    }
}

/// Print the entries newer than `last_id` and return the new resume point.
fn print_new_entries(entries: &[ProcessingLog], last_id: i64) -> i64 {
    let mut newest = last_id;
    for entry in entries.iter().filter(|e| e.id > last_id) {
        print_entry(entry);
        newest = newest.max(entry.id);
    }
    newest
}

/// Unfiltered requests use the master per-video log; an agent filter routes
/// through the agentic endpoint, matching the upstream dashboard.
fn fetch(client: &ApiClient, video_id: i64, agent: Option<&str>) -> Result<Vec<ProcessingLog>> {
    let entries = match agent {
        Some(agent) => client.agent_logs(video_id, Some(agent))?,
        None => client.video_logs(video_id)?,
    };
    Ok(entries)
}

fn print_entry(entry: &ProcessingLog) {
    let time = ui::format_time_of_day(&entry.created_at);
    println!(
        "{} {:>10} {}",
        time.dimmed(),
        event_tag(&entry.event_type, entry.is_error),
        if entry.is_error {
            entry.message.red().to_string()
        } else {
            entry.message.clone()
        }
    );
}

/// Event-type coloring, carried over from the dashboard's log taxonomy.
fn event_tag(event_type: &str, is_error: bool) -> ColoredString {
    let tag = format!("[{event_type}]");
    if is_error {
        return tag.red().bold();
    }
    match event_type {
        "GEMINI" | "AI_RECHECK" => tag.blue(),
        "CAPTURER" | "BATCH" => tag.magenta(),
        "QC" | "RECOVERED" => tag.green(),
        "DETECTOR" | "DETECTION" => tag.normal(),
        _ => tag.dimmed(),
    }
}

/// Print the expanded metadata for one log entry (`logs details <id>`).
pub fn show_details(client: &ApiClient, log_id: i64) -> Result<()> {
    let details = client.log_details(log_id)?;

    println!(
        "{} {}",
        event_tag(&details.event_type, false),
        details.message
    );

    let Some(extra) = details.extra_data else {
        println!(
            "{}",
            "No additional metadata available for this event.".dimmed()
        );
        return Ok(());
    };

    // Pretty-print JSON payloads; anything else (file paths, free text)
    // is shown raw.
    match serde_json::from_str::<serde_json::Value>(extra.trim()) {
        Ok(json) if json.is_object() || json.is_array() => {
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        _ => println!("{extra}"),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, event_type: &str, is_error: bool) -> ProcessingLog {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "event_type": event_type,
            "message": "m",
            "is_error": is_error,
            "created_at": "2026-01-05T10:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn resume_point_advances_past_printed_entries() {
        let entries = vec![
            entry(1, "SYSTEM", false),
            entry(5, "GEMINI", false),
            entry(3, "CAPTURER", false),
        ];
        assert_eq!(print_new_entries(&entries, 1), 5);
        assert_eq!(print_new_entries(&entries, 5), 5);
        assert_eq!(print_new_entries(&[], 5), 5);
    }

    #[test]
    fn error_tag_wins_over_event_color() {
        let tag = event_tag("GEMINI", true);
        assert!(tag.to_string().contains("[GEMINI]"));
    }
}
