//! Terminal output helpers shared by all commands.
//!
//! The upstream dashboard surfaced failures through a mix of blocking
//! alerts, inline placeholder text, and console-only logging. Here every
//! call site goes through one notification surface so user-visible feedback
//! stays uniform.

use colored::Colorize;

// ---------------------------------------------------------------------------
// Notification sink
// ---------------------------------------------------------------------------

/// Success notification (the toast analog).
pub fn notify_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Error notification. Goes to stderr so piped output stays clean.
pub fn notify_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Non-fatal warning.
pub fn notify_warn(msg: &str) {
    eprintln!("{} {}", "!".yellow().bold(), msg);
}

/// Printed by the gateway's expiry sink once the token has been cleared.
pub fn session_expired(status: u16) {
    eprintln!(
        "{} Session expired (HTTP {status}). Run {} to sign in again.",
        "✗".red().bold(),
        "platewatch login".bold()
    );
}

/// A labeled pass/fail line for health-style listings.
pub fn status_item(name: &str, ok: bool, detail: &str) {
    let mark = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<22} {}", mark, name, detail.dimmed());
}

/// Section header with an underline, the house style for reports.
pub fn heading(title: &str) {
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(title.chars().count().max(40)));
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a video offset in seconds as `HH:MM:SS`.
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00:00".to_string();
    }
    let total = seconds as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Render a backend timestamp for display. The backend emits both RFC 3339
/// and naive `YYYY-MM-DDTHH:MM:SS` strings; anything unparseable is shown
/// as-is.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}

/// Time-of-day portion of a backend timestamp, for log lines.
pub fn format_time_of_day(raw: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%H:%M:%S").to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%H:%M:%S").to_string();
    }
    raw.to_string()
}

/// Truncate to `max_len` characters, appending `…` when shortened.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

/// A fixed-width percentage bar, `filled`/`width` proportional to `pct`.
pub fn percent_bar(pct: f64, width: usize) -> String {
    let clamped = pct.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Unicode sparkline over a series (the traffic-density chart analog).
pub fn sparkline(values: &[i64]) -> String {
    const TICKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let max = values.iter().copied().max().unwrap_or(0);
    if max <= 0 {
        return "▁".repeat(values.len());
    }

    values
        .iter()
        .map(|&v| {
            let v = v.max(0);
            let idx = ((v * (TICKS.len() as i64 - 1)) + max / 2) / max;
            TICKS[idx as usize]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_seconds_edges() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(-5.0), "00:00:00");
        assert_eq!(format_seconds(f64::NAN), "00:00:00");
        assert_eq!(format_seconds(61.4), "00:01:01");
        assert_eq!(format_seconds(3661.0), "01:01:01");
    }

    #[test]
    fn format_timestamp_variants() {
        assert_eq!(
            format_timestamp("2026-01-05T10:20:30+00:00"),
            "2026-01-05 10:20:30"
        );
        assert_eq!(
            format_timestamp("2026-01-05T10:20:30.123456"),
            "2026-01-05 10:20:30"
        );
        assert_eq!(format_timestamp("garbage"), "garbage");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("áéíóú", 3), "áé…");
    }

    #[test]
    fn percent_bar_bounds() {
        assert_eq!(percent_bar(0.0, 4), "░░░░");
        assert_eq!(percent_bar(100.0, 4), "████");
        assert_eq!(percent_bar(150.0, 4), "████");
        assert_eq!(percent_bar(50.0, 4), "██░░");
    }

    #[test]
    fn sparkline_scales_to_max() {
        assert_eq!(sparkline(&[]), "");
        assert_eq!(sparkline(&[0, 0]), "▁▁");
        let line = sparkline(&[0, 4, 8]);
        assert_eq!(line.chars().count(), 3);
        assert!(line.ends_with('█'));
        assert!(line.starts_with('▁'));
    }
}
