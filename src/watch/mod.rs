//! Live terminal dashboard (`platewatch watch`).
//!
//! Two views, mirroring the web dashboard: `dashboard` (summary stats,
//! active tasks, system health) and `agents` (per-agent status for the most
//! recent processing video). Each data source polls on its own worker
//! thread at a fixed period and the main thread renders whatever arrives.
//!
//! Completions are uncoordinated, so a slow response can land after a newer
//! one. Every fetch is stamped with a per-panel sequence number at issuance
//! and the renderer drops results older than the last applied — the view
//! converges on issuance order, not arrival order.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::api::ApiClient;
use crate::api::types::{AgentStatus, DashboardStats, SystemHealth, Video};
use crate::ui;

/// Which view the watch loop renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Agents,
}

// ---------------------------------------------------------------------------
// Stale-render guard
// ---------------------------------------------------------------------------

/// Holds one panel's latest value together with the issuance sequence of
/// the fetch that produced it.
#[derive(Debug)]
struct Panel<T> {
    value: Option<T>,
    last_seq: u64,
}

impl<T> Panel<T> {
    fn new() -> Self {
        Self {
            value: None,
            last_seq: 0,
        }
    }

    /// Apply a fetched value; returns false (and keeps the current value)
    /// when a newer fetch has already been applied.
    fn apply(&mut self, seq: u64, value: T) -> bool {
        if self.value.is_some() && seq <= self.last_seq {
            return false;
        }
        self.value = Some(value);
        self.last_seq = seq;
        true
    }
}

// ---------------------------------------------------------------------------
// Poll messages
// ---------------------------------------------------------------------------

/// One completed fetch from a poller thread.
enum Update {
    Stats {
        seq: u64,
        stats: DashboardStats,
        tasks: Vec<Video>,
    },
    Health {
        seq: u64,
        health: SystemHealth,
    },
    Agents {
        seq: u64,
        status: AgentStatus,
        filename: String,
    },
    /// A failed fetch. The previous panel content stays on screen.
    Failed { source: &'static str, message: String },
}

/// Run the watch loop until interrupted.
pub fn run(client: Arc<ApiClient>, view: View, interval: Duration) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Update>();

    match view {
        View::Dashboard => {
            spawn_stats_poller(client.clone(), tx.clone(), interval);
            spawn_health_poller(client.clone(), tx.clone(), interval);
        }
        View::Agents => {
            spawn_agents_poller(client.clone(), tx.clone(), interval);
        }
    }
    drop(tx);

    render_loop(view, &rx);
    Ok(())
}

fn render_loop(view: View, rx: &Receiver<Update>) {
    let mut stats: Panel<(DashboardStats, Vec<Video>)> = Panel::new();
    let mut health: Panel<SystemHealth> = Panel::new();
    let mut agents: Panel<(AgentStatus, String)> = Panel::new();
    let mut last_error: Option<String> = None;

    while let Ok(update) = rx.recv() {
        let applied = match update {
            Update::Stats { seq, stats: s, tasks } => stats.apply(seq, (s, tasks)),
            Update::Health { seq, health: h } => health.apply(seq, h),
            Update::Agents { seq, status, filename } => agents.apply(seq, (status, filename)),
            Update::Failed { source, message } => {
                last_error = Some(format!("{source}: {message}"));
                true
            }
        };

        if applied {
            match view {
                View::Dashboard => render_dashboard(&stats, &health, last_error.as_deref()),
                View::Agents => render_agents(&agents, last_error.as_deref()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Poller threads
// ---------------------------------------------------------------------------

fn spawn_stats_poller(client: Arc<ApiClient>, tx: Sender<Update>, interval: Duration) {
    thread::spawn(move || {
        let mut seq: u64 = 0;
        loop {
            seq += 1;
            let result = client.stats().and_then(|stats| {
                let tasks: Vec<Video> = client
                    .list_videos()?
                    .into_iter()
                    .filter(Video::is_active)
                    .collect();
                Ok((stats, tasks))
            });
            let update = match result {
                Ok((stats, tasks)) => Update::Stats { seq, stats, tasks },
                Err(err) => Update::Failed {
                    source: "stats",
                    message: err.to_string(),
                },
            };
            if tx.send(update).is_err() {
                return;
            }
            thread::sleep(interval);
        }
    });
}

fn spawn_health_poller(client: Arc<ApiClient>, tx: Sender<Update>, interval: Duration) {
    thread::spawn(move || {
        let mut seq: u64 = 0;
        loop {
            seq += 1;
            let update = match client.health() {
                Ok(health) => Update::Health { seq, health },
                Err(err) => Update::Failed {
                    source: "health",
                    message: err.to_string(),
                },
            };
            if tx.send(update).is_err() {
                return;
            }
            thread::sleep(interval);
        }
    });
}

fn spawn_agents_poller(client: Arc<ApiClient>, tx: Sender<Update>, interval: Duration) {
    thread::spawn(move || {
        let mut seq: u64 = 0;
        loop {
            seq += 1;
            let update = match fetch_agent_status(&client) {
                Ok(Some((status, filename))) => Update::Agents { seq, status, filename },
                Ok(None) => Update::Failed {
                    source: "agents",
                    message: "no videos uploaded yet".to_string(),
                },
                Err(err) => Update::Failed {
                    source: "agents",
                    message: err.to_string(),
                },
            };
            if tx.send(update).is_err() {
                return;
            }
            thread::sleep(interval);
        }
    });
}

/// Agent status is per-video; prefer the currently processing one, else the
/// most recent upload (the dashboard's selection rule).
fn fetch_agent_status(client: &ApiClient) -> Result<Option<(AgentStatus, String)>, crate::api::ApiError> {
    let videos = client.list_videos()?;
    let Some(video) = videos
        .iter()
        .find(|v| v.status == "processing")
        .or_else(|| videos.first())
    else {
        return Ok(None);
    };

    let status = client.agent_status(video.id)?;
    Ok(Some((status, video.filename.clone())))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Clear the screen and home the cursor before a wholesale redraw.
fn clear_screen() {
    print!("\x1b[2J\x1b[H");
}

fn render_dashboard(
    stats: &Panel<(DashboardStats, Vec<Video>)>,
    health: &Panel<SystemHealth>,
    last_error: Option<&str>,
) {
    clear_screen();
    ui::heading("PLATEWATCH — Live Dashboard");
    println!();

    match &stats.value {
        Some((stats, tasks)) => {
            println!(
                "  {} {:<6}  {} {:<6}  {} {}",
                "Videos:".bold(),
                stats.total_videos,
                "Detections:".bold(),
                stats.total_detections,
                "Failed reads:".bold(),
                stats.total_failed.to_string().yellow(),
            );
            println!();
            println!("{}", "Active Tasks".bold().cyan());
            if tasks.is_empty() {
                println!("  {}", "No active background tasks".dimmed());
            }
            for task in tasks {
                println!(
                    "  {} {:<40} {}",
                    "⟳".blue(),
                    ui::truncate(&task.filename, 40),
                    task.status.to_uppercase().dimmed()
                );
            }
        }
        None => println!("  {}", "Waiting for first stats poll...".dimmed()),
    }

    println!();
    println!("{}", "System Health".bold().cyan());
    match &health.value {
        Some(h) => {
            ui::status_item("GPU", h.gpu_accelerated(), &h.gpu_name);
            ui::status_item("Redis", h.redis_status == "RUNNING", &h.redis_status);
            ui::status_item("Gemini", h.gemini_status == "CONFIGURED", &h.gemini_status);
            ui::status_item("ROI mask", h.roi_status == "ACTIVE", &h.roi_status);
            println!(
                "  CPU {} {:>5.1}%   MEM {} {:>5.1}%   DISK {} {:>5.1}%",
                ui::percent_bar(h.cpu_usage, 10),
                h.cpu_usage,
                ui::percent_bar(h.mem_usage, 10),
                h.mem_usage,
                ui::percent_bar(h.disk_usage, 10),
                h.disk_usage,
            );
        }
        None => println!("  {}", "Waiting for first health poll...".dimmed()),
    }

    footer(last_error);
}

fn render_agents(agents: &Panel<(AgentStatus, String)>, last_error: Option<&str>) {
    clear_screen();
    ui::heading("PLATEWATCH — Agent Status");
    println!();

    match &agents.value {
        Some((status, filename)) => {
            println!(
                "  {} {}  ({})",
                "Video:".bold(),
                ui::truncate(filename, 40),
                status.status.to_uppercase()
            );
            let m = &status.agentic_metrics;
            println!(
                "  {} {}   {} {}   {} {:.1}%   {} ${:.2}",
                "Batches:".bold(),
                m.total_batches,
                "Detections:".bold(),
                m.total_detections,
                "Validated:".bold(),
                m.validation_rate,
                "Cost:".bold(),
                m.total_cost_estimate,
            );
            println!();

            for (name, agent) in &status.agents {
                let state = if agent.is_active() {
                    agent.status.to_uppercase().green()
                } else {
                    agent.status.to_uppercase().dimmed()
                };
                println!(
                    "  {:<10} {:<12} {:<36} {}",
                    name.bold(),
                    state,
                    agent.telemetry.as_deref().unwrap_or("-").dimmed(),
                    format!("{} items", agent.count).dimmed(),
                );
            }

            if let Some(analytics) = &status.analytics {
                let series: Vec<i64> = analytics
                    .frame_series_ordered()
                    .into_iter()
                    .map(|(_, v)| v)
                    .collect();
                if !series.is_empty() {
                    println!();
                    println!(
                        "  {} {}",
                        "Density:".bold(),
                        ui::sparkline(&series).blue()
                    );
                }
            }
        }
        None => println!("  {}", "Waiting for first agent poll...".dimmed()),
    }

    footer(last_error);
}

fn footer(last_error: Option<&str>) {
    println!();
    if let Some(err) = last_error {
        println!("  {} {}", "last error:".red(), err.dimmed());
    }
    println!(
        "  {}",
        format!(
            "refreshed {} — Ctrl+C to exit",
            chrono::Local::now().format("%H:%M:%S")
        )
        .dimmed()
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
