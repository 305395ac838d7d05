use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use platewatch::{cli, config, logs, report, ui, watch};

#[derive(Debug, Parser)]
#[command(name = "platewatch")]
#[command(about = "Terminal client for the vehicle detection and plate recognition backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        email: String,
        password: String,
    },
    /// Create a new account
    Register {
        email: String,
        password: String,
    },
    /// Discard the stored session token
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Live-updating dashboard (Ctrl+C to exit)
    Watch {
        /// View to render: dashboard (default) or agents
        #[arg(long, default_value = "dashboard")]
        view: String,
        /// Poll period in seconds (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Print processing logs for a video
    Logs {
        video_id: i64,
        /// Filter to one agent: DETECTOR, CAPTURER, GEMINI, QC
        #[arg(long)]
        agent: Option<String>,
        /// Keep polling for new entries
        #[arg(long, short)]
        follow: bool,
        /// Poll period in seconds when following (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Full forensic payload for a single log entry
    LogDetails { log_id: i64 },
    /// System health snapshot
    Health,
    /// Manage uploaded videos
    Videos {
        #[command(subcommand)]
        command: VideoCommands,
    },
    /// Browse and correct detections
    Detections {
        #[command(subcommand)]
        command: DetectionCommands,
    },
    /// Inspect and tune the processing agents
    Agents {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Manage platewatch configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum VideoCommands {
    /// List uploaded videos
    List,
    /// Upload a video for analysis
    Upload { path: PathBuf },
    /// Delete a video and its detections
    Delete { id: i64 },
    /// Render the analysis report for a processed video
    Report { id: i64 },
    /// Print a tokenized streaming URL for a media player
    StreamUrl { id: i64 },
}

#[derive(Debug, Subcommand)]
enum DetectionCommands {
    /// List detections, newest first
    List {
        /// Plate prefix or free-text vehicle description
        search: Option<String>,
        /// Minimum confidence, 0.0 to 1.0
        #[arg(long)]
        min_confidence: Option<f64>,
        /// Filter by recheck status, e.g. RECOVERED or FAILED
        #[arg(long)]
        status: Option<String>,
        /// Only detections from this video
        #[arg(long)]
        video: Option<i64>,
        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: i64,
    },
    /// Correct a misread plate number
    Correct { id: i64, plate: String },
    /// Delete a detection
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum AgentCommands {
    /// Show current agent settings
    Show,
    /// Update agent settings (only the flags you pass change)
    Set {
        #[arg(long)]
        collage_size: Option<i64>,
        /// low, medium, or high
        #[arg(long)]
        sensitivity: Option<String>,
        /// 0.0 to 1.0
        #[arg(long)]
        detection_threshold: Option<f64>,
        #[arg(long)]
        track_persistence: Option<i64>,
        #[arg(long)]
        max_gemini_calls: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. server.base_url http://host:8000/api
    Set { key: String, value: String },
    /// Print the effective merged configuration
    Show,
    /// Restore the global config file to defaults
    Reset,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // All failures exit through the one notification surface.
            ui::notify_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    // Config commands never need a client (or a reachable backend).
    let command = match app.command {
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Init { force } => {
                    let path = config::init_config(force)?;
                    ui::notify_success(&format!("Wrote {}", path.display()));
                    Ok(())
                }
                ConfigCommands::Set { key, value } => {
                    config::set_config_value(&key, &value)?;
                    ui::notify_success(&format!("Set {key} = {value}"));
                    Ok(())
                }
                ConfigCommands::Show => {
                    print!("{}", config::show_effective_config()?);
                    Ok(())
                }
                ConfigCommands::Reset => {
                    let path = config::reset_config()?;
                    ui::notify_success(&format!("Reset {}", path.display()));
                    Ok(())
                }
            };
        }
        other => other,
    };

    let client = cli::build_client(&cfg)?;

    match command {
        Commands::Login { email, password } => cli::login(&client, &email, &password),
        Commands::Register { email, password } => cli::register(&client, &email, &password),
        Commands::Logout => cli::logout(&client),
        Commands::Whoami => cli::whoami(&client),
        Commands::Watch { view, interval } => {
            let view = match view.as_str() {
                "dashboard" => watch::View::Dashboard,
                "agents" => watch::View::Agents,
                other => anyhow::bail!("unknown view '{other}'; use dashboard or agents"),
            };
            let secs = interval.unwrap_or(cfg.polling.dashboard_interval_secs);
            watch::run(client, view, Duration::from_secs(secs))
        }
        Commands::Logs {
            video_id,
            agent,
            follow,
            interval,
        } => {
            let secs = interval.unwrap_or(cfg.polling.log_interval_secs);
            logs::run(
                client,
                video_id,
                agent.as_deref(),
                follow,
                Duration::from_secs(secs),
            )
        }
        Commands::LogDetails { log_id } => logs::show_details(&client, log_id),
        Commands::Health => cli::health(&client),
        Commands::Videos { command } => match command {
            VideoCommands::List => cli::videos_list(&client),
            VideoCommands::Upload { path } => cli::videos_upload(&client, &path),
            VideoCommands::Delete { id } => cli::videos_delete(&client, id),
            VideoCommands::Report { id } => report::run(Arc::clone(&client), id),
            VideoCommands::StreamUrl { id } => cli::videos_stream_url(&client, id),
        },
        Commands::Detections { command } => match command {
            DetectionCommands::List {
                search,
                min_confidence,
                status,
                video,
                page,
            } => {
                let args = cli::DetectionListArgs {
                    search,
                    min_confidence,
                    recheck_status: status,
                    video_id: video,
                    page,
                };
                cli::detections_list(&client, &args, cfg.detections.page_size)
            }
            DetectionCommands::Correct { id, plate } => {
                cli::detections_correct(&client, id, &plate)
            }
            DetectionCommands::Delete { id } => cli::detections_delete(&client, id),
        },
        Commands::Agents { command } => match command {
            AgentCommands::Show => cli::agents_show(&client),
            AgentCommands::Set {
                collage_size,
                sensitivity,
                detection_threshold,
                track_persistence,
                max_gemini_calls,
            } => {
                let args = cli::AgentSettingsArgs {
                    collage_size,
                    sensitivity,
                    detection_threshold,
                    track_persistence,
                    max_gemini_calls,
                };
                cli::agents_set(&client, &args)
            }
        },
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
