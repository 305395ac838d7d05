//! Configuration loading for platewatch.
//!
//! Layered hierarchy, later layers win at the file level:
//!
//! 1. **Built-in defaults** — [`schema::PlatewatchConfig::default()`]
//! 2. **User global config** — `~/.platewatch/config.toml`
//! 3. **Project local config** — `.platewatch.toml` in the working directory
//! 4. **Environment variables** — `PLATEWATCH_*` overrides (highest)

pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::api::ExpiryNotify;

pub use schema::PlatewatchConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration: defaults → global TOML →
/// project TOML → env vars. Primary entry point for all commands.
pub fn load() -> PlatewatchConfig {
    let mut config = PlatewatchConfig::default();

    if let Some(global) = load_toml_file(global_config_path()) {
        config = global;
    }
    if let Some(project) = load_toml_file(project_config_path()) {
        config = project;
    }

    apply_env_overrides(&mut config);
    config
}

/// Load a TOML config file if it exists and parses. Malformed files are
/// ignored; a broken config must not take every command down with it.
fn load_toml_file(path: Option<PathBuf>) -> Option<PlatewatchConfig> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.platewatch/config.toml`
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".platewatch").join("config.toml"))
}

/// `.platewatch.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".platewatch.toml"))
}

/// Global config path, for display purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Project config path, for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply `PLATEWATCH_*` overrides (highest precedence layer).
///
/// - `PLATEWATCH_BASE_URL` — backend API root
/// - `PLATEWATCH_DASHBOARD_INTERVAL_SECS` — watch poll period
/// - `PLATEWATCH_LOG_INTERVAL_SECS` — log follow poll period
/// - `PLATEWATCH_PAGE_SIZE` — detections page size
/// - `PLATEWATCH_REQUEST_NOTIFY` / `PLATEWATCH_UPLOAD_NOTIFY` —
///   `always` or `skip-auth-paths`
fn apply_env_overrides(config: &mut PlatewatchConfig) {
    if let Ok(val) = std::env::var("PLATEWATCH_BASE_URL")
        && !val.is_empty()
    {
        config.server.base_url = val;
    }
    if let Ok(val) = std::env::var("PLATEWATCH_DASHBOARD_INTERVAL_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.polling.dashboard_interval_secs = secs;
    }
    if let Ok(val) = std::env::var("PLATEWATCH_LOG_INTERVAL_SECS")
        && let Ok(secs) = val.parse::<u64>()
    {
        config.polling.log_interval_secs = secs;
    }
    if let Ok(val) = std::env::var("PLATEWATCH_PAGE_SIZE")
        && let Ok(size) = val.parse::<i64>()
    {
        config.detections.page_size = size;
    }
    if let Ok(val) = std::env::var("PLATEWATCH_REQUEST_NOTIFY")
        && let Some(policy) = parse_notify(&val)
    {
        config.session.request_notify = policy;
    }
    if let Ok(val) = std::env::var("PLATEWATCH_UPLOAD_NOTIFY")
        && let Some(policy) = parse_notify(&val)
    {
        config.session.upload_notify = policy;
    }
}

/// Parse a notify-policy string.
fn parse_notify(val: &str) -> Option<ExpiryNotify> {
    match val.to_ascii_lowercase().as_str() {
        "always" => Some(ExpiryNotify::Always),
        "skip-auth-paths" | "skip_auth_paths" => Some(ExpiryNotify::SkipAuthPaths),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset / show
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.platewatch/config.toml`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.platewatch/ directory")?;
    }
    fs::write(&path, PlatewatchConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `polling.log_interval_secs`) in the global
/// config file, creating it from defaults if missing.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&PlatewatchConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would leave a config load() silently ignores.
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    let _: PlatewatchConfig =
        toml::from_str(&updated).with_context(|| format!("'{value}' is not valid for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Update a dotted key in a TOML tree, preserving the existing value's type.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section, leaf)) = key.split_once('.') else {
        anyhow::bail!("config key must be 'section.field', got '{key}'");
    };

    let table = root
        .get_mut(section)
        .with_context(|| format!("unknown config section '{section}'"))?
        .as_table_mut()
        .with_context(|| format!("'{section}' is not a table"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => {
            toml::Value::Boolean(matches!(raw_value, "1" | "true" | "yes" | "on"))
        }
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(_) | None => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
