//! releasebot setup helper.
//!
//! Asks for the bot token, broadcast channel, allowed operators and catalog
//! URL on the terminal and writes a ready-to-run `config.toml` to the project
//! root (`RELEASEBOT_ROOT`, or the current directory).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/RisingOS-Revived-devices/portal/refs/heads/main/devices.json";

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    channel_id: i64,
    user_ids: &'a [u64],
    catalog_url: &'a str,
    timeout_secs: u64,
    project_name: &'a str,
}

/// Quote and escape a value as a TOML basic string.
fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_owned()).to_string()
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let ids_str = p
        .user_ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let project_line = if p.project_name.is_empty() {
        "# project_name = \"RisingOS-Revived\"".to_owned()
    } else {
        format!("project_name = {}", toml_string(p.project_name))
    };

    let bot_token = toml_string(p.bot_token);
    let channel_id = p.channel_id;
    let catalog_url = toml_string(p.catalog_url);
    let timeout_secs = p.timeout_secs;

    format!(
        r#"[telegram]
bot_token = {bot_token}
channel_id = {channel_id}
allowed_user_ids = [{ids_str}]

[catalog]
url = {catalog_url}
timeout_secs = {timeout_secs}

[announcement]
{project_line}

[health]
enabled = false
bind = "0.0.0.0:8080"
"#
    )
}

// ── Input checks ───────────────────────────────────────────────────────────────

fn check_token(raw: &str) -> Result<String> {
    let token = raw.trim();
    if token.is_empty() {
        anyhow::bail!("The bot token is required");
    }
    Ok(token.to_owned())
}

fn check_channel_id(raw: &str) -> Result<i64> {
    let id: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Channel ID must be an integer, got '{}'", raw.trim()))?;
    if id == 0 {
        anyhow::bail!("Channel ID must not be 0");
    }
    Ok(id)
}

fn check_user_ids(raw: &str) -> Result<Vec<u64>> {
    let ids = raw
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("Invalid user ID '{s}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    if ids.is_empty() {
        anyhow::bail!("At least one allowed user ID is required");
    }
    Ok(ids)
}

// ── CLI ────────────────────────────────────────────────────────────────────────

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        anyhow::bail!("Input closed before setup finished");
    }
    Ok(buf.trim().to_owned())
}

/// Ask again until `check` accepts the answer.
fn prompt_until<T>(prompt: &str, check: impl Fn(&str) -> Result<T>) -> Result<T> {
    loop {
        match check(&read_line(prompt)?) {
            Ok(value) => return Ok(value),
            Err(e) => println!("  ✗ {e:#}"),
        }
    }
}

fn run_cli(project_root: &Path) -> Result<()> {
    println!("=== releasebot setup ===\n");

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let bot_token = prompt_until("Telegram bot token: ", check_token)?;
    let channel_id = prompt_until(
        "Broadcast channel ID (e.g. -1001234567890): ",
        check_channel_id,
    )?;
    let user_ids = prompt_until("Allowed user IDs (comma-separated): ", check_user_ids)?;
    let catalog_url = or_default(
        read_line(&format!("Devices list URL [{DEFAULT_CATALOG_URL}]: "))?,
        DEFAULT_CATALOG_URL,
    );
    let project_name = read_line("Project name (optional, e.g. RisingOS-Revived): ")?;

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        channel_id,
        user_ids: &user_ids,
        catalog_url: &catalog_url,
        timeout_secs: 15,
        project_name: &project_name,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Run the bot with:  cargo run");
    Ok(())
}

fn main() -> Result<()> {
    let project_root =
        PathBuf::from(std::env::var("RELEASEBOT_ROOT").unwrap_or_else(|_| ".".to_string()));
    run_cli(&project_root)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
