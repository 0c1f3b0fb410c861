use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub announcement: AnnouncementConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Broadcast channel the announcements go to. Telegram never hands out 0.
    #[serde(default)]
    pub channel_id: i64,
    #[serde(default)]
    pub allowed_user_ids: Vec<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Branding and links used when composing an announcement.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AnnouncementConfig {
    pub project_name: String,
    pub project_tag: String,
    pub release_tag: String,
    pub site_url: String,
    /// Download page; the device codename is appended as `?codename=`.
    pub download_url: String,
    /// Support group fallback, followed by the codename. Empty disables it.
    pub support_group_prefix: String,
    pub banner_url: String,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            project_name: "RisingOS-Revived".to_string(),
            project_tag: "ROR".to_string(),
            release_tag: "fifteen".to_string(),
            site_url: "https://risingosrevived.tech/".to_string(),
            download_url: "https://risingosrevived.tech/downloads.html".to_string(),
            support_group_prefix: "https://t.me/RisingOS".to_string(),
            banner_url:
                "https://raw.githubusercontent.com/RisingOS-Revived-devices/portal/main/banner.png"
                    .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_health_bind")]
    pub bind: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_health_bind(),
        }
    }
}

fn default_catalog_url() -> String {
    "https://raw.githubusercontent.com/RisingOS-Revived-devices/portal/refs/heads/main/devices.json"
        .to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_health_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    /// Load the TOML file (if present), apply environment overrides and
    /// validate. A missing file is only an error when `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else if required {
            anyhow::bail!("Config file not found: {}", path.display());
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    /// Overlay values from `BOT_TOKEN`, `CHANNEL_ID`, `ALLOWED_USER_IDS`,
    /// `DEVICES_JSON_URL` and `PORT`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("BOT_TOKEN") {
            self.telegram.bot_token = token.trim().to_string();
        }
        if let Some(channel) = var("CHANNEL_ID") {
            self.telegram.channel_id = channel
                .trim()
                .parse()
                .with_context(|| format!("CHANNEL_ID is not an integer: {}", channel))?;
        }
        if let Some(ids) = var("ALLOWED_USER_IDS") {
            self.telegram.allowed_user_ids = parse_user_ids(&ids)?;
        }
        if let Some(url) = var("DEVICES_JSON_URL") {
            self.catalog.url = url.trim().to_string();
        }
        if let Some(port) = var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
            self.health.enabled = true;
            self.health.bind = format!("0.0.0.0:{}", port);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token is required (config file or BOT_TOKEN)");
        }
        if self.telegram.channel_id == 0 {
            anyhow::bail!("telegram.channel_id is required (config file or CHANNEL_ID)");
        }
        if self.telegram.allowed_user_ids.is_empty() {
            anyhow::bail!(
                "telegram.allowed_user_ids must list at least one user (config file or ALLOWED_USER_IDS)"
            );
        }
        if self.catalog.url.trim().is_empty() {
            anyhow::bail!("catalog.url must not be empty");
        }
        if self.catalog.timeout_secs == 0 {
            anyhow::bail!("catalog.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Parse a comma-separated list of Telegram user ids, skipping blanks.
pub fn parse_user_ids(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("Invalid user id in ALLOWED_USER_IDS: {}", s))
        })
        .collect()
}
