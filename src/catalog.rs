use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::CatalogError;

/// One build entry from the devices list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeviceRecord {
    pub codename: String,
    pub device: String,
    pub oem: String,
    pub maintainer: String,
    pub version: String,
    #[serde(rename = "buildtype")]
    pub build_type: String,
    /// Build date as unix epoch seconds.
    #[serde(deserialize_with = "epoch_seconds")]
    pub timestamp: i64,
    #[serde(default, rename = "telegram", deserialize_with = "non_empty")]
    pub telegram_url: Option<String>,
    #[serde(default, rename = "device_changelog", deserialize_with = "non_empty")]
    pub changelog_url: Option<String>,
    #[serde(default, rename = "paypal", deserialize_with = "non_empty")]
    pub support_url: Option<String>,
}

/// Blank optional links count as missing.
fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Some catalogs quote the timestamp; accept both forms.
fn epoch_seconds<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid timestamp '{}'", s))),
    }
}

/// Where the raw devices list comes from.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait CatalogSource: Send + Sync {
    /// Fetch the full catalog body. Called once per `/post`.
    async fn fetch(&self) -> Result<Vec<u8>, CatalogError>;
}

/// Catalog served over HTTP, typically a raw JSON file in a git repository.
pub struct HttpCatalog {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build catalog HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<u8>, CatalogError> {
        debug!("Fetching devices list from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(CatalogError::Fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(CatalogError::Fetch)?;
        debug!("Fetched devices list ({} bytes)", body.len());
        Ok(body.to_vec())
    }
}

/// Looks a codename up in a freshly fetched catalog.
pub struct CatalogResolver {
    source: Arc<dyn CatalogSource>,
}

impl CatalogResolver {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    pub async fn resolve(&self, codename: &str) -> Result<DeviceRecord, CatalogError> {
        let body = self.source.fetch().await?;
        find_device(&body, codename)
    }
}

/// Case-insensitive linear scan; the first matching entry wins.
///
/// Entries are only decoded once they match, so a broken entry elsewhere in
/// the list does not block lookups of healthy ones.
pub fn find_device(body: &[u8], codename: &str) -> Result<DeviceRecord, CatalogError> {
    let entries: Vec<Value> = serde_json::from_slice(body).map_err(CatalogError::Parse)?;
    let wanted = codename.to_lowercase();

    let entry = entries
        .into_iter()
        .find(|entry| {
            entry
                .get("codename")
                .and_then(Value::as_str)
                .is_some_and(|c| c.to_lowercase() == wanted)
        })
        .ok_or_else(|| CatalogError::NotFound(wanted.clone()))?;

    serde_json::from_value(entry).map_err(|source| CatalogError::InvalidRecord {
        codename: wanted,
        source,
    })
}
