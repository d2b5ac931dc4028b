use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::geocode::{PlaceCache, DEFAULT_ENDPOINT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub family: FamilyConfig,
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FamilyConfig {
    pub name: String,
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Defaults to the family name in upper case
    pub table: Option<String>,
    #[serde(default = "default_name_column")]
    pub name_column: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    pub discord_webhook: Option<String>,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_columns() -> Vec<String> {
    ["Birth place", "Address", "Burial place", "Death place"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_cache_capacity() -> usize {
    PlaceCache::DEFAULT_CAPACITY
}

fn default_name_column() -> String {
    "FULL_NAME".to_string()
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.family.name.trim().is_empty() {
            bail!("family.name must not be empty");
        }
        if self.geocoder.api_key.trim().is_empty() {
            bail!("geocoder.api_key must not be empty");
        }
        if self.enrichment.cache_capacity == 0 {
            bail!("enrichment.cache_capacity must be at least 1");
        }
        Url::parse(&self.geocoder.endpoint)
            .with_context(|| format!("Invalid geocoder.endpoint: {}", self.geocoder.endpoint))?;
        Ok(())
    }

    /// Table the family is stored under
    pub fn table_name(&self) -> String {
        self.database
            .table
            .clone()
            .unwrap_or_else(|| self.family.name.to_uppercase())
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [family]
        name = "nushi"

        [geocoder]
        api_key = "key"

        [database]
        path = "family_trees.db"
    "#;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.table_name(), "NUSHI");
        assert_eq!(config.family.source_dir, PathBuf::from("."));
        assert_eq!(config.geocoder.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.enrichment.cache_capacity, 1000);
        assert_eq!(
            config.enrichment.columns,
            vec!["Birth place", "Address", "Burial place", "Death place"]
        );
        assert_eq!(config.database.name_column, "FULL_NAME");
        assert!(config.notifications.discord_webhook.is_none());
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_toml(
            r#"
            [family]
            name = "nushi"
            source_dir = "downloads"

            [geocoder]
            api_key = "key"
            timeout_secs = 5

            [enrichment]
            columns = ["Birth place"]
            cache_capacity = 10

            [database]
            path = "out.db"
            table = "FAMILY"

            [notifications]
            discord_webhook = "https://example.com/hook"
            "#,
        )
        .unwrap();

        assert_eq!(config.table_name(), "FAMILY");
        assert_eq!(config.geocoder_timeout(), Duration::from_secs(5));
        assert_eq!(config.enrichment.columns, vec!["Birth place"]);
        assert_eq!(config.enrichment.cache_capacity, 10);
    }

    #[test]
    fn test_rejects_zero_capacity_and_empty_key() {
        let zero = MINIMAL.replace("[database]", "[enrichment]\ncache_capacity = 0\n[database]");
        assert!(Config::from_toml(&zero).is_err());

        let no_key = MINIMAL.replace("api_key = \"key\"", "api_key = \"\"");
        assert!(Config::from_toml(&no_key).is_err());
    }
}
