/*!
common/src/lib.rs

Shared configuration types and DB helper functions for Newsbrief.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default file with an override file
- Helpers to initialize an SQLite database and the key-value schema
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_SEARCH_URL: &str = "https://gnews.io/api/v4/search";
pub const DEFAULT_SUMMARIZE_ENDPOINT: &str = "http://localhost:3001/api/summarize";

/// Database configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the sqlite database file (e.g. "data/newsbrief.db")
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/newsbrief.db".to_string(),
        }
    }
}

/// News search provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API credential
    pub api_key_env: Option<String>,
    pub language: Option<String>,
    pub max_results: Option<u32>,
}

impl SearchConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_SEARCH_URL)
    }

    pub fn api_key_env(&self) -> &str {
        self.api_key_env.as_deref().unwrap_or("GNEWS_API_KEY")
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or("en")
    }
}

/// Where the orchestrator sends summarization requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub endpoint: Option<String>,
}

impl SummarizerConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_SUMMARIZE_ENDPOINT)
    }
}

/// Remote LLM config used by the summarization proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

/// HTTP server section for the summarization proxy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Some("127.0.0.1".to_string()),
            port: Some(3001),
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    pub llm: Option<LlmConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject URLs that cannot be parsed so failures surface at startup, not on first search.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(self.search.api_url())
            .with_context(|| format!("Invalid search.api_url: {}", self.search.api_url()))?;
        url::Url::parse(self.summarizer.endpoint())
            .with_context(|| format!("Invalid summarizer.endpoint: {}", self.summarizer.endpoint()))?;
        if let Some(api_url) = self.llm.as_ref().and_then(|l| l.api_url.as_deref()) {
            url::Url::parse(api_url).with_context(|| format!("Invalid llm.api_url: {}", api_url))?;
        }
        Ok(())
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

/// Initialize an SQLite connection pool.
///
/// This function will create the parent directory if necessary and return a configured
/// `SqlitePool`. The pool is small: only the topic list lives here.
///
/// Example:
///   let pool = init_db_pool("data/newsbrief.db").await?;
pub async fn init_db_pool(path: &str) -> Result<SqlitePool> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create DB parent directory: {}", parent.display())
            })?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to sqlite database at path: {}", path))?;

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Create the key-value table if it does not exist. Idempotent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );
        "#,
    )
    .execute(pool)
    .await
    .context("failed to ensure kv_store schema")?;
    Ok(())
}
