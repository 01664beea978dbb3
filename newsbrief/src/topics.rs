use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

/// Key under which the topic list is persisted in `kv_store`.
pub const TOPICS_KEY: &str = "news_topics";

/// Ordered, duplicate-free list of tracked topics, written through to SQLite after every change.
pub struct TopicStore {
    pool: SqlitePool,
    topics: Vec<String>,
}

impl TopicStore {
    /// Read the persisted list. A missing or malformed entry yields an empty store;
    /// blank and repeated entries are dropped.
    pub async fn load(pool: SqlitePool) -> Self {
        let topics = match read_topics(&pool).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => normalize(list),
                Err(e) => {
                    warn!(%e, "persisted topic list is malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(%e, "failed to read persisted topics, starting empty");
                Vec::new()
            }
        };
        debug!(count = topics.len(), "topics loaded");
        Self { pool, topics }
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    /// Trim and append. Returns false when the input is blank or already tracked.
    pub async fn add(&mut self, topic: &str) -> bool {
        let topic = topic.trim();
        if topic.is_empty() || self.contains(topic) {
            return false;
        }
        self.topics.push(topic.to_string());
        debug!(topic, "topic added");
        self.persist().await;
        true
    }

    /// Remove an exact match. Returns false when the topic was not tracked.
    pub async fn remove(&mut self, topic: &str) -> bool {
        let before = self.topics.len();
        self.topics.retain(|t| t != topic);
        if self.topics.len() == before {
            return false;
        }
        debug!(topic, "topic removed");
        self.persist().await;
        true
    }

    // Best-effort: a failed write is logged, never surfaced.
    async fn persist(&self) {
        if let Err(e) = write_topics(&self.pool, &self.topics).await {
            warn!(%e, "failed to persist topics");
        }
    }
}

fn normalize(stored: Vec<String>) -> Vec<String> {
    let stored_len = stored.len();
    let mut topics: Vec<String> = Vec::with_capacity(stored_len);
    for topic in stored {
        let topic = topic.trim();
        if !topic.is_empty() && !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
    if topics.len() != stored_len {
        warn!(
            stored = stored_len,
            kept = topics.len(),
            "persisted topic list had blank or duplicate entries"
        );
    }
    topics
}

async fn read_topics(pool: &SqlitePool) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
        .bind(TOPICS_KEY)
        .fetch_optional(pool)
        .await
        .context("failed to query kv_store")
}

async fn write_topics(pool: &SqlitePool, topics: &[String]) -> Result<()> {
    let value = serde_json::to_string(topics).context("failed to serialize topics")?;
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(TOPICS_KEY)
    .bind(value)
    .bind(Utc::now())
    .execute(pool)
    .await
    .context("failed to upsert topics")?;
    Ok(())
}
