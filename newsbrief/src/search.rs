use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::article::ArticleSource;
use crate::error::SearchError;

/// One entry of a provider response, before it is tagged with its topic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    articles: Vec<RawArticle>,
}

/// A news search backend queried once per topic.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Articles for `topic` published at or after `from`, newest first.
    async fn search(&self, topic: &str, from: DateTime<Utc>) -> Result<Vec<RawArticle>, SearchError>;
}

/// Client for a GNews-compatible `/search` endpoint.
pub struct GNewsClient {
    api_url: String,
    api_key: String,
    language: String,
    max_results: Option<u32>,
    client: Client,
}

impl GNewsClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            language: "en".to_string(),
            max_results: None,
            client: Client::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_results(mut self, max_results: Option<u32>) -> Self {
        self.max_results = max_results;
        self
    }

    fn request_url(&self, topic: &str, from: DateTime<Utc>) -> Result<url::Url, SearchError> {
        let from = from.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut params = vec![
            ("q", topic.to_string()),
            ("lang", self.language.clone()),
            ("sortby", "publishedAt".to_string()),
            ("from", from),
            ("apikey", self.api_key.clone()),
        ];
        if let Some(max) = self.max_results {
            params.push(("max", max.to_string()));
        }
        url::Url::parse_with_params(&self.api_url, &params).map_err(|e| SearchError::UpstreamFetch {
            topic: topic.to_string(),
            cause: format!("invalid search url: {}", e),
        })
    }
}

#[async_trait::async_trait]
impl NewsSource for GNewsClient {
    async fn search(&self, topic: &str, from: DateTime<Utc>) -> Result<Vec<RawArticle>, SearchError> {
        let url = self.request_url(topic, from)?;
        let fetch_error = |cause: String| SearchError::UpstreamFetch {
            topic: topic.to_string(),
            cause,
        };

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await.map_err(|e| fetch_error(e.to_string()))?;
        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::UpstreamDecode {
                topic: topic.to_string(),
                cause: e.to_string(),
            })?;

        debug!(topic, count = parsed.articles.len(), "search response decoded");
        Ok(parsed.articles)
    }
}
