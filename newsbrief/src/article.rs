use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publisher information as returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One news item found for a tracked topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Derived identity, see [`Article::derive_id`].
    pub id: String,
    /// Topic whose search produced this entry
    pub topic: String,
    /// Headline; also the dedup key
    pub title: String,
    /// Source description text, sent as `content` when summarizing
    pub description: String,
    pub url: String,
    pub image: Option<String>,
    pub source: Option<ArticleSource>,
    pub published_at: DateTime<Utc>,
    pub ai_summary: Option<String>,
    /// Set while a summarization request is in flight. Never persisted.
    #[serde(skip)]
    pub summarizing: bool,
}

impl Article {
    /// The same headline under two topics yields two identities.
    pub fn derive_id(topic: &str, title: &str) -> String {
        format!("{}-{}", topic, title)
    }

    /// Short relative age such as `42s ago`, `5m ago`, `3h ago` or `2d ago`.
    pub fn age_label(&self, now: DateTime<Utc>) -> String {
        let secs = (now - self.published_at).num_seconds().max(0);
        if secs < 60 {
            format!("{}s ago", secs)
        } else if secs < 3600 {
            format!("{}m ago", secs / 60)
        } else if secs < 86_400 {
            format!("{}h ago", secs / 3600)
        } else {
            format!("{}d ago", secs / 86_400)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article_published(at: DateTime<Utc>) -> Article {
        Article {
            id: Article::derive_id("rust", "Rust 2.0"),
            topic: "rust".to_string(),
            title: "Rust 2.0".to_string(),
            description: String::new(),
            url: "https://example.com/rust".to_string(),
            image: None,
            source: None,
            published_at: at,
            ai_summary: None,
            summarizing: false,
        }
    }

    #[test]
    fn derived_identity_combines_topic_and_title() {
        assert_eq!(Article::derive_id("spacex", "Starship flies"), "spacex-Starship flies");
        assert_ne!(
            Article::derive_id("spacex", "Starship flies"),
            Article::derive_id("nasa", "Starship flies")
        );
    }

    #[test]
    fn age_label_buckets() {
        let now = Utc::now();
        assert_eq!(article_published(now - Duration::seconds(42)).age_label(now), "42s ago");
        assert_eq!(article_published(now - Duration::minutes(5)).age_label(now), "5m ago");
        assert_eq!(article_published(now - Duration::hours(3)).age_label(now), "3h ago");
        assert_eq!(article_published(now - Duration::days(2)).age_label(now), "2d ago");
        // Clock skew on the provider side must not produce negative ages
        assert_eq!(article_published(now + Duration::seconds(30)).age_label(now), "0s ago");
    }

    #[test]
    fn summarizing_flag_is_not_serialized() {
        let mut article = article_published(Utc::now());
        article.summarizing = true;
        let json = serde_json::to_value(&article).expect("serialize");
        assert!(json.get("summarizing").is_none());
        let back: Article = serde_json::from_value(json).expect("deserialize");
        assert!(!back.summarizing);
    }
}
