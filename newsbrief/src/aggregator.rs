use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::article::Article;
use crate::error::SearchError;
use crate::search::{NewsSource, RawArticle};
use crate::timeframe::Timeframe;

/// Fans a search out over every tracked topic and merges the results.
pub struct Aggregator {
    source: Arc<dyn NewsSource>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn NewsSource>) -> Self {
        Self { source }
    }

    pub async fn search(&self, topics: &[String], timeframe: Timeframe) -> Result<Vec<Article>, SearchError> {
        self.search_at(topics, timeframe, Utc::now()).await
    }

    /// Same as [`Aggregator::search`] with an explicit clock.
    pub async fn search_at(
        &self,
        topics: &[String],
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<Vec<Article>, SearchError> {
        if topics.is_empty() {
            return Err(SearchError::EmptyTopicSet);
        }

        let cutoff = timeframe.cutoff(now);
        info!(topics = topics.len(), %timeframe, %cutoff, "searching articles");

        let mut tasks = JoinSet::new();
        for (index, topic) in topics.iter().enumerate() {
            let source = self.source.clone();
            let topic = topic.clone();
            tasks.spawn(async move {
                debug!(topic = %topic, "fetching topic");
                let result = source.search(&topic, cutoff).await;
                (index, topic, result)
            });
        }

        let mut per_topic: Vec<Option<(String, Vec<RawArticle>)>> = vec![None; topics.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, topic, result) = match joined {
                Ok(done) => done,
                Err(join_err) => {
                    // A panicking fetch task is reported like a transport failure.
                    tasks.abort_all();
                    let failed = failed_topic(topics, &per_topic);
                    return Err(SearchError::UpstreamFetch {
                        topic: failed,
                        cause: join_err.to_string(),
                    });
                }
            };
            match result {
                Ok(raw) => {
                    debug!(topic = %topic, count = raw.len(), "topic fetched");
                    per_topic[index] = Some((topic, raw));
                }
                Err(e) => {
                    warn!(topic = %topic, error = %e, "topic fetch failed, aborting search");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        let articles = merge(per_topic.into_iter().flatten());
        info!(count = articles.len(), "search complete");
        Ok(articles)
    }
}

/// Flattens per-topic results in topic order and drops repeated titles.
///
/// The first occurrence of a title wins, so the outcome only depends on the
/// topic order and the provider's ordering, never on response arrival.
pub fn merge<I>(per_topic: I) -> Vec<Article>
where
    I: IntoIterator<Item = (String, Vec<RawArticle>)>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for (topic, raw_articles) in per_topic {
        for raw in raw_articles {
            if !seen.insert(raw.title.clone()) {
                continue;
            }
            merged.push(Article {
                id: Article::derive_id(&topic, &raw.title),
                topic: topic.clone(),
                title: raw.title,
                description: raw.description.unwrap_or_default(),
                url: raw.url,
                image: raw.image,
                source: raw.source,
                published_at: raw.published_at,
                ai_summary: None,
                summarizing: false,
            });
        }
    }
    merged
}

fn failed_topic(topics: &[String], done: &[Option<(String, Vec<RawArticle>)>]) -> String {
    topics
        .iter()
        .zip(done)
        .find(|(_, slot)| slot.is_none())
        .map(|(topic, _)| topic.clone())
        .unwrap_or_default()
}
