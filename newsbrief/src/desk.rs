use tracing::{info, warn};

use crate::aggregator::Aggregator;
use crate::article::Article;
use crate::error::SearchError;
use crate::summarize::{Orchestrator, SummaryOutcome};
use crate::timeframe::Timeframe;
use crate::topics::TopicStore;

/// Owns every piece of mutable state: topics, timeframe, the current article
/// collection, per-article summarization and the shared error slot.
///
/// All mutation goes through `&mut self`, so a presentation layer can only read
/// state and hand intents back.
pub struct NewsDesk {
    topics: TopicStore,
    timeframe: Timeframe,
    articles: Vec<Article>,
    error: Option<String>,
    aggregator: Aggregator,
    orchestrator: Orchestrator,
}

impl NewsDesk {
    pub fn new(topics: TopicStore, aggregator: Aggregator, orchestrator: Orchestrator) -> Self {
        Self {
            topics,
            timeframe: Timeframe::default(),
            articles: Vec::new(),
            error: None,
            aggregator,
            orchestrator,
        }
    }

    pub fn topics(&self) -> &[String] {
        self.topics.topics()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn article(&self, id: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == id)
    }

    /// Last error recorded by a search or a summarization; newer errors replace older ones.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub async fn add_topic(&mut self, topic: &str) -> bool {
        self.topics.add(topic).await
    }

    pub async fn remove_topic(&mut self, topic: &str) -> bool {
        self.topics.remove(topic).await
    }

    /// Takes effect on the next search; the current collection is not re-filtered.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        self.timeframe = timeframe;
    }

    /// Replace the article collection with a fresh aggregation over all topics.
    /// On failure the collection is left empty and the error slot is set.
    pub async fn search(&mut self) -> Result<usize, SearchError> {
        self.error = None;
        self.articles.clear();

        match self.aggregator.search(self.topics.topics(), self.timeframe).await {
            Ok(mut articles) => {
                for article in &mut articles {
                    article.summarizing = self.orchestrator.is_pending(&article.id);
                }
                self.articles = articles;
                Ok(self.articles.len())
            }
            Err(e) => {
                warn!(error = %e, "search failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Request a summary for one article. No-op (returns false) if it is unknown,
    /// already summarized or already being summarized.
    pub fn summarize(&mut self, article_id: &str) -> bool {
        self.orchestrator.summarize(&mut self.articles, article_id)
    }

    pub fn is_summarizing(&self, article_id: &str) -> bool {
        self.orchestrator.is_pending(article_id)
    }

    /// Apply summaries that have already arrived.
    pub fn poll_summaries(&mut self) -> usize {
        let outcomes = self.orchestrator.poll(&mut self.articles);
        self.record(&outcomes);
        outcomes.len()
    }

    /// Wait for every pending summarization to finish.
    pub async fn settle_summaries(&mut self) -> usize {
        let outcomes = self.orchestrator.settle(&mut self.articles).await;
        self.record(&outcomes);
        outcomes.len()
    }

    fn record(&mut self, outcomes: &[SummaryOutcome]) {
        for outcome in outcomes {
            if let Err(e) = &outcome.result {
                self.error = Some(format!("Failed to generate AI summary: {}", e));
            }
        }
        if !outcomes.is_empty() {
            info!(applied = outcomes.len(), pending = self.orchestrator.pending_count(), "summaries applied");
        }
    }
}
