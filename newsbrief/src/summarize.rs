use std::collections::HashSet;
use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::article::Article;
use crate::error::SummarizeError;

/// Body of `POST /api/summarize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct SummarizeReply {
    summary: Option<String>,
    error: Option<String>,
}

/// Anything that can turn a title and description into a short summary.
#[async_trait::async_trait]
pub trait SummaryClient: Send + Sync {
    async fn summarize(&self, request: SummarizeRequest) -> Result<String, SummarizeError>;
}

/// Calls the summarization endpoint over HTTP.
pub struct HttpSummaryClient {
    endpoint: String,
    client: Client,
}

impl HttpSummaryClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl SummaryClient for HttpSummaryClient {
    async fn summarize(&self, request: SummarizeRequest) -> Result<String, SummarizeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SummarizeError::Request(e.to_string()))?;

        interpret_reply(status, &body)
    }
}

/// Maps a raw endpoint reply onto a summary or a typed failure.
pub fn interpret_reply(status: reqwest::StatusCode, body: &str) -> Result<String, SummarizeError> {
    let reply: SummarizeReply = match serde_json::from_str(body) {
        Ok(reply) => reply,
        Err(e) if status.is_success() => return Err(SummarizeError::Decode(e.to_string())),
        Err(_) => return Err(SummarizeError::Request(format!("HTTP {}", status))),
    };

    if let Some(error) = reply.error {
        return Err(SummarizeError::Payload(error));
    }
    if !status.is_success() {
        return Err(SummarizeError::Request(format!("HTTP {}", status)));
    }
    reply
        .summary
        .ok_or_else(|| SummarizeError::Payload("response did not contain a summary".to_string()))
}

/// Result of one finished request, delivered back to the owner of the article collection.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub article_id: String,
    pub result: Result<String, SummarizeError>,
}

/// Drives per-article summarization: at most one request in flight per article, results cached.
///
/// Requests run on spawned tasks; their outcomes queue up on a channel and only
/// touch articles when the owner calls [`Orchestrator::poll`] or [`Orchestrator::settle`].
pub struct Orchestrator {
    client: Arc<dyn SummaryClient>,
    pending: HashSet<String>,
    tx: UnboundedSender<SummaryOutcome>,
    rx: UnboundedReceiver<SummaryOutcome>,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn SummaryClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            pending: HashSet::new(),
            tx,
            rx,
        }
    }

    pub fn is_pending(&self, article_id: &str) -> bool {
        self.pending.contains(article_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Dispatch a request for `article_id`. Returns false (and does nothing) when the
    /// article is unknown, already summarized or already pending.
    pub fn summarize(&mut self, articles: &mut [Article], article_id: &str) -> bool {
        let Some(article) = articles.iter_mut().find(|a| a.id == article_id) else {
            return false;
        };
        if article.ai_summary.is_some() || self.pending.contains(article_id) {
            return false;
        }

        article.summarizing = true;
        self.pending.insert(article_id.to_string());

        let request = SummarizeRequest {
            title: article.title.clone(),
            content: article.description.clone(),
        };
        let client = self.client.clone();
        let tx = self.tx.clone();
        let id = article_id.to_string();
        info!(article_id = %id, "summarization requested");

        tokio::spawn(async move {
            // A panicking client still has to release the article.
            let result = match tokio::spawn(async move { client.summarize(request).await }).await {
                Ok(result) => result,
                Err(e) => Err(SummarizeError::Request(format!("summarization task failed: {}", e))),
            };
            // The receiver lives as long as the orchestrator; a send error means it is gone.
            let _ = tx.send(SummaryOutcome { article_id: id, result });
        });
        true
    }

    /// Apply every outcome that has already arrived, without waiting.
    pub fn poll(&mut self, articles: &mut [Article]) -> Vec<SummaryOutcome> {
        let mut applied = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            self.apply(articles, &outcome);
            applied.push(outcome);
        }
        applied
    }

    /// Wait for the next outcome and apply it. Returns `None` when nothing is pending.
    pub async fn next(&mut self, articles: &mut [Article]) -> Option<SummaryOutcome> {
        if self.pending.is_empty() {
            return None;
        }
        let outcome = self.rx.recv().await?;
        self.apply(articles, &outcome);
        Some(outcome)
    }

    /// Wait until no request is pending, returning outcomes in arrival order.
    pub async fn settle(&mut self, articles: &mut [Article]) -> Vec<SummaryOutcome> {
        let mut applied = self.poll(articles);
        while let Some(outcome) = self.next(articles).await {
            applied.push(outcome);
        }
        applied
    }

    fn apply(&mut self, articles: &mut [Article], outcome: &SummaryOutcome) {
        self.pending.remove(&outcome.article_id);
        let article = articles.iter_mut().find(|a| a.id == outcome.article_id);

        match (&outcome.result, article) {
            (Ok(summary), Some(article)) => {
                article.summarizing = false;
                if article.ai_summary.is_none() {
                    article.ai_summary = Some(summary.clone());
                }
                info!(article_id = %outcome.article_id, "summary stored");
            }
            (Err(e), Some(article)) => {
                article.summarizing = false;
                warn!(article_id = %outcome.article_id, error = %e, "summarization failed");
            }
            (_, None) => {
                info!(article_id = %outcome.article_id, "summary arrived for an article no longer listed");
            }
        }
    }
}
