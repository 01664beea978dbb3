use std::sync::Arc;

use chrono::Utc;
use mockito::Matcher;
use newsbrief::summarize::{HttpSummaryClient, Orchestrator, SummarizeRequest, SummaryClient};
use newsbrief::{Article, SummarizeError};
use serde_json::json;

fn article(topic: &str, title: &str, description: &str) -> Article {
    Article {
        id: Article::derive_id(topic, title),
        topic: topic.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        url: "https://news.example/story".to_string(),
        image: None,
        source: None,
        published_at: Utc::now(),
        ai_summary: None,
        summarizing: false,
    }
}

fn orchestrator_for(server: &mockito::ServerGuard) -> Orchestrator {
    let client = HttpSummaryClient::new(format!("{}/api/summarize", server.url()));
    Orchestrator::new(Arc::new(client))
}

#[tokio::test]
async fn test_rapid_repeat_sends_one_request() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/summarize")
        .match_body(Matcher::Json(json!({
            "title": "Starship reaches orbit",
            "content": "SpaceX's vehicle completed a full orbit."
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"summary":"Starship made it to orbit."}"#)
        .expect(1)
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(&server);
    let mut articles = vec![article(
        "spacex",
        "Starship reaches orbit",
        "SpaceX's vehicle completed a full orbit.",
    )];
    let id = articles[0].id.clone();

    assert!(orchestrator.summarize(&mut articles, &id));
    assert!(!orchestrator.summarize(&mut articles, &id), "second call while pending is a no-op");
    assert!(articles[0].summarizing);
    assert!(orchestrator.is_pending(&id));

    let outcomes = orchestrator.settle(&mut articles).await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(articles[0].ai_summary.as_deref(), Some("Starship made it to orbit."));
    assert!(!articles[0].summarizing);
    assert!(!orchestrator.is_pending(&id));

    // Done is terminal: no new request, summary untouched
    assert!(!orchestrator.summarize(&mut articles, &id));
    assert_eq!(articles[0].ai_summary.as_deref(), Some("Starship made it to orbit."));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_failure_leaves_article_retryable() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/summarize")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"The model is overloaded"}"#)
        .expect(2)
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(&server);
    let mut articles = vec![article("ai", "New model announced", "Details inside.")];
    let id = articles[0].id.clone();

    assert!(orchestrator.summarize(&mut articles, &id));
    let outcomes = orchestrator.settle(&mut articles).await;
    assert_eq!(
        outcomes[0].result,
        Err(SummarizeError::Payload("The model is overloaded".to_string()))
    );
    assert!(articles[0].ai_summary.is_none());
    assert!(!articles[0].summarizing);

    // Retry dispatches a fresh request
    assert!(orchestrator.summarize(&mut articles, &id));
    orchestrator.settle(&mut articles).await;
    assert!(articles[0].ai_summary.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_json_is_decode_failure() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/summarize")
        .with_status(200)
        .with_body("<html>proxy page</html>")
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(&server);
    let mut articles = vec![article("ai", "Headline", "Body")];
    let id = articles[0].id.clone();

    orchestrator.summarize(&mut articles, &id);
    let outcomes = orchestrator.settle(&mut articles).await;
    assert!(matches!(outcomes[0].result, Err(SummarizeError::Decode(_))));
    assert!(articles[0].ai_summary.is_none());
}

#[tokio::test]
async fn test_concurrent_articles_get_independent_requests() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/summarize")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"summary":"Summary."}"#)
        .expect(3)
        .create_async()
        .await;

    let mut orchestrator = orchestrator_for(&server);
    let mut articles = vec![
        article("a", "First", "one"),
        article("b", "Second", "two"),
        article("c", "Third", "three"),
    ];
    let ids: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();

    for id in &ids {
        assert!(orchestrator.summarize(&mut articles, id));
    }
    assert_eq!(orchestrator.pending_count(), 3);

    orchestrator.settle(&mut articles).await;
    assert!(articles.iter().all(|a| a.ai_summary.as_deref() == Some("Summary.")));
    assert_eq!(orchestrator.pending_count(), 0);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_unknown_article_is_ignored() {
    let server = mockito::Server::new_async().await;
    let mut orchestrator = orchestrator_for(&server);
    let mut articles = vec![article("a", "Only", "one")];

    assert!(!orchestrator.summarize(&mut articles, "missing-id"));
    assert_eq!(orchestrator.pending_count(), 0);
    assert!(orchestrator.settle(&mut articles).await.is_empty());
}

struct PanickingClient;

#[async_trait::async_trait]
impl SummaryClient for PanickingClient {
    async fn summarize(&self, _request: SummarizeRequest) -> Result<String, SummarizeError> {
        panic!("client blew up");
    }
}

#[tokio::test]
async fn test_panicking_client_releases_article() {
    let mut orchestrator = Orchestrator::new(Arc::new(PanickingClient));
    let mut articles = vec![article("a", "Fragile", "body")];
    let id = articles[0].id.clone();

    assert!(orchestrator.summarize(&mut articles, &id));
    let outcomes = orchestrator.settle(&mut articles).await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0].result, Err(SummarizeError::Request(msg)) if msg.contains("panicked")));
    assert!(!articles[0].summarizing);
    assert!(articles[0].ai_summary.is_none());
    assert_eq!(orchestrator.pending_count(), 0);
}
