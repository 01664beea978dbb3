use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mockito::Matcher;
use newsbrief::aggregator::Aggregator;
use newsbrief::search::{GNewsClient, NewsSource, RawArticle};
use newsbrief::{SearchError, Timeframe};

const SPACEX_BODY: &str = r#"{
    "totalArticles": 2,
    "articles": [
        {
            "title": "SpaceX launches Starship",
            "description": "Description A",
            "content": "Full text A",
            "url": "https://a.example/starship",
            "image": null,
            "publishedAt": "2024-05-08T11:40:00Z",
            "source": { "name": "A News", "url": "https://a.example" }
        },
        {
            "title": "SpaceX launches Starship",
            "description": "Description B",
            "content": "Full text B",
            "url": "https://b.example/starship",
            "image": "https://b.example/img.png",
            "publishedAt": "2024-05-08T11:20:00Z",
            "source": { "name": "B News", "url": "https://b.example" }
        }
    ]
}"#;

fn topics(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap()
}

fn body_with_titles(titles: &[&str]) -> String {
    let articles: Vec<serde_json::Value> = titles
        .iter()
        .map(|t| {
            serde_json::json!({
                "title": t,
                "description": format!("About {}", t),
                "url": format!("https://news.example/{}", t.replace(' ', "-")),
                "publishedAt": "2024-05-08T11:00:00Z"
            })
        })
        .collect();
    serde_json::json!({ "totalArticles": articles.len(), "articles": articles }).to_string()
}

#[tokio::test]
async fn test_duplicate_titles_collapse_to_one_entry() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "spacex".into()),
            Matcher::UrlEncoded("lang".into(), "en".into()),
            Matcher::UrlEncoded("sortby".into(), "publishedAt".into()),
            Matcher::UrlEncoded("from".into(), "2024-05-08T11:00:00.000Z".into()),
            Matcher::UrlEncoded("apikey".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SPACEX_BODY)
        .expect(1)
        .create_async()
        .await;

    let source = GNewsClient::new(format!("{}/search", server.url()), "test-key");
    let aggregator = Aggregator::new(Arc::new(source));

    let articles = aggregator
        .search_at(&topics(&["spacex"]), Timeframe::LastHour, fixed_now())
        .await
        .expect("search should succeed");

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].title, "SpaceX launches Starship");
    assert_eq!(articles[0].topic, "spacex");
    assert_eq!(articles[0].id, "spacex-SpaceX launches Starship");
    assert!(articles[0].description == "Description A" || articles[0].description == "Description B");
    assert!(articles[0].ai_summary.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_one_request_per_topic_and_unique_titles() {
    let mut server = mockito::Server::new_async().await;

    let mut mocks = Vec::new();
    for (topic, titles) in [
        ("rust", vec!["Rust 1.80 released", "Shared headline"]),
        ("linux", vec!["Kernel 6.9 lands", "Shared headline"]),
        ("wasm", vec!["WASI preview 2"]),
    ] {
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), topic.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body_with_titles(&titles))
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let source = GNewsClient::new(format!("{}/search", server.url()), "k");
    let aggregator = Aggregator::new(Arc::new(source));

    let articles = aggregator
        .search(&topics(&["rust", "linux", "wasm"]), Timeframe::Last24Hours)
        .await
        .expect("search should succeed");

    let mut titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
    let total = titles.len();
    titles.sort();
    titles.dedup();
    assert_eq!(titles.len(), total, "no two entries share a title");
    assert_eq!(total, 4);

    // First topic in display order wins the shared headline
    let shared = articles
        .iter()
        .find(|a| a.title == "Shared headline")
        .expect("shared headline kept");
    assert_eq!(shared.topic, "rust");

    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_single_topic_failure_aborts_search() {
    let mut server = mockito::Server::new_async().await;

    let good = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("q".into(), "good".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body_with_titles(&["Fine article"]))
        .expect_at_most(1)
        .create_async()
        .await;

    let bad = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("q".into(), "bad".into()))
        .with_status(500)
        .with_body("upstream exploded")
        .expect(1)
        .create_async()
        .await;

    let source = GNewsClient::new(format!("{}/search", server.url()), "k");
    let aggregator = Aggregator::new(Arc::new(source));

    let err = aggregator
        .search(&topics(&["good", "bad"]), Timeframe::LastHour)
        .await
        .expect_err("search must fail");

    match &err {
        SearchError::UpstreamFetch { topic, cause } => {
            assert_eq!(topic, "bad");
            assert!(cause.contains("500"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string(), "Failed to fetch articles for \"bad\"");

    bad.assert_async().await;
    good.assert_async().await;
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"errors": ["quota"]}"#)
        .create_async()
        .await;

    let source = GNewsClient::new(format!("{}/search", server.url()), "k");
    let aggregator = Aggregator::new(Arc::new(source));

    let err = aggregator
        .search(&topics(&["ai"]), Timeframe::Last7Days)
        .await
        .expect_err("decode must fail");

    assert!(matches!(err, SearchError::UpstreamDecode { ref topic, .. } if topic == "ai"));
    mock.assert_async().await;
}

struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl NewsSource for CountingSource {
    async fn search(&self, _topic: &str, _from: DateTime<Utc>) -> Result<Vec<RawArticle>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_empty_topic_set_issues_no_requests() {
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
    });
    let aggregator = Aggregator::new(source.clone());

    for timeframe in Timeframe::ALL {
        let err = aggregator.search(&[], timeframe).await.expect_err("empty set rejected");
        assert_eq!(err, SearchError::EmptyTopicSet);
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    aggregator
        .search(&topics(&["a", "b"]), Timeframe::LastHour)
        .await
        .expect("search");
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}
