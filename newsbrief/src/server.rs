use std::sync::Arc;

use anyhow::{anyhow, Result};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, post, routes, Build, Request, Rocket, State};
use serde::Deserialize;
use serde_json::{json, Value};

use common::Config;

use crate::llm::summarizer::summarize_article;
use crate::llm::LlmProvider;

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub llm_provider: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    pub fn new(llm_provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { llm_provider }
    }
}

/// Request body for `/api/summarize`. Both fields are optional at the JSON level so
/// a missing one gets the documented 400 instead of a parse failure.
#[derive(Debug, Deserialize)]
struct SummarizeBody {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Summarize one article through the configured LLM provider.
#[post("/api/summarize", data = "<body>")]
async fn summarize(state: &State<AppState>, body: Json<SummarizeBody>) -> (Status, Json<Value>) {
    let body = body.into_inner();
    let (title, content) = match (body.title, body.content) {
        (Some(t), Some(c)) if !t.is_empty() && !c.is_empty() => (t, c),
        _ => {
            tracing::info!("summarize: missing title or content");
            return (
                Status::BadRequest,
                Json(json!({ "error": "Missing title or content" })),
            );
        }
    };

    let Some(provider) = state.llm_provider.as_ref() else {
        tracing::error!("summarize: no LLM provider configured");
        return (
            Status::InternalServerError,
            Json(json!({ "error": "Summarization provider is not configured" })),
        );
    };

    tracing::info!(title = %title, "summarize: calling LLM provider");
    match summarize_article(provider.as_ref(), &title, &content).await {
        Ok(summary) => (Status::Ok, Json(json!({ "summary": summary }))),
        Err(e) => {
            tracing::error!("summarize: provider failed: {:#}", e);
            (
                Status::InternalServerError,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

#[catch(400)]
fn bad_request(_req: &Request) -> Json<Value> {
    Json(json!({ "error": "Malformed request body" }))
}

#[catch(422)]
fn unprocessable(_req: &Request) -> Json<Value> {
    Json(json!({ "error": "Malformed request body" }))
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    Json(json!({ "error": format!("No route for {}", req.uri()) }))
}

#[catch(500)]
fn internal_error(_req: &Request) -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}

/// Build the Rocket instance with routes and catchers, without launching it.
pub fn build_rocket(state: AppState, config: Option<&Config>) -> Rocket<Build> {
    let mut fig = rocket::Config::figment();
    if let Some(server) = config.map(|c| &c.server) {
        if let Some(bind) = &server.bind {
            fig = fig.merge(("address", bind.clone()));
        }
        if let Some(port) = server.port {
            fig = fig.merge(("port", port));
        }
    }

    rocket::custom(fig)
        .manage(state)
        .mount("/", routes![health, summarize])
        .register("/", catchers![bad_request, unprocessable, not_found, internal_error])
}

/// Build and launch the summarization proxy.
///
/// This function blocks until the Rocket server shuts down (it awaits `rocket.launch().await`)
/// and returns an error if Rocket fails to start.
pub async fn launch_rocket(state: AppState, config: &Config) -> Result<()> {
    tracing::info!(
        bind = ?config.server.bind,
        port = ?config.server.port,
        llm_configured = state.llm_provider.is_some(),
        "Starting Rocket HTTP server"
    );
    build_rocket(state, Some(config))
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
