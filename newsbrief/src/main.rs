/*
newsbrief - single-binary main.rs
Manages tracked topics, runs topic searches with optional AI summaries, and serves the
summarization proxy used by those summaries.
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use common::{init_db_pool, Config};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::aggregator::Aggregator;
use newsbrief::llm::remote::RemoteLlmProvider;
use newsbrief::llm::LlmProvider;
use newsbrief::search::GNewsClient;
use newsbrief::server::{launch_rocket, AppState};
use newsbrief::summarize::{HttpSummaryClient, Orchestrator};
use newsbrief::topics::TopicStore;
use newsbrief::{NewsDesk, SearchError, Timeframe};

#[derive(Parser, Debug)]
#[command(name = "newsbrief", about = "Track news topics and summarize articles on demand")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage tracked topics
    Topics {
        #[command(subcommand)]
        action: TopicAction,
    },
    /// Search articles for every tracked topic
    Search {
        /// Recency window: 1h, 12h, 1d or 7d
        #[arg(long, short, default_value = "1h")]
        timeframe: Timeframe,

        /// Request AI summaries for the first N articles
        #[arg(long, value_name = "N", default_value_t = 0)]
        summarize: usize,
    },
    /// Run the summarization proxy
    Serve,
}

#[derive(Subcommand, Debug)]
enum TopicAction {
    List,
    Add { topic: String },
    Remove { topic: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // API keys usually live in a .env next to the binary
    if let Err(e) = dotenv::dotenv() {
        tracing::debug!(%e, "no .env file loaded");
    }

    let config = load_config(args.config).await?;

    match args.command {
        Command::Topics { action } => run_topics(&config, action).await,
        Command::Search { timeframe, summarize } => run_search(&config, timeframe, summarize).await,
        Command::Serve => run_server(&config).await,
    }
}

async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

async fn open_topics(config: &Config) -> Result<TopicStore> {
    let pool = init_db_pool(&config.database.path).await?;
    Ok(TopicStore::load(pool).await)
}

async fn run_topics(config: &Config, action: TopicAction) -> Result<()> {
    let mut store = open_topics(config).await?;
    match action {
        TopicAction::List => {}
        TopicAction::Add { topic } => {
            if !store.add(&topic).await {
                println!("Topic \"{}\" is blank or already tracked", topic.trim());
            }
        }
        TopicAction::Remove { topic } => {
            if !store.remove(&topic).await {
                println!("Topic \"{}\" is not tracked", topic);
            }
        }
    }

    if store.is_empty() {
        println!("No topics tracked. Add one with `newsbrief topics add <topic>`.");
    }
    for topic in store.topics() {
        println!("- {}", topic);
    }
    Ok(())
}

async fn run_search(config: &Config, timeframe: Timeframe, summarize: usize) -> Result<()> {
    let topics = open_topics(config).await?;
    if topics.is_empty() {
        eprintln!("Error: {}", SearchError::EmptyTopicSet);
        return Ok(());
    }

    let key_env = config.search.api_key_env();
    let api_key = std::env::var(key_env)
        .with_context(|| format!("Search API key env var '{}' not set", key_env))?;

    let source = GNewsClient::new(config.search.api_url(), api_key)
        .with_language(config.search.language())
        .with_max_results(config.search.max_results);
    let aggregator = Aggregator::new(Arc::new(source));
    let orchestrator = Orchestrator::new(Arc::new(HttpSummaryClient::new(config.summarizer.endpoint())));

    let mut desk = NewsDesk::new(topics, aggregator, orchestrator);
    desk.set_timeframe(timeframe);

    println!("Searching {} ({})...", desk.topics().join(", "), timeframe.label());
    if desk.search().await.is_err() {
        if let Some(msg) = desk.error() {
            eprintln!("Error: {}", msg);
        }
        return Ok(());
    }

    let ids: Vec<String> = desk.articles().iter().take(summarize).map(|a| a.id.clone()).collect();
    for id in &ids {
        desk.summarize(id);
    }
    if !ids.is_empty() {
        println!("Generating {} summaries...", ids.len());
        desk.settle_summaries().await;
    }

    let now = Utc::now();
    for article in desk.articles() {
        println!();
        println!("{}  [{}]  {}", article.title, article.topic, article.age_label(now));
        if let Some(summary) = &article.ai_summary {
            println!("  {}", summary);
        }
        println!("  Read full article -> {}", article.url);
    }
    println!();
    println!("{} articles", desk.articles().len());

    if let Some(msg) = desk.error() {
        eprintln!("Error: {}", msg);
    }
    Ok(())
}

async fn run_server(config: &Config) -> Result<()> {
    let llm_provider = match create_llm_provider(config) {
        Ok(provider) => Some(provider),
        Err(e) => {
            warn!("LLM provider unavailable, /api/summarize will fail: {:#}", e);
            None
        }
    };
    launch_rocket(AppState::new(llm_provider), config).await
}

/// Create the LLM provider for the summarization proxy from configuration
fn create_llm_provider(config: &Config) -> Result<Arc<dyn LlmProvider>> {
    let llm_config = config
        .llm
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Missing [llm] section in configuration"))?;

    let api_key_env = llm_config.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
    let api_key = std::env::var(api_key_env)
        .with_context(|| format!("LLM API key env var '{}' not set", api_key_env))?;

    let model = llm_config.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
    let api_url = llm_config
        .api_url
        .clone()
        .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());

    let provider = RemoteLlmProvider::new(api_url.clone(), api_key, model.clone()).with_defaults(
        llm_config.timeout_seconds.unwrap_or(30),
        llm_config.max_tokens.unwrap_or(250),
        llm_config.temperature.unwrap_or(0.7),
    );
    info!("LLM provider initialized: remote ({}) at {}", model, api_url);
    Ok(Arc::new(provider))
}
