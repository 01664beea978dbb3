// News summary prompt
use anyhow::Result;
use tracing::info;

use super::{LlmProvider, LlmRequest};

const SYSTEM_PROMPT: &str = "You are a professional news analyst. Create detailed, informative \
summaries of news articles that capture the key points, context, and implications. Include \
relevant details while maintaining clarity.";

/// Build the user prompt for one article.
pub fn build_prompt(title: &str, content: &str) -> String {
    format!(
        "Please provide a comprehensive summary of this news article in 4-5 sentences. \
         Include the main event, key details, context, and any significant implications or \
         developments:\n\nTitle: {}\n\nContent: {}",
        title, content
    )
}

/// Ask the provider for a 4-5 sentence summary of an article.
pub async fn summarize_article<P: LlmProvider + ?Sized>(
    provider: &P,
    title: &str,
    content: &str,
) -> Result<String> {
    let response = provider
        .generate(LlmRequest {
            system: Some(SYSTEM_PROMPT.to_string()),
            prompt: build_prompt(title, content),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        })
        .await?;

    info!(
        model = %response.model,
        tokens = response.usage.total_tokens,
        "article summary generated"
    );
    Ok(response.content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_title_and_content() {
        let prompt = build_prompt("Starship flies", "It flew.");
        assert!(prompt.contains("4-5 sentences"));
        assert!(prompt.ends_with("Title: Starship flies\n\nContent: It flew."));
    }
}
