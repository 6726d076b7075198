//! The summarize module hands extracted articles to an LLM and collects
//! one summary per article for the post-generation step.

use anyhow::Result;
use llm::chat::{ChatMessage, ChatMessageBuilder, ChatProvider};
use log::{debug, info};
use once_cell::sync::Lazy;
use rate_guard::{RateLimit, StdTokenBucket, TokenBucketBuilder};
use regex::Regex;
use serde::Serialize;
use std::time::Duration;

use crate::constants::{DEFAULT_PROMPT_TEMPLATE, THINK_STRIPPER};
use crate::extract::ExtractedArticle;

static THINK_BLOCK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(THINK_STRIPPER).expect("Failed to compile think block regex"));

/// Model, prompt and throttling shared by every article of a run.
pub struct SummarizeContext<'a> {
    /// Chat model, built once by the caller.
    pub model: &'a dyn ChatProvider,
    /// Falls back to [`DEFAULT_PROMPT_TEMPLATE`] when `None`.
    pub prompt_template: Option<&'a str>,
    pub rate_limiter: Option<&'a StdTokenBucket>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArticleSummary {
    pub url: String,
    pub title: String,
    pub summary: String,
}

/// Builds a token bucket allowing `rpm` requests per minute.
pub fn build_rate_limiter(rpm: u32) -> Option<StdTokenBucket> {
    let capacity = rpm.max(1) as u64;
    let refill_interval = Duration::from_secs_f64(60.0 / capacity as f64);

    TokenBucketBuilder::builder()
        .capacity(capacity)
        .refill_amount(1_u64)
        .refill_every(refill_interval)
        .with_time(rate_guard::StdTimeSource::new())
        .with_precision::<rate_guard::Nanos>()
        .build()
        .ok()
}

/// Summarizes each article in order.
///
/// # Errors
///
/// Returns an error on the first failing LLM request.
pub async fn summarize_articles(
    articles: &[ExtractedArticle],
    ctx: &SummarizeContext<'_>,
) -> Result<Vec<ArticleSummary>> {
    let mut summaries = Vec::with_capacity(articles.len());

    for article in articles {
        let summary = summarize_article(article, ctx).await?;
        debug!("Summarized article: {}", article.url);
        summaries.push(ArticleSummary {
            url: article.url.clone(),
            title: article.title.clone(),
            summary,
        });
    }

    info!("Summarized {} articles", summaries.len());
    Ok(summaries)
}

/// Summarises a single article by formatting its URL, title and text into the prompt.
///
/// When the template has no `{text}` placeholder the article text is sent as
/// a second message. `<think>` blocks are stripped from the answer.
///
/// # Errors
///
/// Returns an error if the LLM chat operation fails.
pub async fn summarize_article(
    article: &ExtractedArticle,
    ctx: &SummarizeContext<'_>,
) -> Result<String> {
    let template = ctx.prompt_template.unwrap_or(DEFAULT_PROMPT_TEMPLATE);
    let prompt = template
        .replace("{url}", &article.url)
        .replace("{title}", &article.title)
        .replace("{text}", &article.content);

    let mut builders: Vec<ChatMessageBuilder> = vec![ChatMessage::user().content(prompt)];
    if !template.contains("{text}") {
        builders.push(ChatMessage::user().content(article.content.clone()));
    }
    let messages: Vec<ChatMessage> = builders.into_iter().map(ChatMessageBuilder::build).collect();

    if let Some(limiter) = ctx.rate_limiter {
        while limiter.try_acquire(1).is_err() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    let answer = ctx
        .model
        .chat(&messages)
        .await
        .map_err(|e| anyhow::anyhow!("Summarizing {} failed: {e}", article.url))?
        .to_string();

    Ok(THINK_BLOCK_REGEX.replace_all(&answer, "").trim().to_string())
}
