//! Blog crawling: discovery, capping, then batched article extraction.

use std::time::Instant;

use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;
use url::Url;

use crate::CrawlOptions;
use crate::discovery::{Discovery, DiscoveryStrategy, discover_urls, normalize_blog_url};
use crate::extract::{ExtractedArticle, extract_article};
use crate::fetch::Fetcher;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlPhase {
    Discovering,
    Extracting,
}

/// Progress snapshot passed to the caller between batches.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct CrawlProgress {
    pub phase: CrawlPhase,
    pub current: usize,
    pub total: usize,
}

/// Progress callback. Runs inline between batches and must not block.
pub type ProgressCallback<'a> = &'a (dyn Fn(CrawlProgress) + Sync);

/// Outcome of a crawl.
///
/// `total_found` counts discovered URLs before the article cap, `posts` only
/// the successful extractions after it.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    pub posts: Vec<ExtractedArticle>,
    pub total_found: usize,
    pub errors: Vec<String>,
    pub strategy: DiscoveryStrategy,
}

impl CrawlResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

fn report(on_progress: Option<ProgressCallback<'_>>, phase: CrawlPhase, current: usize, total: usize) {
    if let Some(callback) = on_progress {
        callback(CrawlProgress {
            phase,
            current,
            total,
        });
    }
}

/// Crawls blogs with one shared HTTP client and a fixed set of options.
pub struct BlogCrawler {
    fetcher: Fetcher,
    options: CrawlOptions,
}

impl BlogCrawler {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(options: CrawlOptions) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(options.fetch_timeout)?,
            options,
        })
    }

    /// Finds candidate article URLs for `site`.
    pub async fn discover(&self, site: &Url) -> Discovery {
        discover_urls(&self.fetcher, site, &self.options).await
    }

    /// Fetches and extracts `urls` in batches of `options.concurrency`.
    ///
    /// A batch starts only after the previous one fully settled. Once
    /// `options.total_timeout` has elapsed since `started`, no further batch
    /// starts and the articles collected so far are returned. Failed URLs are
    /// left out without retry.
    pub async fn extract_articles(
        &self,
        urls: &[String],
        started: Instant,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Vec<ExtractedArticle> {
        let total = urls.len();
        let mut articles = Vec::new();
        let mut processed = 0;

        report(on_progress, CrawlPhase::Extracting, processed, total);

        for batch in urls.chunks(self.options.concurrency.max(1)) {
            if started.elapsed() > self.options.total_timeout {
                warn!(
                    "Crawl time budget of {:?} exhausted after {processed}/{total} URLs",
                    self.options.total_timeout
                );
                break;
            }

            let handles: Vec<_> = batch
                .iter()
                .map(|url| {
                    let fetcher = self.fetcher.clone();
                    let url = url.clone();
                    tokio::spawn(async move { fetch_and_extract(&fetcher, &url).await })
                })
                .collect();

            for (url, handle) in batch.iter().zip(handles) {
                match handle.await {
                    Ok(Ok(article)) => articles.push(article),
                    Ok(Err(e)) => debug!("Skipping {url}: {e}"),
                    Err(e) => debug!("Extraction task for {url} failed: {e}"),
                }
            }

            processed += batch.len();
            report(on_progress, CrawlPhase::Extracting, processed, total);
        }

        info!("Extracted {}/{total} articles", articles.len());
        articles
    }

    /// Discovers, caps and extracts the articles of `blog_url`.
    ///
    /// Never fails: problems surface as `errors` entries of the result.
    pub async fn crawl(
        &self,
        blog_url: &str,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> CrawlResult {
        let started = Instant::now();
        report(on_progress, CrawlPhase::Discovering, 0, 0);

        let site = match normalize_blog_url(blog_url) {
            Ok(site) => site,
            Err(e) => return CrawlResult::failed(e.to_string()),
        };

        info!("Starting crawl of {site}");
        let discovery = self.discover(&site).await;
        let total_found = discovery.urls.len();
        if let Some(source) = discovery
            .sitemap_url
            .as_deref()
            .or(discovery.feed_url.as_deref())
        {
            info!("Using {total_found} candidate URLs from {source}");
        }

        if total_found == 0 {
            return CrawlResult {
                errors: vec![format!(
                    "No articles found for {site}. Tried sitemap, RSS/Atom feed and homepage links"
                )],
                strategy: discovery.strategy,
                ..Default::default()
            };
        }

        let candidates: Vec<String> = discovery
            .urls
            .into_iter()
            .take(self.options.max_articles)
            .collect();
        if candidates.len() < total_found {
            info!(
                "Limiting crawl to the first {} of {total_found} URLs",
                candidates.len()
            );
        }

        let posts = self.extract_articles(&candidates, started, on_progress).await;
        let mut errors = Vec::new();
        if posts.is_empty() {
            errors.push(format!(
                "Failed to extract content from any of the {} article URLs",
                candidates.len()
            ));
        }

        CrawlResult {
            posts,
            total_found,
            errors,
            strategy: discovery.strategy,
        }
    }
}

async fn fetch_and_extract(fetcher: &Fetcher, url: &str) -> Result<ExtractedArticle> {
    let page = fetcher.get(url).await?;
    extract_article(url, &page.body)
}

/// Crawls a blog with `options`.
///
/// Never fails: an unusable HTTP client, an invalid URL, empty discovery or a
/// fully failed extraction all come back as `errors` entries.
pub async fn crawl_blog(
    blog_url: &str,
    on_progress: Option<ProgressCallback<'_>>,
    options: CrawlOptions,
) -> CrawlResult {
    match BlogCrawler::new(options) {
        Ok(crawler) => crawler.crawl(blog_url, on_progress).await,
        Err(e) => CrawlResult::failed(e.to_string()),
    }
}
