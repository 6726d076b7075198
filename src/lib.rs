//! The postcraft library discovers and extracts blog articles and imports
//! Bright Data Instagram exports, producing the material that Instagram
//! post generation is based on.

pub mod article_url;
pub mod constants;
pub mod crawler;
pub mod delimited;
pub mod discovery;
pub mod encoding;
pub mod extract;
pub mod feed;
pub mod fetch;
pub mod links;
pub mod mapping;
pub mod sitemap;
pub mod summarize;
pub mod upload;

use std::time::Duration;

use article_url::ArticleUrlPolicy;
use constants::{CONCURRENCY, FETCH_TIMEOUT, MAX_ARTICLES, TOTAL_TIMEOUT};

/// Knobs shared by crawling and discovery.
#[derive(Clone, PartialEq, Debug)]
pub struct CrawlOptions {
    /// Sitemap to use instead of probing the conventional locations.
    pub sitemap_url: Option<String>,
    /// Number of URLs fetched per batch.
    pub concurrency: usize,
    /// Per-request abort timeout.
    pub fetch_timeout: Duration,
    /// Wall-clock budget of a crawl, checked before each batch.
    pub total_timeout: Duration,
    /// Discovered URLs beyond this many are not fetched.
    pub max_articles: usize,
    pub article_policy: ArticleUrlPolicy,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            sitemap_url: None,
            concurrency: CONCURRENCY,
            fetch_timeout: FETCH_TIMEOUT,
            total_timeout: TOTAL_TIMEOUT,
            max_articles: MAX_ARTICLES,
            article_policy: ArticleUrlPolicy::default(),
        }
    }
}

pub use crawler::{BlogCrawler, CrawlPhase, CrawlProgress, CrawlResult, crawl_blog};
pub use discovery::{DiscoveryStrategy, SitemapDiscoveryResult, discover_sitemap};
pub use extract::{ExtractedArticle, extract_article};
pub use summarize::summarize_articles;
pub use upload::{CsvParseResult, UploadedFile, parse_bright_data_file};
