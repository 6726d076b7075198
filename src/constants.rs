use std::time::Duration;

pub const MODEL_API_KEY_ENV_NAME: &str = "POSTCRAFT_MODEL_API_KEY";

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; PostCraft/1.0)";

/// Candidate URLs beyond this many are never fetched.
pub const MAX_ARTICLES: usize = 100;
/// Width of each extraction batch.
pub const CONCURRENCY: usize = 5;
pub const FETCH_TIMEOUT: Duration = Duration::from_millis(15_000);
/// Wall-clock budget for a whole crawl, checked between batches.
pub const TOTAL_TIMEOUT: Duration = Duration::from_millis(300_000);

pub const MAX_POSTS: usize = 200;
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Sitemap index nesting below the root that is still expanded.
pub const SITEMAP_MAX_DEPTH: usize = 2;

pub const SITEMAP_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-posts.xml",
    "/post-sitemap.xml",
    "/wp-sitemap.xml",
];

pub const FEED_PATHS: &[&str] = &[
    "/feed",
    "/rss",
    "/feed.xml",
    "/rss.xml",
    "/atom.xml",
    "/index.xml",
    "/feed/atom",
];

pub(crate) const THINK_STRIPPER: &str = r"<think>[\s\S]*</think>\s*";

pub(crate) const DEFAULT_PROMPT_TEMPLATE: &str = r#"
You will see a blog article titled "{title}" from {url}.
Summarize it in a few sentences for a small business planning Instagram posts.
Point out the topics, tone and any products or events it mentions.
Your answer should contain only the summary.
Article content:"#;
