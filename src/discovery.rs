//! Candidate article discovery: sitemap, then RSS/Atom, then homepage links.

use anyhow::{Context, Result, bail};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::CrawlOptions;
use crate::feed::{find_feed_by_autodiscovery, find_feed_by_paths};
use crate::fetch::{FetchedPage, Fetcher};
use crate::links::extract_article_links;
use crate::sitemap::{SitemapHit, extract_sitemap_urls, find_sitemap};

/// Which discovery strategy produced the candidate URLs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStrategy {
    Sitemap,
    Rss,
    Links,
    #[default]
    None,
}

/// Candidate article URLs from the first strategy that found any.
#[derive(Clone, Debug, Default)]
pub struct Discovery {
    pub strategy: DiscoveryStrategy,
    pub urls: Vec<String>,
    pub sitemap_url: Option<String>,
    pub feed_url: Option<String>,
}

/// Pre-flight answer to "how many articles would a crawl find?".
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapDiscoveryResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_count: Option<usize>,
    pub strategy: DiscoveryStrategy,
}

/// Turns user input into a blog URL, assuming https when no scheme is given.
///
/// # Errors
///
/// Returns an error if the input is not a URL with a host.
pub fn normalize_blog_url(input: &str) -> Result<Url> {
    let input = input.trim();
    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{input}"))
    }
    .context(format!("Invalid blog URL: {input}"))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        bail!("Invalid blog URL: {input}");
    }
    Ok(url)
}

/// Runs the strategies in order and stops at the first that yields a URL.
///
/// Strategies never merge. A manual `options.sitemap_url` replaces the
/// conventional sitemap paths; the homepage is fetched at most once and
/// shared between feed autodiscovery and the link crawl.
pub async fn discover_urls(fetcher: &Fetcher, site: &Url, options: &CrawlOptions) -> Discovery {
    let policy = &options.article_policy;

    let sitemap_hit = match &options.sitemap_url {
        Some(manual) => extract_sitemap_urls(fetcher, manual, site, policy)
            .await
            .map_err(|e| warn!("Manual sitemap {manual} unusable: {e}"))
            .ok()
            .filter(|urls| !urls.is_empty())
            .map(|urls| SitemapHit {
                sitemap_url: manual.clone(),
                urls,
            }),
        None => find_sitemap(fetcher, site, policy).await,
    };
    if let Some(hit) = sitemap_hit {
        info!("Discovered {} candidate URLs via sitemap", hit.urls.len());
        return Discovery {
            strategy: DiscoveryStrategy::Sitemap,
            urls: hit.urls,
            sitemap_url: Some(hit.sitemap_url),
            feed_url: None,
        };
    }

    let homepage = OnceCell::new();

    let mut feed_hit = find_feed_by_paths(fetcher, site).await;
    if feed_hit.is_none()
        && let Some(page) = fetch_homepage(&homepage, fetcher, site).await
    {
        feed_hit = find_feed_by_autodiscovery(fetcher, &page.body, &page.url).await;
    }
    if let Some(hit) = feed_hit {
        info!("Discovered {} candidate URLs via feed", hit.urls.len());
        return Discovery {
            strategy: DiscoveryStrategy::Rss,
            urls: hit.urls,
            sitemap_url: None,
            feed_url: Some(hit.feed_url),
        };
    }

    if let Some(page) = fetch_homepage(&homepage, fetcher, site).await {
        let urls = extract_article_links(&page.body, &page.url, site, policy);
        if !urls.is_empty() {
            info!("Discovered {} candidate URLs via homepage links", urls.len());
            return Discovery {
                strategy: DiscoveryStrategy::Links,
                urls,
                ..Default::default()
            };
        }
    }

    info!("No candidate URLs found for {site}");
    Discovery::default()
}

/// The homepage after redirects, fetched on first use.
async fn fetch_homepage<'a>(
    homepage: &'a OnceCell<Option<FetchedPage>>,
    fetcher: &Fetcher,
    site: &Url,
) -> Option<&'a FetchedPage> {
    homepage
        .get_or_init(|| async move {
            fetcher
                .get(site.as_str())
                .await
                .map_err(|e| debug!("Homepage {site} unreachable: {e}"))
                .ok()
        })
        .await
        .as_ref()
}

/// Reports how many articles a crawl of `url` would find, without fetching them.
///
/// With `options.sitemap_url` only that sitemap is validated. Any failure
/// yields `found = false`.
pub async fn discover_sitemap(url: &str, options: &CrawlOptions) -> SitemapDiscoveryResult {
    let (site, fetcher) = match normalize_blog_url(url)
        .and_then(|site| Ok((site, Fetcher::new(options.fetch_timeout)?)))
    {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("{e}");
            return SitemapDiscoveryResult::default();
        }
    };

    if let Some(manual) = &options.sitemap_url {
        return match extract_sitemap_urls(&fetcher, manual, &site, &options.article_policy).await
        {
            Ok(urls) if !urls.is_empty() => SitemapDiscoveryResult {
                found: true,
                sitemap_url: Some(manual.clone()),
                article_count: Some(urls.len()),
                strategy: DiscoveryStrategy::Sitemap,
            },
            Ok(_) => {
                debug!("Manual sitemap {manual} has no article URLs");
                SitemapDiscoveryResult::default()
            }
            Err(e) => {
                debug!("Manual sitemap {manual} rejected: {e}");
                SitemapDiscoveryResult::default()
            }
        };
    }

    let discovery = discover_urls(&fetcher, &site, options).await;
    if discovery.urls.is_empty() {
        return SitemapDiscoveryResult::default();
    }

    SitemapDiscoveryResult {
        found: true,
        sitemap_url: discovery.sitemap_url,
        article_count: Some(discovery.urls.len()),
        strategy: discovery.strategy,
    }
}
