//! RSS/Atom feed discovery and link extraction.

use std::collections::HashSet;

use anyhow::{Context, Result};
use feed_rs::model::Entry;
use log::{debug, info};
use scraper::{Html, Selector};
use url::Url;

use crate::constants::FEED_PATHS;
use crate::fetch::{FetchedPage, Fetcher};
use crate::links::{document_base, resolve_url};

/// A feed that yielded article links.
#[derive(Debug)]
pub struct FeedHit {
    pub feed_url: String,
    pub urls: Vec<String>,
}

/// Recognizes feed responses by content type or, failing that, by markup.
pub fn looks_like_feed(content_type: Option<&str>, body: &str) -> bool {
    if content_type.is_some_and(|content_type| {
        content_type.contains("rss") || content_type.contains("atom")
    }) {
        return true;
    }

    let head: String = body.chars().take(2048).collect();
    ["<rss", "<feed", "<channel"]
        .iter()
        .any(|marker| head.contains(marker))
}

/// Parses an RSS or Atom document into absolute entry URLs, resolved against `feed_url`.
///
/// # Errors
///
/// Returns an error if the document is not a parseable feed.
pub fn parse_feed_links(body: &str, feed_url: &Url) -> Result<Vec<String>> {
    let feed = feed_rs::parser::parse(body.as_bytes())
        .context(format!("Unable to parse feed {feed_url}"))?;

    let mut seen = HashSet::new();
    Ok(feed
        .entries
        .iter()
        .filter_map(select_entry_link)
        .filter_map(|link| resolve_url(&link, feed_url))
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect())
}

fn select_entry_link(entry: &Entry) -> Option<String> {
    let alternate = entry.links.iter().find(|link| {
        !link.href.trim().is_empty()
            && link
                .rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
    });
    if let Some(link) = alternate.or_else(|| entry.links.iter().find(|l| !l.href.trim().is_empty())) {
        return Some(link.href.clone());
    }

    let id = entry.id.trim();
    (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
}

/// Finds the feed advertised by `<link rel="alternate">` in a page.
pub fn discover_feed_link(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);
    let selector = Selector::parse(
        r#"link[rel~="alternate"][type="application/rss+xml"], link[rel~="alternate"][type="application/atom+xml"]"#,
    )
    .ok()?;

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| resolve_url(href, &base))
}

fn links_from_page(page: &FetchedPage) -> Option<Vec<String>> {
    if !looks_like_feed(page.content_type.as_deref(), &page.body) {
        return None;
    }

    match parse_feed_links(&page.body, &page.url) {
        Ok(urls) if !urls.is_empty() => Some(urls),
        Ok(_) => None,
        Err(e) => {
            debug!("{e}");
            None
        }
    }
}

/// Tries the conventional feed paths of `site` in order.
pub async fn find_feed_by_paths(fetcher: &Fetcher, site: &Url) -> Option<FeedHit> {
    for path in FEED_PATHS {
        let Ok(candidate) = site.join(path) else {
            continue;
        };

        let page = match fetcher.get(candidate.as_str()).await {
            Ok(page) => page,
            Err(e) => {
                debug!("No feed at {candidate}: {e}");
                continue;
            }
        };

        if let Some(urls) = links_from_page(&page) {
            info!("Found {} entries in feed {candidate}", urls.len());
            return Some(FeedHit {
                feed_url: candidate.to_string(),
                urls,
            });
        }
    }

    None
}

/// Follows the feed advertised in the homepage `html`, if any.
pub async fn find_feed_by_autodiscovery(
    fetcher: &Fetcher,
    html: &str,
    page_url: &Url,
) -> Option<FeedHit> {
    let feed_url = discover_feed_link(html, page_url)?;
    let page = fetcher
        .get(feed_url.as_str())
        .await
        .map_err(|e| debug!("Advertised feed {feed_url} unreachable: {e}"))
        .ok()?;

    let urls = links_from_page(&page)?;
    info!("Found {} entries in advertised feed {feed_url}", urls.len());
    Some(FeedHit {
        feed_url: feed_url.to_string(),
        urls,
    })
}
