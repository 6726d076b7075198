//! Link harvesting from a single HTML page.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::article_url::ArticleUrlPolicy;

/// Resolves `raw` against `base` into an absolute http(s) URL without fragment.
pub fn resolve_url(raw: &str, base: &Url) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let mut url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// The URL relative links of `document` resolve against: its `<base href>`
/// when present and valid, else `page_url`.
pub fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .filter_map(|base| base.value().attr("href"))
                .find_map(|href| resolve_url(href, page_url))
        })
        .unwrap_or_else(|| page_url.clone())
}

/// Collects every `<a href>` of `html` that `policy` accepts as an article of `site`.
///
/// Only the given page is read; pagination and category pages are not followed.
/// Order of first appearance is kept and duplicates are dropped.
pub fn extract_article_links(
    html: &str,
    page_url: &Url,
    site: &Url,
    policy: &ArticleUrlPolicy,
) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let base = document_base(&document, page_url);

    let mut seen = HashSet::new();
    document
        .select(&anchor_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_url(href, &base))
        .filter(|url| policy.accepts(url, site))
        .map(|url| url.to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
