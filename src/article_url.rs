//! Heuristic classification of candidate URLs as blog articles.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use url::Url;

/// Confidence for paths that look like posts (dated or under a blog-ish segment).
pub const PATTERN_CONFIDENCE: f32 = 1.0;
/// Confidence for any other non-root path that survived the exclusions.
/// This is the main source of false positives in the link crawl.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

static EXCLUDED_PATHS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)/(category|categories|tag|tags|author|authors)(/|$)",
        r"(?i)/page/\d+",
        r"(?i)[?&](page|paged)=\d+",
        r"(?i)/(wp-admin|wp-content|wp-includes|wp-json|wp-login\.php)",
        r"(?i)/(admin|login|logout|signin|signup|register|cart|checkout|search)(/|$)",
        r"(?i)/(feed|rss|atom)(/|\.xml|$)",
        r"(?i)\.(jpe?g|png|gif|svg|webp|ico|css|js|json|xml|txt|pdf|zip|gz|mp3|mp4|mov|woff2?|ttf|eot)$",
    ])
    .expect("Failed to compile excluded path patterns")
});

static ARTICLE_PATHS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"/\d{4}/\d{1,2}(/\d{1,2})?/[^/]+",
        r"(?i)/(blog|blogs|post|posts|article|articles|entry|entries|news|archives?|column|columns)/[^/]+",
        r"(?i)/entry-\d+",
    ])
    .expect("Failed to compile article path patterns")
});

static WWW_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^www\.").expect("Failed to compile www prefix regex"));

/// Threshold policy deciding which scored URLs count as articles.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ArticleUrlPolicy {
    pub min_confidence: f32,
}

impl Default for ArticleUrlPolicy {
    fn default() -> Self {
        Self {
            min_confidence: FALLBACK_CONFIDENCE,
        }
    }
}

impl ArticleUrlPolicy {
    /// Only accepts URLs matching a dated or blog-style path.
    pub fn strict() -> Self {
        Self {
            min_confidence: PATTERN_CONFIDENCE,
        }
    }

    pub fn accepts(&self, candidate: &Url, site: &Url) -> bool {
        let confidence = article_confidence(candidate, site);
        confidence > 0.0 && confidence >= self.min_confidence
    }
}

/// Scores how likely `candidate` is an article of `site`, from 0.0 (rejected) to 1.0.
pub fn article_confidence(candidate: &Url, site: &Url) -> f32 {
    if !matches!(candidate.scheme(), "http" | "https") || !same_host(candidate, site) {
        return 0.0;
    }

    let path = candidate.path();
    let path_and_query = match candidate.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    if EXCLUDED_PATHS.is_match(&path_and_query) {
        0.0
    } else if ARTICLE_PATHS.is_match(path) {
        PATTERN_CONFIDENCE
    } else if path.split('/').any(|segment| !segment.is_empty()) {
        FALLBACK_CONFIDENCE
    } else {
        0.0
    }
}

/// Checks `candidate` against `site` with the default policy.
pub fn is_article_url(candidate: &str, site: &Url) -> bool {
    Url::parse(candidate).is_ok_and(|candidate| ArticleUrlPolicy::default().accepts(&candidate, site))
}

/// Same host, ignoring a `www.` prefix, and the same explicit port.
///
/// Scheme default ports compare equal so an http to https upgrade stays on site.
fn same_host(candidate: &Url, site: &Url) -> bool {
    if candidate.port() != site.port() {
        return false;
    }

    match (candidate.host_str(), site.host_str()) {
        (Some(candidate), Some(site)) => {
            WWW_PREFIX.replace(&candidate.to_lowercase(), "")
                == WWW_PREFIX.replace(&site.to_lowercase(), "")
        }
        _ => false,
    }
}
