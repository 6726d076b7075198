//! Readable article text and metadata from a single blog page.

use std::collections::HashSet;

use anyhow::{Result, bail};
use dom_smoothie::{Article, CandidateSelectMode, Config, Readability, TextMode};
use scraper::{ElementRef, Html, Selector as ScraperSelector};
use serde::Serialize;
use serde_json::Value;

/// Meta keys holding a publication date, in priority order.
const META_DATE_KEYS: &[&str] = &[
    "article:published_time",
    "og:published_time",
    "datePublished",
    "pubdate",
    "publishdate",
    "date",
    "DC.date.issued",
];

/// An article extracted from a blog page.
///
/// `content` is the trimmed plain-text body. `word_count` is the number of
/// characters of `content`, not a count of words.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedArticle {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub word_count: usize,
}

/// Extracts the readable article of a page.
///
/// Runs a readability pass for title and text, then scans the document for
/// the publication date, categories and tags.
///
/// # Arguments
///
/// * `url` - The page URL, used for link resolution and as last-resort title
/// * `html` - The page HTML
///
/// # Errors
///
/// This function will return an error if:
///
/// - The readability pass fails on the document.
/// - No readable text is left after extraction.
pub fn extract_article(url: &str, html: &str) -> Result<ExtractedArticle> {
    let config = Config {
        text_mode: TextMode::Formatted,
        candidate_select_mode: CandidateSelectMode::DomSmoothie,
        ..Default::default()
    };

    let mut readability = Readability::new(html, Some(url), Some(config))?;
    let article: Article = readability.parse()?;

    let content = article.text_content.trim().to_string();
    if content.is_empty() {
        bail!("No readable text in {url}");
    }

    let document = Html::parse_document(html);
    let title = Some(article.title.trim().to_string())
        .filter(|title| !title.is_empty())
        .or_else(|| parse_title(&document))
        .unwrap_or_else(|| url.to_string());

    Ok(ExtractedArticle {
        url: url.to_string(),
        title,
        published_at: extract_published_at(&document),
        categories: extract_categories(&document),
        tags: extract_tags(&document),
        word_count: content.chars().count(),
        content,
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Parses the title from HTML content
fn parse_title(document: &Html) -> Option<String> {
    for tag in ["title", "h1", "h2"] {
        if let Ok(tag_selector) = ScraperSelector::parse(tag)
            && let Some(tag_element) = document.select(&tag_selector).next()
        {
            let tag_text = element_text(tag_element);
            if !tag_text.is_empty() {
                return Some(tag_text);
            }
        }
    }

    None
}

/// `content` of every meta tag whose `property`, `name` or `itemprop` is `key`.
fn meta_contents(document: &Html, key: &str) -> Vec<String> {
    let query = format!(r#"meta[property="{key}"], meta[name="{key}"], meta[itemprop="{key}"]"#);
    let Ok(selector) = ScraperSelector::parse(&query) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .collect()
}

fn link_texts(document: &Html, rel: &str) -> Vec<String> {
    let Ok(selector) = ScraperSelector::parse(&format!(r#"a[rel~="{rel}"]"#)) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Meta tags, then `<time datetime>`, then JSON-LD. First match wins.
fn extract_published_at(document: &Html) -> Option<String> {
    if let Some(date) = META_DATE_KEYS
        .iter()
        .find_map(|key| meta_contents(document, key).into_iter().next())
    {
        return Some(date);
    }

    if let Ok(selector) = ScraperSelector::parse("time[datetime]")
        && let Some(datetime) = document
            .select(&selector)
            .filter_map(|time| time.value().attr("datetime"))
            .map(str::trim)
            .find(|datetime| !datetime.is_empty())
    {
        return Some(datetime.to_string());
    }

    let json_ld = json_ld_documents(document);
    ["datePublished", "dateCreated"]
        .iter()
        .find_map(|key| json_ld.iter().find_map(|value| find_json_ld_string(value, key)))
}

fn json_ld_documents(document: &Html) -> Vec<Value> {
    let Ok(selector) = ScraperSelector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|script| serde_json::from_str(&script.text().collect::<String>()).ok())
        .collect()
}

/// Depth-first search through objects, arrays and `@graph` for a string `key`.
fn find_json_ld_string(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::Object(map) => map
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|found| !found.is_empty())
            .map(str::to_string)
            .or_else(|| map.values().find_map(|nested| find_json_ld_string(nested, key))),
        Value::Array(items) => items.iter().find_map(|item| find_json_ld_string(item, key)),
        _ => None,
    }
}

/// `article:section` meta, else `rel=category` links.
fn extract_categories(document: &Html) -> Option<Vec<String>> {
    first_non_empty([
        meta_contents(document, "article:section"),
        link_texts(document, "category"),
    ])
}

/// `article:tag` meta, else comma-split keywords, else `rel=tag` links.
fn extract_tags(document: &Html) -> Option<Vec<String>> {
    let keywords = meta_contents(document, "keywords")
        .iter()
        .flat_map(|keywords| keywords.split(','))
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect();

    first_non_empty([
        meta_contents(document, "article:tag"),
        keywords,
        link_texts(document, "tag"),
    ])
}

fn first_non_empty<const N: usize>(sources: [Vec<String>; N]) -> Option<Vec<String>> {
    sources.into_iter().find(|values| !values.is_empty()).map(|values| {
        let mut seen = HashSet::new();
        values
            .into_iter()
            .filter(|value| seen.insert(value.clone()))
            .collect()
    })
}
