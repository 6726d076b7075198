//! Maps the loosely named columns of Bright Data exports onto
//! [`InstagramPostData`] and [`InstagramProfileData`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::debug;
use once_cell::sync::Lazy;
use rand::{Rng, distributions::Alphanumeric};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants::MAX_POSTS;

/// One record of an export, keyed by the vendor's column names.
pub type Row = Map<String, Value>;

static CAPTION_HASHTAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"#[\p{Latin}\p{Hiragana}\p{Katakana}\p{Han}0-9_ー０-９]+")
        .expect("Failed to compile caption hashtag regex")
});

const POST_FIELD_SYNONYMS: &[(&str, &str)] = &[
    ("postid", "post_id"),
    ("id", "post_id"),
    ("shortcode", "post_id"),
    ("mediaid", "post_id"),
    ("pk", "post_id"),
    ("posttype", "post_type"),
    ("type", "post_type"),
    ("mediatype", "post_type"),
    ("contenttype", "post_type"),
    ("producttype", "post_type"),
    ("caption", "caption"),
    ("description", "caption"),
    ("text", "caption"),
    ("posttext", "caption"),
    ("hashtags", "hashtags"),
    ("hashtag", "hashtags"),
    ("tags", "hashtags"),
    ("likescount", "likes_count"),
    ("likes", "likes_count"),
    ("likecount", "likes_count"),
    ("numlikes", "likes_count"),
    ("commentscount", "comments_count"),
    ("comments", "comments_count"),
    ("commentcount", "comments_count"),
    ("numcomments", "comments_count"),
    ("postedat", "posted_at"),
    ("timestamp", "posted_at"),
    ("date", "posted_at"),
    ("datetime", "posted_at"),
    ("dateposted", "posted_at"),
    ("createdat", "posted_at"),
    ("takenat", "posted_at"),
    ("publishedat", "posted_at"),
    ("engagementrate", "engagement_rate"),
    ("engagement", "engagement_rate"),
    ("imageurl", "image_url"),
    ("image", "image_url"),
    ("displayurl", "image_url"),
    ("thumbnail", "image_url"),
    ("thumbnailurl", "image_url"),
    ("mediaurl", "image_url"),
];

const PROFILE_FIELD_SYNONYMS: &[(&str, &str)] = &[
    ("username", "username"),
    ("account", "username"),
    ("handle", "username"),
    ("fullname", "full_name"),
    ("profilename", "full_name"),
    ("name", "full_name"),
    ("biography", "biography"),
    ("bio", "biography"),
    ("followerscount", "followers_count"),
    ("followers", "followers_count"),
    ("followingcount", "following_count"),
    ("following", "following_count"),
    ("follows", "following_count"),
    ("postscount", "posts_count"),
    ("mediacount", "posts_count"),
    ("profileurl", "profile_url"),
    ("url", "profile_url"),
];

/// Normalized Instagram post type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Image,
    Carousel,
    Video,
    Reel,
}

/// A post as the analysis layer consumes it.
///
/// `post_id` may be synthesized (`generated_<millis>_<random>`) when the
/// export has none; such ids differ between two imports of the same file.
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct InstagramPostData {
    pub post_id: String,
    pub post_type: PostType,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Empty when the export carries no date.
    pub posted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct InstagramProfileData {
    pub username: String,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub profile_url: Option<String>,
}

/// Looks up the internal post field for a vendor column name.
///
/// Matching ignores case, underscores, hyphens and spaces. Unknown names map to `None`.
pub fn map_field_name(external_name: &str) -> Option<&'static str> {
    lookup(POST_FIELD_SYNONYMS, external_name)
}

/// Same as [`map_field_name`] for profile columns.
pub fn map_profile_field_name(external_name: &str) -> Option<&'static str> {
    lookup(PROFILE_FIELD_SYNONYMS, external_name)
}

fn lookup(table: &[(&str, &'static str)], external_name: &str) -> Option<&'static str> {
    let key = normalize_key(external_name);
    table
        .iter()
        .find(|(synonym, _)| normalize_key(synonym) == key)
        .map(|(_, internal)| *internal)
}

fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Collects the recognised fields of `row`, first non-empty column winning.
fn collect_fields<'a>(
    row: &'a Row,
    mapper: fn(&str) -> Option<&'static str>,
) -> HashMap<&'static str, &'a Value> {
    let mut fields = HashMap::new();
    for (name, value) in row {
        let Some(internal) = mapper(name) else {
            continue;
        };
        if is_blank(value) {
            continue;
        }
        fields.entry(internal).or_insert(value);
    }
    fields
}

/// Builds a post from one export row.
///
/// Returns `None` when the row has neither an id nor a caption.
pub fn object_to_post_data(row: &Row) -> Option<InstagramPostData> {
    let fields = collect_fields(row, map_field_name);
    let text = |key: &str| {
        fields
            .get(key)
            .map(|value| value_to_string(value).trim().to_string())
            .unwrap_or_default()
    };

    let post_id = text("post_id");
    let caption = text("caption");
    if post_id.is_empty() && caption.is_empty() {
        debug!("Dropping row without post id or caption");
        return None;
    }

    let explicit_hashtags = fields
        .get("hashtags")
        .copied()
        .map(parse_hashtags)
        .unwrap_or_default();
    let hashtags = if explicit_hashtags.is_empty() {
        extract_hashtags_from_caption(&caption)
    } else {
        explicit_hashtags
    };

    Some(InstagramPostData {
        post_id: if post_id.is_empty() {
            generate_post_id()
        } else {
            post_id
        },
        post_type: normalize_post_type(&text("post_type")),
        hashtags,
        likes_count: fields.get("likes_count").copied().map_or(0, parse_count),
        comments_count: fields.get("comments_count").copied().map_or(0, parse_count),
        posted_at: fields
            .get("posted_at")
            .copied()
            .map(normalize_timestamp)
            .unwrap_or_default(),
        engagement_rate: fields.get("engagement_rate").copied().and_then(parse_rate),
        image_url: Some(text("image_url")).filter(|url| !url.is_empty()),
        caption,
    })
}

/// Builds a profile from a row that carries profile columns.
///
/// Requires a username plus at least one follower, following or biography column,
/// so post rows that merely name their owner are not mistaken for a profile.
pub fn object_to_profile_data(row: &Row) -> Option<InstagramProfileData> {
    let fields = collect_fields(row, map_profile_field_name);
    let text = |key: &str| {
        fields
            .get(key)
            .map(|value| value_to_string(value).trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let username = text("username")?;
    if !["followers_count", "following_count", "biography"]
        .iter()
        .any(|key| fields.contains_key(*key))
    {
        return None;
    }

    Some(InstagramProfileData {
        username: username.trim_start_matches('@').to_string(),
        full_name: text("full_name"),
        biography: text("biography"),
        followers_count: fields.get("followers_count").copied().map_or(0, parse_count),
        following_count: fields.get("following_count").copied().map_or(0, parse_count),
        posts_count: fields.get("posts_count").copied().map_or(0, parse_count),
        profile_url: text("profile_url"),
    })
}

/// Parses an explicit hashtag column.
///
/// Accepts a JSON array, a JSON-array string, or comma- or whitespace-separated
/// text, falling back from one form to the next. Tags come back `#`-prefixed
/// and deduplicated.
pub fn parse_hashtags(value: &Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        Value::Array(items) => items.iter().map(value_to_string).collect(),
        other => split_hashtag_text(&value_to_string(other)),
    };
    normalize_tags(raw.iter().map(String::as_str))
}

fn split_hashtag_text(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.starts_with('[')
        && let Ok(items) = serde_json::from_str::<Vec<Value>>(text)
    {
        return items.iter().map(value_to_string).collect();
    }

    if text.contains(',') {
        text.split(',').map(str::to_string).collect()
    } else {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Pulls `#tags` out of free caption text, including Japanese scripts.
pub fn extract_hashtags_from_caption(caption: &str) -> Vec<String> {
    normalize_tags(
        CAPTION_HASHTAG_REGEX
            .find_iter(caption)
            .map(|found| found.as_str()),
    )
}

fn normalize_tags<'a>(tags: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.map(|tag| tag.trim().trim_matches('"').trim_start_matches('#').trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

pub fn normalize_post_type(raw: &str) -> PostType {
    let raw = raw.to_lowercase();
    if raw.contains("carousel") || raw.contains("sidecar") {
        PostType::Carousel
    } else if raw.contains("reel") {
        PostType::Reel
    } else if raw.contains("video") {
        PostType::Video
    } else {
        PostType::Image
    }
}

/// Keeps at most [`MAX_POSTS`] posts, with a warning when any were cut.
pub fn limit_posts(mut posts: Vec<InstagramPostData>) -> (Vec<InstagramPostData>, Option<String>) {
    let total = posts.len();
    if total <= MAX_POSTS {
        return (posts, None);
    }

    posts.truncate(MAX_POSTS);
    (
        posts,
        Some(format!(
            "File contains {total} posts; only the first {MAX_POSTS} were imported"
        )),
    )
}

fn generate_post_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("generated_{}_{suffix}", Utc::now().timestamp_millis())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(|n| n.round() as u64)
            })
            .unwrap_or(0),
        Value::String(text) => {
            let digits: String = text
                .chars()
                .filter(|ch| !matches!(ch, ',' | '_') && !ch.is_whitespace())
                .collect();
            digits.parse::<u64>().ok().unwrap_or_else(|| {
                digits
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map_or(0, |n| n.round() as u64)
            })
        }
        Value::Array(items) => items.len() as u64,
        _ => 0,
    }
}

fn parse_rate(value: &Value) -> Option<f64> {
    let rate: Option<f64> = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    };
    rate.filter(|rate| rate.is_finite())
}

/// Renders Unix timestamps (seconds or milliseconds) as RFC 3339, anything else verbatim.
fn normalize_timestamp(value: &Value) -> String {
    let raw = value_to_string(value).trim().to_string();
    let Ok(number) = raw.parse::<i64>() else {
        return raw;
    };

    let seconds = if number.abs() >= 100_000_000_000 {
        number / 1000
    } else {
        number
    };
    DateTime::<Utc>::from_timestamp(seconds, 0).map_or(raw, |parsed| parsed.to_rfc3339())
}
