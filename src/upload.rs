//! Parses Bright Data CSV/JSON exports into Instagram posts and profile data.

use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::MAX_FILE_SIZE;
use crate::delimited::parse_csv;
use crate::encoding::decode_text;
use crate::mapping::{
    InstagramPostData, InstagramProfileData, Row, limit_posts, object_to_post_data,
    object_to_profile_data,
};

/// An uploaded file as received from the client.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Outcome of an import. Problems are reported in `errors`/`warnings`, never raised.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CsvParseResult {
    pub profile: Option<InstagramProfileData>,
    pub posts: Vec<InstagramPostData>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CsvParseResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// The two shapes a JSON export comes in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BrightDataPayload {
    /// A bare array of post records.
    Array(Vec<Value>),
    /// An object holding the records under `posts` or `data`,
    /// possibly alongside profile fields.
    Wrapped(WrappedPayload),
}

#[derive(Debug, Deserialize)]
pub struct WrappedPayload {
    #[serde(default)]
    posts: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    profile: Option<Value>,
    #[serde(flatten)]
    rest: Row,
}

/// Rows and profile resolved from a payload of either shape.
struct ResolvedRows {
    profile: Option<InstagramProfileData>,
    rows: Vec<Row>,
}

impl BrightDataPayload {
    fn resolve(self) -> std::result::Result<ResolvedRows, String> {
        match self {
            BrightDataPayload::Array(items) => {
                let rows = into_rows(items);
                let profile = rows.first().and_then(object_to_profile_data);
                Ok(ResolvedRows { profile, rows })
            }
            BrightDataPayload::Wrapped(wrapped) => {
                let items = match (wrapped.posts, wrapped.data) {
                    (Some(Value::Array(items)), _) | (_, Some(Value::Array(items))) => items,
                    _ => {
                        return Err(
                            "JSON must be an array of posts or an object with a \"posts\" or \"data\" array"
                                .to_string(),
                        );
                    }
                };
                let profile = match wrapped.profile {
                    Some(Value::Object(profile)) => object_to_profile_data(&profile),
                    _ => object_to_profile_data(&wrapped.rest),
                };
                Ok(ResolvedRows {
                    profile,
                    rows: into_rows(items),
                })
            }
        }
    }
}

fn into_rows(items: Vec<Value>) -> Vec<Row> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}

/// Parses an uploaded Bright Data export.
///
/// Dispatches on the `.csv`/`.json` extension (case-insensitive) after enforcing
/// the size ceiling. Every failure ends up in the returned `errors` with no posts.
pub fn parse_bright_data_file(file: &UploadedFile) -> CsvParseResult {
    if file.bytes.len() > MAX_FILE_SIZE {
        return CsvParseResult::failed(format!(
            "File is too large ({:.1}MB). Maximum size is {}MB",
            file.bytes.len() as f64 / (1024.0 * 1024.0),
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }

    let extension = Path::new(&file.name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_lowercase);

    let resolved = match extension.as_deref() {
        Some("json") => parse_json_rows(&file.bytes),
        Some("csv") => parse_csv_rows(&file.bytes),
        _ => Err("Unsupported file format. Please upload a .csv or .json file".to_string()),
    };

    match resolved {
        Ok(resolved) => build_result(resolved),
        Err(message) => CsvParseResult::failed(message),
    }
}

/// Reads a file from disk into an [`UploadedFile`].
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_upload(path: &str) -> Result<UploadedFile> {
    let bytes = std::fs::read(path).context(format!("Failed to read upload file: {path}"))?;
    let name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string();

    Ok(UploadedFile { name, bytes })
}

fn parse_json_rows(bytes: &[u8]) -> std::result::Result<ResolvedRows, String> {
    let (text, encoding) = decode_text(bytes);
    debug!("Decoding JSON upload as {encoding}");

    serde_json::from_str::<BrightDataPayload>(&text)
        .map_err(|e| format!("Invalid JSON: {e}"))?
        .resolve()
}

fn parse_csv_rows(bytes: &[u8]) -> std::result::Result<ResolvedRows, String> {
    let (text, encoding) = decode_text(bytes);
    info!("Decoding CSV upload as {encoding}");

    let mut rows = parse_csv(&text).into_iter();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| "CSV file is empty".to_string())?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let rows: Vec<Row> = rows
        .map(|fields| {
            headers
                .iter()
                .zip(fields)
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, field)| (header.clone(), Value::String(field)))
                .collect()
        })
        .collect();

    if rows.is_empty() {
        return Err("CSV file has no data rows".to_string());
    }

    let profile = rows.first().and_then(object_to_profile_data);
    Ok(ResolvedRows { profile, rows })
}

fn build_result(resolved: ResolvedRows) -> CsvParseResult {
    let total_rows = resolved.rows.len();
    let posts: Vec<InstagramPostData> = resolved
        .rows
        .iter()
        .filter_map(object_to_post_data)
        .collect();

    let mut result = CsvParseResult {
        profile: resolved.profile,
        ..Default::default()
    };

    if posts.is_empty() {
        result
            .errors
            .push("No valid posts found. Each row needs a post id or a caption".to_string());
        return result;
    }

    let skipped = total_rows - posts.len();
    if skipped > 0 {
        result
            .warnings
            .push(format!("Skipped {skipped} rows without a post id or caption"));
    }

    let (posts, warning) = limit_posts(posts);
    result.warnings.extend(warning);
    result.posts = posts;

    info!(
        "Imported {} posts ({} rows read)",
        result.posts.len(),
        total_rows
    );
    result
}
