//! Comma-separated text tokenizing for uploaded exports.

use csv::{ReaderBuilder, Terminator};

/// Splits `text` into rows of fields.
///
/// Comma is the only delimiter. A field opening with `"` is quoted: inside it
/// `""` is a literal quote and delimiters or line breaks are kept verbatim.
/// Outside quotes `\r`, `\n` and `\r\n` each end a row. Rows whose fields are
/// all blank are dropped and a final row without a line break is kept.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(b',')
        .quote(b'"')
        .double_quote(true)
        .terminator(Terminator::CRLF)
        .from_reader(text.as_bytes());

    reader
        .records()
        .flatten()
        .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|field| !field.trim().is_empty()))
        .collect()
}
