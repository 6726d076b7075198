//! Byte-level text encoding detection for uploaded export files.

use encoding_rs::{Encoding, SHIFT_JIS, UTF_8, UTF_16BE, UTF_16LE};
use serde::Serialize;

/// Number of leading bytes inspected when no byte-order mark is present.
const SNIFF_LIMIT: usize = 4096;

/// Encodings an uploaded file can be decoded with.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
    #[serde(rename = "shift-jis")]
    ShiftJis,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::ShiftJis => "shift-jis",
        }
    }

    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
            TextEncoding::ShiftJis => SHIFT_JIS,
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Guesses the encoding of `buffer`.
///
/// A byte-order mark wins outright. Otherwise the first few kilobytes are
/// scanned once, counting UTF-8 multi-byte sequences and Shift-JIS
/// lead/trail pairs without overlap, and Shift-JIS is chosen only when it
/// strictly outscores UTF-8. Never fails; ambiguous input falls back to UTF-8.
pub fn detect_encoding(buffer: &[u8]) -> TextEncoding {
    match buffer {
        [0xEF, 0xBB, 0xBF, ..] => return TextEncoding::Utf8,
        [0xFF, 0xFE, ..] => return TextEncoding::Utf16Le,
        [0xFE, 0xFF, ..] => return TextEncoding::Utf16Be,
        _ => {}
    }

    let mut rest = buffer.get(..SNIFF_LIMIT).unwrap_or(buffer);
    let mut utf8_score = 0_usize;
    let mut sjis_score = 0_usize;

    while !rest.is_empty() {
        let consumed = match rest {
            [0xE0..=0xEF, second, third, ..]
                if is_continuation(*second) && is_continuation(*third) =>
            {
                utf8_score += 1;
                3
            }
            [0xC2..=0xDF, second, ..] if is_continuation(*second) => {
                utf8_score += 1;
                2
            }
            [0x81..=0x9F | 0xE0..=0xEF, trail, ..] if is_sjis_trail(*trail) => {
                sjis_score += 1;
                2
            }
            _ => 1,
        };
        rest = rest.get(consumed..).unwrap_or_default();
    }

    if sjis_score > utf8_score && sjis_score > 0 {
        TextEncoding::ShiftJis
    } else {
        TextEncoding::Utf8
    }
}

/// Decodes `buffer` with the detected encoding, dropping any byte-order mark.
/// Malformed sequences become U+FFFD.
pub fn decode_text(buffer: &[u8]) -> (String, TextEncoding) {
    let encoding = detect_encoding(buffer);
    let (text, _, _) = encoding.encoding().decode(buffer);
    (text.into_owned(), encoding)
}

fn is_continuation(byte: u8) -> bool {
    (0x80..=0xBF).contains(&byte)
}

fn is_sjis_trail(byte: u8) -> bool {
    (0x40..=0x7E).contains(&byte) || (0x80..=0xFC).contains(&byte)
}
