use encoding_rs::SHIFT_JIS;
use postcraft::encoding::{TextEncoding, decode_text, detect_encoding};
use spectral::{assert_that, boolean::BooleanAssertions};

const JAPANESE_CSV: &str = "投稿ID,キャプション\n1,春限定のいちごラテを始めました #カフェ\n";

#[test]
fn byte_order_marks_win() {
    assert_that(&detect_encoding(&[0xEF, 0xBB, 0xBF, b'a'])).is_equal_to(TextEncoding::Utf8);
    assert_that(&detect_encoding(&[0xFF, 0xFE, b'a', 0x00])).is_equal_to(TextEncoding::Utf16Le);
    assert_that(&detect_encoding(&[0xFE, 0xFF, 0x00, b'a'])).is_equal_to(TextEncoding::Utf16Be);
}

#[test]
fn plain_ascii_and_empty_input_are_utf8() {
    assert_that(&detect_encoding(b"id,caption\n1,hello\n")).is_equal_to(TextEncoding::Utf8);
    assert_that(&detect_encoding(&[])).is_equal_to(TextEncoding::Utf8);
}

#[test]
fn japanese_utf8_is_not_mistaken_for_shift_jis() {
    assert_that(&detect_encoding(JAPANESE_CSV.as_bytes())).is_equal_to(TextEncoding::Utf8);
}

#[test]
fn japanese_shift_jis_is_detected() {
    let (bytes, _, unmappable) = SHIFT_JIS.encode(JAPANESE_CSV);
    assert_that(&unmappable).is_false();

    assert_that(&detect_encoding(&bytes)).is_equal_to(TextEncoding::ShiftJis);
}

#[test]
fn shift_jis_text_decodes_back() {
    let (bytes, _, _) = SHIFT_JIS.encode(JAPANESE_CSV);
    let (text, encoding) = decode_text(&bytes);

    assert_that(&encoding).is_equal_to(TextEncoding::ShiftJis);
    assert_that(&text).is_equal_to(JAPANESE_CSV.to_string());
}

#[test]
fn bom_is_dropped_when_decoding() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("id,caption".as_bytes());
    let (text, encoding) = decode_text(&bytes);
    assert_that(&encoding).is_equal_to(TextEncoding::Utf8);
    assert_that(&text).is_equal_to("id,caption".to_string());

    let mut utf16: Vec<u8> = vec![0xFF, 0xFE];
    utf16.extend("いちご".encode_utf16().flat_map(u16::to_le_bytes));
    let (text, encoding) = decode_text(&utf16);
    assert_that(&encoding).is_equal_to(TextEncoding::Utf16Le);
    assert_that(&text).is_equal_to("いちご".to_string());
}

#[test]
fn encoding_names() {
    assert_that(&TextEncoding::ShiftJis.to_string()).is_equal_to("shift-jis".to_string());
    assert_that(&TextEncoding::Utf16Be.name()).is_equal_to("utf-16be");
}
