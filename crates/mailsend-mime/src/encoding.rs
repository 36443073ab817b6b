//! MIME encoding and decoding utilities.
//!
//! Supports Base64 bodies (RFC 2045) and RFC 2047 "B" encoded words.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum encoded line length for Base64 bodies (RFC 2045 §6.8).
pub const BASE64_LINE_LENGTH: usize = 76;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-separated lines of at most
/// [`BASE64_LINE_LENGTH`] characters. No line ending follows the last line.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2);

    // Base64 output is ASCII, so byte chunks are valid str slices.
    for (i, line) in encoded.as_bytes().chunks(BASE64_LINE_LENGTH).enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.push_str(std::str::from_utf8(line).unwrap_or_default());
    }
    out
}

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Maximum length of one encoded word (RFC 2047 §2).
pub const MAX_ENCODED_WORD_LENGTH: usize = 75;

/// Raw bytes that fit one word: the base64 text must leave room for
/// `=?UTF-8?B?` and `?=`.
const WORD_PAYLOAD: usize = (MAX_ENCODED_WORD_LENGTH - "=?UTF-8?B??=".len()) / 4 * 3;

/// Encodes raw bytes as a single UTF-8 "B" encoded word, whatever they contain.
///
/// Format: `=?UTF-8?B?encoded-text?=`. Long input yields a word longer than
/// [`MAX_ENCODED_WORD_LENGTH`]; use [`encode_words`] for header values.
#[must_use]
pub fn encode_word(data: &[u8]) -> String {
    format!("=?UTF-8?B?{}?=", encode_base64(data))
}

/// Encodes raw bytes as space-separated "B" encoded words, each at most
/// [`MAX_ENCODED_WORD_LENGTH`] characters long.
///
/// Multi-byte UTF-8 sequences are never split across words. Empty input
/// yields one empty word.
#[must_use]
pub fn encode_words(data: &[u8]) -> String {
    let mut words = Vec::with_capacity(data.len() / WORD_PAYLOAD + 1);
    let mut rest = data;
    loop {
        let mut end = rest.len().min(WORD_PAYLOAD);
        while end < rest.len() && end + 3 > WORD_PAYLOAD && rest[end] & 0xC0 == 0x80 {
            end -= 1;
        }
        let (word, tail) = rest.split_at(end);
        words.push(encode_word(word));
        if tail.is_empty() {
            break;
        }
        rest = tail;
    }
    words.join(" ")
}

/// Encodes a header value using RFC 2047 encoding if it needs it.
///
/// Pure ASCII text without `=?` sequences is returned unchanged.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text.is_ascii() && !text.contains("=?") && !text.chars().any(|c| c.is_ascii_control()) {
        return text.to_string();
    }
    encode_words(text.as_bytes())
}

/// Decodes an RFC 2047 "B" encoded word.
///
/// Text that is not an encoded word is returned unchanged.
///
/// # Errors
///
/// Returns an error if the word is malformed, uses an encoding other than
/// "B", or does not decode to UTF-8.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let Some(inner) = text.strip_prefix("=?").and_then(|t| t.strip_suffix("?=")) else {
        return Ok(text.to_string());
    };

    let mut parts = inner.splitn(3, '?');
    let (Some(_charset), Some(encoding), Some(encoded_text)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidEncoding("Invalid RFC 2047 format".to_string()));
    };

    if !encoding.eq_ignore_ascii_case("B") {
        return Err(Error::InvalidEncoding(format!(
            "Unsupported encoding: {encoding}"
        )));
    }

    String::from_utf8(decode_base64(encoded_text)?).map_err(Into::into)
}
