//! Header value decoding: encoded-words (RFC 2047), charsets and dates.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use crate::parser::payload::decode_base64;

/// Decode raw message bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
pub fn decode_text_bytes(bytes: &[u8]) -> String {
    // Strip BOM if present
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Decode a header value and keep only its first segment.
///
/// A segment is either a run of plain text or a run of adjacent encoded-words
/// sharing one charset. `None` passes through unchanged.
///
/// Example: `"=?UTF-8?B?0J/RgNC40LLQtdGC?= there"` → `"Привет"`
pub fn decode_header(value: Option<&str>) -> Option<String> {
    let value = value?;
    let first = split_segments(value)
        .into_iter()
        .next()
        .map(|segment| segment.decode().trim().to_string())
        .unwrap_or_default();
    Some(first)
}

/// Decode every RFC 2047 encoded-word in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// If decoding fails for any token, the original text is preserved.
pub fn decode_encoded_words(input: &str) -> String {
    split_segments(input)
        .iter()
        .map(Segment::decode)
        .collect()
}

/// A run of header text sharing one charset. `charset` is `None` for plain text.
struct Segment {
    charset: Option<String>,
    bytes: Vec<u8>,
}

impl Segment {
    fn decode(&self) -> String {
        match &self.charset {
            Some(charset) => decode_charset(charset, &self.bytes),
            None => String::from_utf8_lossy(&self.bytes).into_owned(),
        }
    }
}

fn split_segments(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        let after_start = &remaining[start + 2..];

        if let Some(word) = try_decode_one_word(after_start) {
            // Whitespace between two encoded words is not part of the text (RFC 2047 §6.2)
            if !last_was_encoded || !before.trim().is_empty() {
                push_plain(&mut segments, before);
            }
            push_encoded(&mut segments, word.charset, word.bytes);
            remaining = &after_start[word.consumed..];
            last_was_encoded = true;
        } else {
            push_plain(&mut segments, &remaining[..start + 2]);
            remaining = after_start;
            last_was_encoded = false;
        }
    }

    push_plain(&mut segments, remaining);
    segments
}

fn push_plain(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(last) if last.charset.is_none() => last.bytes.extend_from_slice(text.as_bytes()),
        _ => segments.push(Segment {
            charset: None,
            bytes: text.as_bytes().to_vec(),
        }),
    }
}

fn push_encoded(segments: &mut Vec<Segment>, charset: String, bytes: Vec<u8>) {
    match segments.last_mut() {
        Some(Segment {
            charset: Some(last_charset),
            bytes: last_bytes,
        }) if last_charset.eq_ignore_ascii_case(&charset) => last_bytes.extend(bytes),
        _ => segments.push(Segment {
            charset: Some(charset),
            bytes,
        }),
    }
}

struct DecodedWord {
    charset: String,
    bytes: Vec<u8>,
    consumed: usize, // bytes consumed from the string *after* the initial "=?"
}

fn try_decode_one_word(s: &str) -> Option<DecodedWord> {
    // Format: charset?encoding?encoded_text?=
    let first_q = s.find('?')?;
    let charset = &s[..first_q];
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return None;
    }

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let rest2 = &rest[second_q + 1..];
    let end = rest2.find("?=")?;
    let encoded_text = &rest2[..end];

    let consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(encoded_text).ok()?,
        "Q" => decode_q_encoding(encoded_text),
        _ => return None,
    };

    // RFC 2231 language suffix: "UTF-8*en"
    let charset = charset.split('*').next().unwrap_or(charset).to_string();

    Some(DecodedWord {
        charset,
        bytes,
        consumed,
    })
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                match hex_pair(bytes.get(i + 1..i + 3)) {
                    Some(byte) => {
                        result.push(byte);
                        i += 3;
                    }
                    None => {
                        result.push(b'=');
                        i += 1;
                    }
                }
            }
            b => {
                result.push(b);
                i += 1;
            }
        }
    }
    result
}

/// Parse two ASCII hex digits into a byte.
pub(crate) fn hex_pair(pair: Option<&[u8]>) -> Option<u8> {
    let pair = pair?;
    if pair.len() != 2 || !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok()
}

/// Decode bytes using a named charset.
pub(crate) fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    let charset_lower = charset.trim().to_ascii_lowercase();
    match charset_lower.as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        _ => {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.trim().as_bytes()) {
                let (decoded, _, _) = encoding.decode(bytes);
                decoded.into_owned()
            } else {
                warn!(
                    charset = charset,
                    "Unknown charset, falling back to UTF-8 lossy"
                );
                String::from_utf8_lossy(bytes).into_owned()
            }
        }
    }
}

/// Parse the `Date:` header of a letter.
///
/// Best effort: RFC 2822, RFC 3339, a few broken real-world variants, and
/// finally `mail-parser`'s lenient parser. Returns `None` when all fail.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    // Drop a trailing comment such as "(UTC)" and retry
    if let Some(open) = trimmed.rfind(" (") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed[..open].trim()) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let formats = ["%Y-%m-%d %H:%M:%S %z", "%d %b %Y %H:%M:%S %z"];
    for fmt in &formats {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }

    if let Some(dt) = mail_parser_date(trimmed) {
        return Some(dt);
    }

    warn!(date = trimmed, "Could not parse date");
    None
}

/// Attempt to parse a date using `mail-parser`'s built-in parser.
fn mail_parser_date(input: &str) -> Option<DateTime<Utc>> {
    use mail_parser::MessageParser;

    // Wrap input in a minimal RFC 5322 message so mail-parser can parse it
    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let dt = parsed.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&dt)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_header_none_passthrough() {
        assert_eq!(decode_header(None), None);
    }

    #[test]
    fn test_decode_header_plain() {
        assert_eq!(decode_header(Some("Hello world")).as_deref(), Some("Hello world"));
        assert_eq!(decode_header(Some("")).as_deref(), Some(""));
    }

    #[test]
    fn test_decode_header_base64_utf8() {
        // "Привет"
        let input = "=?UTF-8?B?0J/RgNC40LLQtdGC?=";
        assert_eq!(decode_header(Some(input)).as_deref(), Some("Привет"));
    }

    #[test]
    fn test_decode_header_keeps_first_segment_only() {
        let input = "=?UTF-8?B?SG9sYQ==?= tail text";
        assert_eq!(decode_header(Some(input)).as_deref(), Some("Hola"));

        let input = "=?UTF-8?B?SG9sYQ==?= =?ISO-8859-1?Q?caf=E9?=";
        assert_eq!(decode_header(Some(input)).as_deref(), Some("Hola"));
    }

    #[test]
    fn test_decode_header_merges_same_charset_words() {
        let input = "=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?=";
        assert_eq!(decode_header(Some(input)).as_deref(), Some("Hola mundo"));
    }

    #[test]
    fn test_decode_base64_encoded_word() {
        let input = "=?UTF-8?B?SG9sYSBtdW5kbw==?=";
        assert_eq!(decode_encoded_words(input), "Hola mundo");
    }

    #[test]
    fn test_decode_q_encoded_word() {
        let input = "=?ISO-8859-1?Q?R=E9sum=E9_du_projet?=";
        assert_eq!(decode_encoded_words(input), "Résumé du projet");
    }

    #[test]
    fn test_decode_mixed_plain_and_encoded() {
        let input = "Re: =?UTF-8?B?SG9sYQ==?= there";
        assert_eq!(decode_encoded_words(input), "Re: Hola there");
    }

    #[test]
    fn test_decode_invalid_word_is_preserved() {
        let input = "price =?bogus";
        assert_eq!(decode_encoded_words(input), "price =?bogus");
    }

    #[test]
    fn test_decode_windows1252_encoded_word() {
        let input = "=?Windows-1252?Q?M=FCller?=";
        assert_eq!(decode_encoded_words(input), "Müller");
    }

    #[test]
    fn test_decode_text_bytes_latin1_fallback() {
        assert_eq!(decode_text_bytes(b"caf\xe9"), "café");
        assert_eq!(decode_text_bytes("café".as_bytes()), "café");
    }

    #[test]
    fn test_parse_date_rfc2822() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000").expect("date");
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-04");
    }

    #[test]
    fn test_parse_date_with_comment() {
        let dt = parse_date("Thu, 04 Jan 2024 10:00:00 +0000 (UTC)").expect("date");
        assert_eq!(dt.format("%H:%M").to_string(), "10:00");
    }

    #[test]
    fn test_parse_date_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("   ").is_none());
    }
}
