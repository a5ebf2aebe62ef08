//! Content-Transfer-Encoding handling for a single MIME part.
//!
//! `7bit`, `8bit`, `binary` and a missing header leave the payload untouched.
//! `base64` is decoded and interpreted with the part's charset.
//! `quoted-printable` passes through undecoded unless
//! [`DecodeOptions::quoted_printable`] is set. Unknown encodings pass through.

use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::{alphabet, Engine};

use crate::config::DecodingConfig;
use crate::error::{MailbotError, Result};
use crate::parser::header::{decode_charset, hex_pair};

/// Base64 engine accepting missing padding and stray trailing bits, as found in real mail.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Switches for payload decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Decode `quoted-printable` parts. Off by default: such parts are returned as-is.
    pub quoted_printable: bool,
}

impl From<&DecodingConfig> for DecodeOptions {
    fn from(config: &DecodingConfig) -> Self {
        Self {
            quoted_printable: config.quoted_printable,
        }
    }
}

/// Decode a part payload according to its declared transfer encoding.
///
/// `charset` is the `charset` parameter of the part's `Content-Type`; it is
/// only consulted when bytes are actually decoded.
pub fn decode_payload(
    payload: &str,
    transfer_encoding: Option<&str>,
    charset: Option<&str>,
    options: DecodeOptions,
) -> Result<String> {
    let encoding = transfer_encoding.map(|e| e.trim().to_ascii_lowercase());

    match encoding.as_deref() {
        None | Some("7bit") | Some("8bit") | Some("binary") => Ok(payload.to_string()),
        Some("base64") => {
            let bytes = decode_base64(payload).map_err(|e| {
                MailbotError::Extraction(format!("invalid base64 payload: {e}"))
            })?;
            Ok(bytes_to_text(&bytes, charset))
        }
        Some("quoted-printable") if options.quoted_printable => {
            Ok(bytes_to_text(&decode_quoted_printable(payload), charset))
        }
        Some(_) => Ok(payload.to_string()),
    }
}

/// Decode base64 text, ignoring embedded whitespace and line breaks.
pub fn decode_base64(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(compact)
}

/// Decode a quoted-printable body (RFC 2045 §6.7).
fn decode_quoted_printable(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'=' {
            result.push(bytes[i]);
            i += 1;
            continue;
        }
        // Soft line break
        if bytes[i + 1..].starts_with(b"\r\n") {
            i += 3;
        } else if bytes[i + 1..].starts_with(b"\n") {
            i += 2;
        } else if let Some(byte) = hex_pair(bytes.get(i + 1..i + 3)) {
            result.push(byte);
            i += 3;
        } else {
            result.push(b'=');
            i += 1;
        }
    }
    result
}

fn bytes_to_text(bytes: &[u8], charset: Option<&str>) -> String {
    match charset {
        Some(charset) => decode_charset(charset, bytes),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}
