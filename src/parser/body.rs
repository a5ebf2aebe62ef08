//! Body text and attachment extraction over a parsed MIME tree.

use tracing::warn;

use crate::error::Result;
use crate::model::attachment::AttachmentRef;
use crate::parser::html::normalize_html;
use crate::parser::mime::{MimePart, ParsedMessage};
use crate::parser::payload::{decode_payload, DecodeOptions};

/// What a letter says, reduced to one text plus the attachment names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedBody {
    /// Text of the last usable text part visited; `None` if there was none.
    pub text: Option<String>,
    /// One entry per `attachment` part, in walk order.
    pub attachments: Vec<AttachmentRef>,
}

/// Walk every part of `message` (pre-order, root included) and extract the
/// body text and the attachment list.
///
/// Attachment parts are only listed. Every other `text/*` part is decoded
/// (HTML through [`normalize_html`]) and replaces the current text candidate,
/// so with `multipart/alternative` the HTML version usually wins. A part that
/// fails to decode is logged and replaces the candidate with "no text"; the
/// walk continues.
pub fn extract(message: &ParsedMessage, options: DecodeOptions) -> ExtractedBody {
    let mut body = ExtractedBody::default();

    for (index, part) in message.walk().enumerate() {
        if part.is_attachment() {
            body.attachments
                .push(AttachmentRef::new(part.filename().map(str::to_string)));
            continue;
        }
        if !part.is_text() {
            continue;
        }
        match part_text(&part, options) {
            Ok(Some(text)) => body.text = Some(clean_text(&text)),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    part = index,
                    content_type = %part.mime_type(),
                    error = %e,
                    "Text part could not be extracted"
                );
                body.text = None;
            }
        }
    }

    body
}

/// Decoded text of one `text/*` leaf; `None` for a container.
fn part_text(part: &MimePart<'_>, options: DecodeOptions) -> Result<Option<String>> {
    let Some(payload) = part.payload() else {
        return Ok(None);
    };
    let decoded = decode_payload(
        &payload,
        part.transfer_encoding(),
        part.charset(),
        options,
    )?;
    if part.is_html() {
        normalize_html(&decoded).map(Some)
    } else {
        Ok(Some(decoded))
    }
}

/// Remove angle brackets and turn non-breaking spaces into spaces.
fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|&c| c != '<' && c != '>')
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_raw(raw: &str) -> ExtractedBody {
        let message = ParsedMessage::parse(raw.as_bytes()).expect("parse");
        extract(&message, DecodeOptions::default())
    }

    #[test]
    fn test_plain_text_and_attachment() {
        let raw = "Content-Type: multipart/mixed; boundary=XX\n\n\
--XX\n\
Content-Type: text/plain\n\n\
Hello <friend>\u{a0}there\n\
--XX\n\
Content-Type: text/plain\n\
Content-Disposition: attachment; filename=notes.txt\n\n\
not the body\n\
--XX--\n";
        let body = extract_raw(raw);
        assert_eq!(body.text.as_deref(), Some("Hello friend there"));
        assert_eq!(body.attachments, vec![AttachmentRef::new(Some("notes.txt".into()))]);
    }

    #[test]
    fn test_last_text_part_wins() {
        let raw = "Content-Type: multipart/alternative; boundary=XX\n\n\
--XX\n\
Content-Type: text/plain\n\n\
plain version\n\
--XX\n\
Content-Type: text/html\n\n\
<div>html version</div>\n\
--XX--\n";
        assert_eq!(extract_raw(raw).text.as_deref(), Some("html version\n"));
    }

    #[test]
    fn test_failed_last_html_part_leaves_no_text() {
        let raw = "Content-Type: multipart/alternative; boundary=XX\n\n\
--XX\n\
Content-Type: text/plain\n\n\
plain version\n\
--XX\n\
Content-Type: text/html\n\n\
<div>broken <b\n\
--XX\n\
Content-Type: application/pdf\n\
Content-Disposition: attachment; filename=a.pdf\n\n\
JVBERi0=\n\
--XX--\n";
        let body = extract_raw(raw);
        assert_eq!(body.text, None);
        assert_eq!(body.attachments.len(), 1);
    }

    #[test]
    fn test_text_part_after_failed_html_is_used() {
        let raw = "Content-Type: multipart/mixed; boundary=XX\n\n\
--XX\n\
Content-Type: text/html\n\n\
<div>broken <b\n\
--XX\n\
Content-Type: text/plain\n\n\
trailing note\n\
--XX--\n";
        assert_eq!(extract_raw(raw).text.as_deref(), Some("trailing note"));
    }

    #[test]
    fn test_invalid_base64_leaves_no_text() {
        let raw = "Content-Type: multipart/alternative; boundary=XX\n\n\
--XX\n\
Content-Type: text/plain\n\n\
plain version\n\
--XX\n\
Content-Type: text/html\n\
Content-Transfer-Encoding: base64\n\n\
@@not base64@@\n\
--XX--\n";
        assert_eq!(extract_raw(raw).text, None);
    }

    #[test]
    fn test_no_text_part() {
        let raw = "Content-Type: application/octet-stream\n\nAAAA\n";
        let body = extract_raw(raw);
        assert_eq!(body.text, None);
        assert!(body.attachments.is_empty());
    }

    #[test]
    fn test_single_part_base64_html() {
        // "<div>Hi</div>"
        let raw = "Content-Type: text/html; charset=utf-8\n\
Content-Transfer-Encoding: base64\n\n\
PGRpdj5IaTwvZGl2Pg==\n";
        assert_eq!(extract_raw(raw).text.as_deref(), Some("Hi\n"));
    }

    #[test]
    fn test_attachment_without_filename() {
        let raw = "Content-Type: multipart/mixed; boundary=XX\n\n\
--XX\n\
Content-Type: image/png\n\
Content-Disposition: attachment\n\n\
iVBORw0=\n\
--XX--\n";
        let body = extract_raw(raw);
        assert_eq!(body.attachments, vec![AttachmentRef::new(None)]);
        assert_eq!(body.text, None);
    }
}
