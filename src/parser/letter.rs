//! Building a [`Letter`] from raw message bytes.

use tracing::warn;

use crate::model::address::EmailAddress;
use crate::model::letter::{Letter, RawMessage};
use crate::parser::body::extract;
use crate::parser::header::{decode_encoded_words, decode_header, parse_date};
use crate::parser::mime::ParsedMessage;
use crate::parser::payload::DecodeOptions;

/// Parse a fetched message into a [`Letter`].
///
/// The sender is the `Return-Path` address, or the `From` address when the
/// server did not add one. Date parsing is best effort. Bytes without any
/// header yield a letter with only the UID set.
pub fn build_letter(raw: &RawMessage, options: DecodeOptions) -> Letter {
    let Some(message) = ParsedMessage::parse(&raw.bytes) else {
        warn!(uid = %raw.uid, size = raw.bytes.len(), "Message has no headers");
        return Letter {
            uid: raw.uid.clone(),
            date: None,
            from: None,
            subject: None,
            text: None,
            attachments: Vec::new(),
        };
    };
    let body = extract(&message, options);

    let from = ["return-path", "from"]
        .iter()
        .filter_map(|name| message.header(name))
        .find_map(|value| EmailAddress::parse(&decode_encoded_words(&value)))
        .map(|addr| addr.address);

    Letter {
        uid: raw.uid.clone(),
        date: message.header("date").as_deref().and_then(parse_date),
        from,
        subject: decode_header(message.header("subject").as_deref()),
        text: body.text,
        attachments: body.attachments,
    }
}
