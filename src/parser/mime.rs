//! MIME tree access on top of `mail-parser`.
//!
//! `mail-parser` decodes every body eagerly. Extraction needs the payload
//! exactly as transmitted, so leaves are read back from the raw message
//! using the part offsets and decoded later by [`crate::parser::payload`].

use mail_parser::{HeaderName, Message, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::parser::header::decode_text_bytes;

/// Maximum multipart nesting followed by [`ParsedMessage::walk`].
/// Containers at this depth are visited but not descended into.
const MAX_DEPTH: usize = 10;

/// A complete message. The root part carries the message headers.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    message: Message<'static>,
}

impl ParsedMessage {
    /// Parse raw RFC 5322 bytes. `None` when not even a header is found.
    pub fn parse(raw_message: &[u8]) -> Option<Self> {
        let message = MessageParser::default().parse(raw_message)?.into_owned();
        Some(Self { message })
    }

    /// Raw value of the first top-level header called `name`, unfolded but
    /// otherwise undecoded. Header names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<String> {
        let wanted = HeaderName::from(name);
        let header = self
            .message
            .root_part()
            .headers
            .iter()
            .find(|h| h.name == wanted)?;
        let bytes = self
            .message
            .raw_message
            .get(header.offset_start..header.offset_end)?;
        Some(unfold(&decode_text_bytes(bytes)))
    }

    /// The root part.
    pub fn root(&self) -> MimePart<'_> {
        MimePart {
            message: &self.message,
            part: self.message.root_part(),
            depth: 0,
        }
    }

    /// Pre-order, depth-first walk over all parts, root included.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![self.root()],
        }
    }
}

/// Join folded header lines with a single space.
fn unfold(value: &str) -> String {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One node of the MIME tree.
#[derive(Debug, Clone, Copy)]
pub struct MimePart<'a> {
    message: &'a Message<'static>,
    part: &'a MessagePart<'static>,
    depth: usize,
}

impl<'a> MimePart<'a> {
    /// `true` for `text/*`, and for parts without a `Content-Type`.
    pub fn is_text(&self) -> bool {
        let part: &'a MessagePart<'static> = self.part;
        part.content_type()
            .map_or(true, |ct| ct.ctype().eq_ignore_ascii_case("text"))
    }

    /// `true` for `text/html`.
    pub fn is_html(&self) -> bool {
        self.is_text() && self.part.is_content_type("text", "html")
    }

    /// `type/subtype` for logging.
    pub fn mime_type(&self) -> String {
        match self.part.content_type() {
            Some(ct) => match ct.subtype() {
                Some(sub) => format!("{}/{sub}", ct.ctype()),
                None => ct.ctype().to_string(),
            },
            None => "text/plain".to_string(),
        }
    }

    /// The `charset` parameter of `Content-Type`.
    pub fn charset(&self) -> Option<&'a str> {
        let part: &'a MessagePart<'static> = self.part;
        part.content_type().and_then(|ct| ct.attribute("charset"))
    }

    /// Declared `Content-Transfer-Encoding`.
    pub fn transfer_encoding(&self) -> Option<&'a str> {
        let part: &'a MessagePart<'static> = self.part;
        part.content_transfer_encoding()
    }

    /// Decoded filename from `Content-Disposition` or the `Content-Type` name.
    pub fn filename(&self) -> Option<&'a str> {
        let part: &'a MessagePart<'static> = self.part;
        part.attachment_name()
    }

    /// `true` if `Content-Disposition` is `attachment`.
    pub fn is_attachment(&self) -> bool {
        self.part
            .content_disposition()
            .is_some_and(|cd| cd.is_attachment())
    }

    /// Raw payload of a leaf, transfer encoding not applied. `None` for
    /// multipart containers and embedded messages.
    pub fn payload(&self) -> Option<String> {
        match self.part.body {
            PartType::Multipart(_) | PartType::Message(_) => None,
            _ => self
                .message
                .raw_message
                .get(self.part.raw_body_offset()..self.part.raw_end_offset())
                .map(decode_text_bytes),
        }
    }

    /// Child parts of a multipart container, in order. Empty for leaves and
    /// for containers nested [`MAX_DEPTH`] levels deep.
    pub fn children(&self) -> Vec<MimePart<'a>> {
        if self.depth >= MAX_DEPTH {
            return Vec::new();
        }
        let part: &'a MessagePart<'static> = self.part;
        let message: &'a Message<'static> = self.message;
        part.sub_parts()
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| message.parts.get(id))
            .map(|child| MimePart {
                message,
                part: child,
                depth: self.depth + 1,
            })
            .collect()
    }
}

/// Iterator returned by [`ParsedMessage::walk`].
pub struct Walk<'a> {
    stack: Vec<MimePart<'a>>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = MimePart<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.children().into_iter().rev());
        Some(part)
    }
}
