//! Letters fetched from the mailbox.

use chrono::{DateTime, Utc};

use super::attachment::AttachmentRef;

/// Server-assigned message identifier, stable within a folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(String);

impl Uid {
    /// Wrap a UID as reported by the server.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// The UID as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for Uid {
    fn from(uid: u32) -> Self {
        Self(uid.to_string())
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw RFC 5322 bytes of one message, fetched fresh every cycle.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// UID the bytes were fetched for.
    pub uid: Uid,
    /// Full message, headers and body.
    pub bytes: Vec<u8>,
}

/// Caller-facing record of one unread letter.
#[derive(Debug, Clone)]
pub struct Letter {
    /// Server UID.
    pub uid: Uid,
    /// `Date:` header, when it could be parsed.
    pub date: Option<DateTime<Utc>>,
    /// Bare sender address (`Return-Path`, then `From`).
    pub from: Option<String>,
    /// Decoded subject.
    pub subject: Option<String>,
    /// Normalized body text; `None` when no usable text part exists.
    pub text: Option<String>,
    /// One entry per attachment part, in tree-walk order.
    pub attachments: Vec<AttachmentRef>,
}

/// Result of fetching one unseen UID.
///
/// The server may refuse a single fetch while the session stays usable.
/// Such letters are kept as a [`FetchedLetter::Stub`] carrying only the UID.
#[derive(Debug, Clone)]
pub enum FetchedLetter {
    /// The message was fetched and extracted.
    Full(Letter),
    /// The server answered the fetch with a non-OK status.
    Stub { uid: Uid },
}

impl FetchedLetter {
    /// UID of the letter, present in both variants.
    pub fn uid(&self) -> &Uid {
        match self {
            Self::Full(letter) => &letter.uid,
            Self::Stub { uid } => uid,
        }
    }

    /// The extracted letter, if the fetch succeeded.
    pub fn letter(&self) -> Option<&Letter> {
        match self {
            Self::Full(letter) => Some(letter),
            Self::Stub { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_from_u32() {
        assert_eq!(Uid::from(5).as_str(), "5");
        assert_eq!(Uid::new("5"), Uid::from(5));
    }

    #[test]
    fn test_stub_has_uid_only() {
        let stub = FetchedLetter::Stub { uid: Uid::new("7") };
        assert_eq!(stub.uid().as_str(), "7");
        assert!(stub.letter().is_none());
    }
}
