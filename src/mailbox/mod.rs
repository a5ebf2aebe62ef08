//! Mailbox access: unseen UIDs and raw message retrieval.
//!
//! [`MailboxConnector`] opens one authenticated session per poll cycle;
//! [`collect_unseen`] turns that session into [`FetchedLetter`]s.

pub mod imap_session;

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::letter::{FetchedLetter, RawMessage, Uid};
use crate::parser::letter::build_letter;
use crate::parser::payload::DecodeOptions;

pub use self::imap_session::{ImapConnector, ImapSession};

/// Outcome of fetching a single UID.
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// The server returned the message.
    Ok(RawMessage),
    /// The server answered with a non-OK status for this UID only.
    NotOk,
}

/// An authenticated mailbox session.
pub trait MailboxSession {
    /// UIDs of unseen messages in the polled folder, ascending.
    fn list_unseen(&mut self) -> Result<Vec<Uid>>;

    /// Full raw content of one message.
    fn fetch(&mut self, uid: &Uid) -> Result<FetchStatus>;

    /// End the session. Failures are ignored.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Opens mailbox sessions.
pub trait MailboxConnector {
    type Session: MailboxSession;

    /// Connect and authenticate.
    fn connect(&self) -> Result<Self::Session>;
}

/// Fetch and extract every unseen letter, in `list_unseen` order.
///
/// A UID the server refuses to deliver still yields a [`FetchedLetter::Stub`].
pub fn collect_unseen<S: MailboxSession>(
    session: &mut S,
    options: DecodeOptions,
) -> Result<Vec<FetchedLetter>> {
    let uids = session.list_unseen()?;
    debug!(count = uids.len(), "Unseen letters");

    let mut letters = Vec::with_capacity(uids.len());
    for uid in uids {
        match session.fetch(&uid)? {
            FetchStatus::Ok(raw) => letters.push(FetchedLetter::Full(build_letter(&raw, options))),
            FetchStatus::NotOk => {
                warn!(uid = %uid, "Server refused to fetch letter");
                letters.push(FetchedLetter::Stub { uid });
            }
        }
    }
    Ok(letters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::MailbotError;

    struct FakeSession {
        unseen: Vec<Uid>,
        messages: HashMap<Uid, Vec<u8>>,
        fail_fetch: bool,
    }

    impl MailboxSession for FakeSession {
        fn list_unseen(&mut self) -> Result<Vec<Uid>> {
            Ok(self.unseen.clone())
        }

        fn fetch(&mut self, uid: &Uid) -> Result<FetchStatus> {
            if self.fail_fetch {
                return Err(MailbotError::Connection {
                    server: "fake".into(),
                    reason: "connection lost".into(),
                });
            }
            Ok(match self.messages.get(uid) {
                Some(bytes) => FetchStatus::Ok(RawMessage {
                    uid: uid.clone(),
                    bytes: bytes.clone(),
                }),
                None => FetchStatus::NotOk,
            })
        }
    }

    #[test]
    fn test_collect_keeps_order_and_stubs() {
        let mut session = FakeSession {
            unseen: vec![Uid::new("3"), Uid::new("4")],
            messages: HashMap::from([(Uid::new("4"), b"Subject: Hi\n\nbody\n".to_vec())]),
            fail_fetch: false,
        };
        let letters = collect_unseen(&mut session, DecodeOptions::default()).unwrap();
        assert_eq!(letters.len(), 2);
        assert!(matches!(&letters[0], FetchedLetter::Stub { uid } if uid.as_str() == "3"));
        let full = letters[1].letter().expect("full letter");
        assert_eq!(full.subject.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_collect_propagates_connection_errors() {
        let mut session = FakeSession {
            unseen: vec![Uid::new("1")],
            messages: HashMap::new(),
            fail_fetch: true,
        };
        let err = collect_unseen(&mut session, DecodeOptions::default()).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_collect_empty_mailbox() {
        let mut session = FakeSession {
            unseen: Vec::new(),
            messages: HashMap::new(),
            fail_fetch: false,
        };
        assert!(collect_unseen(&mut session, DecodeOptions::default())
            .unwrap()
            .is_empty());
    }
}
