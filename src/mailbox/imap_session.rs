//! IMAP over TLS implementation of the mailbox traits.

use std::net::TcpStream;

use native_tls::{TlsConnector, TlsStream};
use tracing::debug;

use super::{FetchStatus, MailboxConnector, MailboxSession};
use crate::config::EmailConfig;
use crate::error::{MailbotError, Result};
use crate::model::letter::{RawMessage, Uid};

/// Connects to the configured IMAP server (implicit TLS) and logs in.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    host: String,
    port: u16,
    login: String,
    password: String,
    folder: String,
}

impl ImapConnector {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            host: config.imap_server.clone(),
            port: config.imap_port,
            login: config.login.clone(),
            password: config.password.clone(),
            folder: config.folder.clone(),
        }
    }

    fn connection_error(&self, reason: impl std::fmt::Display) -> MailbotError {
        MailbotError::Connection {
            server: self.host.clone(),
            reason: reason.to_string(),
        }
    }
}

impl MailboxConnector for ImapConnector {
    type Session = ImapSession;

    fn connect(&self) -> Result<ImapSession> {
        let tls = TlsConnector::builder()
            .build()
            .map_err(|e| self.connection_error(format!("TLS connector build failed: {e}")))?;

        let client = imap::connect((self.host.as_str(), self.port), self.host.as_str(), &tls)
            .map_err(|e| self.connection_error(e))?;

        let session = client
            .login(&self.login, &self.password)
            .map_err(|(e, _client)| MailbotError::Auth {
                server: self.host.clone(),
                reason: e.to_string(),
            })?;
        debug!(server = %self.host, "IMAP login succeeded");

        Ok(ImapSession {
            session,
            server: self.host.clone(),
            folder: self.folder.clone(),
        })
    }
}

/// A logged-in IMAP session bound to one folder.
pub struct ImapSession {
    session: imap::Session<TlsStream<TcpStream>>,
    server: String,
    folder: String,
}

impl ImapSession {
    fn connection_error(&self, reason: impl std::fmt::Display) -> MailbotError {
        MailbotError::Connection {
            server: self.server.clone(),
            reason: reason.to_string(),
        }
    }
}

impl MailboxSession for ImapSession {
    fn list_unseen(&mut self) -> Result<Vec<Uid>> {
        self.session
            .select(&self.folder)
            .map_err(|e| self.connection_error(format!("SELECT {} failed: {e}", self.folder)))?;

        let found = self
            .session
            .uid_search("UNSEEN")
            .map_err(|e| self.connection_error(format!("UID SEARCH failed: {e}")))?;

        let mut uids: Vec<u32> = found.into_iter().collect();
        uids.sort_unstable();
        Ok(uids.into_iter().map(Uid::from).collect())
    }

    fn fetch(&mut self, uid: &Uid) -> Result<FetchStatus> {
        // RFC822 (not BODY.PEEK) so the server flags the letter as seen
        let fetches = match self.session.uid_fetch(uid.as_str(), "RFC822") {
            Ok(fetches) => fetches,
            Err(imap::error::Error::No(reason)) | Err(imap::error::Error::Bad(reason)) => {
                debug!(uid = %uid, reason = %reason, "UID FETCH not OK");
                return Ok(FetchStatus::NotOk);
            }
            Err(e) => return Err(self.connection_error(format!("UID FETCH failed: {e}"))),
        };

        let body = fetches.iter().find_map(|fetch| fetch.body());
        Ok(match body {
            Some(bytes) => FetchStatus::Ok(RawMessage {
                uid: uid.clone(),
                bytes: bytes.to_vec(),
            }),
            None => FetchStatus::NotOk,
        })
    }

    fn close(mut self) {
        if let Err(e) = self.session.logout() {
            debug!(server = %self.server, error = %e, "IMAP logout failed");
        }
    }
}
