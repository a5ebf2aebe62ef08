//! `mailbot`: answers every unread letter in a mailbox with a fixed reply.
//!
//! The library covers MIME parsing and body extraction, IMAP retrieval, SMTP
//! delivery, failure notifications and the poll loop tying them together.

pub mod bot;
pub mod config;
pub mod error;
pub mod mailbox;
pub mod model;
pub mod notify;
pub mod parser;
pub mod postman;
