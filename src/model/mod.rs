//! Core data model types for letters, addresses, attachments and replies.

pub mod address;
pub mod attachment;
pub mod letter;
pub mod reply;
