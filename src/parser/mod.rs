//! Email parsing: MIME tree, header decoding, payload decoding, HTML
//! normalization and body extraction.

pub mod body;
pub mod header;
pub mod html;
pub mod letter;
pub mod mime;
pub mod payload;
