//! Attachment references.
//!
//! Only the name of an attached file is kept. Its content is never decoded
//! or retained.

/// One MIME part whose disposition is `attachment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Declared filename, if the part carried one.
    pub filename: Option<String>,
}

impl AttachmentRef {
    /// Reference an attachment by its (optional) filename.
    pub fn new(filename: Option<String>) -> Self {
        Self { filename }
    }

    /// Filename for display, `"<unnamed>"` when the part had none.
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unnamed>")
    }
}
