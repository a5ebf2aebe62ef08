//! The fixed reply sent to every sender.

/// MIME subtype of one body alternative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlternativeKind {
    /// `text/plain`
    Plain,
    /// `text/html`
    Html,
}

/// One alternative rendering of the reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyAlternative {
    pub kind: AlternativeKind,
    pub body: String,
}

/// A `multipart/alternative` reply.
///
/// `alternatives` always holds plain text first and HTML second. Mail clients
/// prefer the last alternative they can render, so HTML wins where supported.
/// The recipient is only known at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedReply {
    pub subject: String,
    pub from: String,
    pub alternatives: [BodyAlternative; 2],
    pub to: Option<String>,
}

impl ComposedReply {
    /// Copy of this reply addressed to `recipient`.
    pub fn addressed_to(&self, recipient: &str) -> Self {
        Self {
            to: Some(recipient.to_string()),
            ..self.clone()
        }
    }
}
