//! Reply composition and SMTP delivery.

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use crate::config::EmailConfig;
use crate::error::{MailbotError, Result};
use crate::model::reply::{AlternativeKind, BodyAlternative, ComposedReply};

/// Subject of every reply.
pub const REPLY_SUBJECT: &str = "Thank you for your letter";

const REPLY_TEXT: &str = "\
Hi,
How are you?
Your letter has been received. This is an automatic reply.";

const REPLY_HTML: &str = "\
<html>
<body>
    <p>Hi,<br>
    How are you?<br>
    Your letter has been received. This is an automatic reply.
    </p>
</body>
</html>
";

/// Build the fixed reply: plain text first, HTML second.
pub fn compose_reply(from: &str) -> ComposedReply {
    ComposedReply {
        subject: REPLY_SUBJECT.to_string(),
        from: from.to_string(),
        alternatives: [
            BodyAlternative {
                kind: AlternativeKind::Plain,
                body: REPLY_TEXT.to_string(),
            },
            BodyAlternative {
                kind: AlternativeKind::Html,
                body: REPLY_HTML.to_string(),
            },
        ],
        to: None,
    }
}

/// Delivers composed replies.
pub trait ReplyTransport {
    /// Send `reply` to its `to` address.
    fn send(&self, reply: &ComposedReply) -> Result<()>;
}

/// Convert an addressed reply into a `multipart/alternative` message.
pub fn build_message(reply: &ComposedReply) -> Result<Message> {
    let from: Mailbox = reply
        .from
        .parse()
        .map_err(|e| MailbotError::Send(format!("invalid sender '{}': {e}", reply.from)))?;
    let recipient = reply
        .to
        .as_deref()
        .ok_or_else(|| MailbotError::Send("reply has no recipient".to_string()))?;
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| MailbotError::Send(format!("invalid recipient '{recipient}': {e}")))?;

    let [first, second] = &reply.alternatives;
    let multipart = MultiPart::alternative()
        .singlepart(single_part(first))
        .singlepart(single_part(second));

    Message::builder()
        .from(from)
        .to(to)
        .subject(reply.subject.as_str())
        .multipart(multipart)
        .map_err(|e| MailbotError::Send(format!("failed to build message: {e}")))
}

fn single_part(alternative: &BodyAlternative) -> SinglePart {
    let content_type = match alternative.kind {
        AlternativeKind::Plain => ContentType::TEXT_PLAIN,
        AlternativeKind::Html => ContentType::TEXT_HTML,
    };
    SinglePart::builder()
        .header(content_type)
        .body(alternative.body.clone())
}

/// SMTP submission with STARTTLS and login. A new connection is opened for
/// every letter.
#[derive(Debug, Clone)]
pub struct SmtpPostman {
    host: String,
    port: u16,
    login: String,
    password: String,
}

impl SmtpPostman {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            host: config.smtp_server.clone(),
            port: config.smtp_port,
            login: config.login.clone(),
            password: config.password.clone(),
        }
    }
}

impl ReplyTransport for SmtpPostman {
    fn send(&self, reply: &ComposedReply) -> Result<()> {
        let message = build_message(reply)?;
        let recipient = reply.to.as_deref().unwrap_or_default();

        let transport = SmtpTransport::starttls_relay(&self.host)
            .map_err(|e| MailbotError::Connection {
                server: self.host.clone(),
                reason: e.to_string(),
            })?
            .port(self.port)
            .credentials(Credentials::new(self.login.clone(), self.password.clone()))
            .build();

        transport
            .send(&message)
            .map_err(|e| MailbotError::Send(format!("SMTP send to '{recipient}' failed: {e}")))?;
        debug!(server = %self.host, recipient, "Reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_reply_order() {
        let reply = compose_reply("bot@example.com");
        assert_eq!(reply.subject, REPLY_SUBJECT);
        assert_eq!(reply.from, "bot@example.com");
        assert_eq!(reply.alternatives[0].kind, AlternativeKind::Plain);
        assert_eq!(reply.alternatives[1].kind, AlternativeKind::Html);
        assert!(reply.alternatives[1].body.contains("<p>"));
        assert!(reply.to.is_none());
        assert_eq!(
            reply.addressed_to("a@example.com").to.as_deref(),
            Some("a@example.com")
        );
    }

    #[test]
    fn test_build_message_headers_and_parts() {
        let reply = compose_reply("bot@example.com").addressed_to("a@example.com");
        let message = build_message(&reply).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("To: a@example.com"));
        assert!(formatted.contains("From: bot@example.com"));
        assert!(formatted.contains("multipart/alternative"));
        let plain = formatted.find("text/plain").unwrap();
        let html = formatted.find("text/html").unwrap();
        assert!(plain < html);
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let reply = compose_reply("bot@example.com").addressed_to("not an address");
        let err = build_message(&reply).unwrap_err();
        assert!(matches!(err, MailbotError::Send(_)));
    }

    #[test]
    fn test_build_message_requires_recipient() {
        let err = build_message(&compose_reply("bot@example.com")).unwrap_err();
        assert!(err.to_string().contains("no recipient"));
    }
}
