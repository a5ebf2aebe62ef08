//! Failure notifications through a Telegram bot.

use tracing::debug;

use crate::config::TelegramConfig;
use crate::error::{MailbotError, Result};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Receives the description of a failed poll cycle.
pub trait Notifier {
    fn notify(&self, text: &str) -> Result<()>;
}

/// Text sent for an uncaught cycle failure.
pub fn failure_text(error: &MailbotError) -> String {
    format!("mailbot received a critical error:\n\n {error:?}")
}

/// Calls the Bot API `sendMessage` method with a plain GET.
///
/// The response is not inspected; only transport failures are reported.
pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// Endpoint URL (the token is part of the path).
    fn endpoint(&self) -> String {
        format!("{TELEGRAM_API}/bot{}/sendMessage", self.bot_token)
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, text: &str) -> Result<()> {
        self.client
            .get(self.endpoint())
            .query(&[("chat_id", self.chat_id.as_str()), ("text", text)])
            .send()
            .map_err(|e| MailbotError::Notify(e.without_url().to_string()))?;
        debug!(chat_id = %self.chat_id, "Failure notification sent");
        Ok(())
    }
}
