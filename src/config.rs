//! Application configuration.
//!
//! Configuration is loaded once at startup from a TOML file found at:
//! 1. `$MAILBOT_CONFIG` (environment variable)
//! 2. `./config.toml`
//! 3. `~/.config/mailbot/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailbot\config.toml` (Windows)
//!
//! The resulting [`Config`] is immutable and handed to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MailbotError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seconds to sleep between two poll cycles.
    #[serde(default = "default_pause_sec")]
    pub pause_sec: u64,
    /// Mailbox and outbound server settings.
    pub email: EmailConfig,
    /// Failure notifications.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Payload decoding switches.
    #[serde(default)]
    pub decoding: DecodingConfig,
}

/// Mailbox and outbound server settings. One login is shared by both servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// IMAP server host.
    pub imap_server: String,
    /// IMAP over TLS port.
    #[serde(default = "default_imap_port")]
    pub imap_port: u16,
    /// SMTP submission host.
    pub smtp_server: String,
    /// SMTP submission port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Account login, also used as the reply sender address.
    pub login: String,
    /// Account password.
    pub password: String,
    /// Folder polled for unseen letters.
    #[serde(default = "default_folder")]
    pub folder: String,
}

/// Telegram bot used to report failed cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Send a message for every failed cycle.
    pub notifications: bool,
    /// Bot token issued by BotFather.
    pub bot_token: String,
    /// Target chat identifier.
    pub chat_id: String,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory receiving one log file per process start.
    pub dir: PathBuf,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: String,
}

/// Payload decoding switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Decode `quoted-printable` parts instead of passing them through.
    pub quoted_printable: bool,
}

fn default_pause_sec() -> u64 {
    60
}

fn default_imap_port() -> u16 {
    993
}

fn default_smtp_port() -> u16 {
    587
}

fn default_folder() -> String {
    "Inbox".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "debug".to_string(),
        }
    }
}

impl Config {
    /// Interval between poll cycles.
    pub fn pause(&self) -> Duration {
        Duration::from_secs(self.pause_sec)
    }

    /// Parse and validate a TOML document. `path` is only used in errors.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| MailbotError::config(path, e))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let required = [
            ("email.imap_server", &self.email.imap_server),
            ("email.smtp_server", &self.email.smtp_server),
            ("email.login", &self.email.login),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(MailbotError::config(path, format!("'{key}' is empty")));
            }
        }
        if self.telegram.notifications
            && (self.telegram.bot_token.is_empty() || self.telegram.chat_id.is_empty())
        {
            return Err(MailbotError::config(
                path,
                "notifications are enabled but bot_token or chat_id is missing",
            ));
        }
        Ok(())
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from the first existing standard location.
pub fn load_config() -> Result<Config> {
    let path = config_file_path();
    load_config_from(&path)
}

/// Load configuration from an explicit file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| MailbotError::io(path, e))?;
    let config = Config::from_toml(&contents, path)?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Determine the config file path (checking env var first, then the working
/// directory, then the standard config directory).
pub fn config_file_path() -> PathBuf {
    if let Ok(env_path) = std::env::var("MAILBOT_CONFIG") {
        return PathBuf::from(env_path);
    }

    let local = PathBuf::from("config.toml");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|d| d.join("mailbot").join("config.toml"))
        .unwrap_or(local)
}

/// Name of the log file for a process started at `started`.
pub fn log_file_name(started: chrono::DateTime<chrono::Utc>) -> String {
    format!("log_{}", started.format("%Y-%m-%dT%H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MINIMAL: &str = r#"
[email]
imap_server = "imap.example.com"
smtp_server = "smtp.example.com"
login = "bot@example.com"
password = "secret"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = Config::from_toml(MINIMAL, Path::new("config.toml")).expect("parse");
        assert_eq!(cfg.pause_sec, 60);
        assert_eq!(cfg.email.imap_port, 993);
        assert_eq!(cfg.email.smtp_port, 587);
        assert_eq!(cfg.email.folder, "Inbox");
        assert!(!cfg.telegram.notifications);
        assert_eq!(cfg.logging.dir, PathBuf::from("logs"));
        assert!(!cfg.decoding.quoted_printable);
        assert_eq!(cfg.pause(), Duration::from_secs(60));
    }

    #[test]
    fn test_full_config() {
        let full = r#"
pause_sec = 5

[email]
imap_server = "imap.example.com"
imap_port = 1993
smtp_server = "smtp.example.com"
smtp_port = 2525
login = "bot@example.com"
password = "secret"
folder = "INBOX"

[telegram]
notifications = true
bot_token = "123:abc"
chat_id = "42"

[logging]
dir = "/var/log/mailbot"
level = "info"

[decoding]
quoted_printable = true
"#;
        let cfg = Config::from_toml(full, Path::new("config.toml")).expect("parse");
        assert_eq!(cfg.pause_sec, 5);
        assert_eq!(cfg.email.imap_port, 1993);
        assert_eq!(cfg.email.smtp_port, 2525);
        assert_eq!(cfg.email.folder, "INBOX");
        assert_eq!(cfg.telegram.chat_id, "42");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.decoding.quoted_printable);
    }

    #[test]
    fn test_example_config_parses() {
        let example = include_str!("../config.example.toml");
        let cfg = Config::from_toml(example, Path::new("config.example.toml")).expect("parse");
        assert_eq!(cfg.email.folder, "Inbox");
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn test_missing_required_key_is_error() {
        let broken = "[email]\nimap_server = \"imap.example.com\"\n";
        let err = Config::from_toml(broken, Path::new("config.toml")).unwrap_err();
        assert!(matches!(err, MailbotError::Config { .. }));
    }

    #[test]
    fn test_empty_login_is_error() {
        let cfg = MINIMAL.replace("bot@example.com", "");
        let err = Config::from_toml(&cfg, Path::new("config.toml")).unwrap_err();
        assert!(err.to_string().contains("email.login"));
    }

    #[test]
    fn test_notifications_require_token() {
        let cfg = format!("{MINIMAL}\n[telegram]\nnotifications = true\n");
        let err = Config::from_toml(&cfg, Path::new("config.toml")).unwrap_err();
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).expect("write");
        let cfg = load_config_from(&path).expect("load");
        assert_eq!(cfg.email.login, "bot@example.com");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, MailbotError::Io { .. }));
    }

    #[test]
    fn test_log_file_name() {
        let started = chrono::Utc.with_ymd_and_hms(2024, 1, 4, 10, 0, 0).unwrap();
        assert_eq!(log_file_name(started), "log_2024-01-04T10:00:00");
    }
}
