//! Entry point: load the configuration, set up logging, poll forever.

use mailbot::bot::{MailBot, ThreadSleep};
use mailbot::config::{self, Config};
use mailbot::mailbox::ImapConnector;
use mailbot::notify::TelegramNotifier;
use mailbot::parser::payload::DecodeOptions;
use mailbot::postman::SmtpPostman;

fn main() -> anyhow::Result<()> {
    let config = config::load_config()?;
    setup_logging(&config);

    tracing::info!(
        imap = %config.email.imap_server,
        smtp = %config.email.smtp_server,
        folder = %config.email.folder,
        pause_sec = config.pause_sec,
        notifications = config.telegram.notifications,
        "mailbot started"
    );

    let notifier = config
        .telegram
        .notifications
        .then(|| TelegramNotifier::new(&config.telegram));

    let mut bot = MailBot::new(
        ImapConnector::new(&config.email),
        SmtpPostman::new(&config.email),
        notifier,
        ThreadSleep,
        config.pause(),
        config.email.login.clone(),
        DecodeOptions::from(&config.decoding),
    );
    bot.run()
}

/// Set up tracing with stdout output and one log file per process start.
fn setup_logging(config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let stdout_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    let log_dir = &config.logging.dir;
    if std::fs::create_dir_all(log_dir).is_ok() {
        let file_name = config::log_file_name(chrono::Utc::now());
        let file_appender = tracing_appender::rolling::never(log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stdout only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .init();
        tracing::warn!(dir = %log_dir.display(), "Could not create log directory");
    }
}
