//! The poll/reply loop.
//!
//! One cycle connects to the mailbox, fetches every unseen letter and answers
//! each sender with the fixed reply. A failed cycle is logged, optionally
//! reported through a [`Notifier`], and retried after the usual pause. The
//! loop never ends on its own.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::mailbox::{collect_unseen, MailboxConnector, MailboxSession};
use crate::model::letter::FetchedLetter;
use crate::notify::{failure_text, Notifier};
use crate::parser::payload::DecodeOptions;
use crate::postman::{compose_reply, ReplyTransport};

/// Pause between cycles.
pub trait Sleep {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Sleep for ThreadSleep {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Counters for one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unseen letters found at the start of the cycle.
    pub letters: usize,
    /// Replies delivered.
    pub replied: usize,
    /// Letters without a usable sender (stubs included).
    pub skipped: usize,
}

/// Everything the loop needs, injected by the caller.
pub struct MailBot<C, T, N, S> {
    connector: C,
    transport: T,
    notifier: Option<N>,
    sleeper: S,
    pause: Duration,
    sender: String,
    options: DecodeOptions,
}

impl<C, T, N, S> MailBot<C, T, N, S>
where
    C: MailboxConnector,
    T: ReplyTransport,
    N: Notifier,
    S: Sleep,
{
    /// `sender` is the reply `From` address; `notifier` is `None` when
    /// notifications are disabled.
    pub fn new(
        connector: C,
        transport: T,
        notifier: Option<N>,
        sleeper: S,
        pause: Duration,
        sender: impl Into<String>,
        options: DecodeOptions,
    ) -> Self {
        Self {
            connector,
            transport,
            notifier,
            sleeper,
            pause,
            sender: sender.into(),
            options,
        }
    }

    /// Process every letter that is unseen right now.
    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        let mut session = self.connector.connect()?;
        let letters = collect_unseen(&mut session, self.options);
        session.close();
        let letters = letters?;

        let mut report = CycleReport {
            letters: letters.len(),
            ..CycleReport::default()
        };

        for fetched in &letters {
            let letter = match fetched {
                FetchedLetter::Full(letter) => letter,
                FetchedLetter::Stub { uid } => {
                    warn!(uid = %uid, "Skipping letter that could not be fetched");
                    report.skipped += 1;
                    continue;
                }
            };

            info!(
                uid = %letter.uid,
                date = ?letter.date,
                from = letter.from.as_deref().unwrap_or("-"),
                subject = letter.subject.as_deref().unwrap_or("-"),
                text_len = letter.text.as_ref().map_or(0, String::len),
                attachments = ?letter.attachments.iter().map(|a| a.display_name()).collect::<Vec<_>>(),
                "Unread letter"
            );

            let Some(recipient) = letter.from.as_deref() else {
                warn!(uid = %letter.uid, "Letter has no sender address, not replying");
                report.skipped += 1;
                continue;
            };

            debug!(uid = %letter.uid, "Composing reply");
            let reply = compose_reply(&self.sender).addressed_to(recipient);

            debug!(uid = %letter.uid, to = recipient, "Sending reply");
            self.transport.send(&reply)?;
            report.replied += 1;
        }

        Ok(report)
    }

    /// One loop iteration: run a cycle, report a failure, then sleep.
    ///
    /// Returns the cycle outcome for callers that want to inspect it.
    pub fn tick(&mut self) -> Result<CycleReport> {
        debug!("Mail check started");
        let outcome = self.run_cycle();

        match &outcome {
            Ok(report) => debug!(
                letters = report.letters,
                replied = report.replied,
                skipped = report.skipped,
                "Mail check finished"
            ),
            Err(e) => {
                error!(error = ?e, transport = e.is_transport(), "Mail check failed");
                if let Some(notifier) = &self.notifier {
                    if let Err(notify_err) = notifier.notify(&failure_text(e)) {
                        error!(error = %notify_err, "Failure notification failed");
                    }
                }
            }
        }

        debug!(pause_sec = self.pause.as_secs(), "Going to sleep");
        self.sleeper.sleep(self.pause);
        outcome
    }

    /// Poll forever.
    pub fn run(&mut self) -> ! {
        loop {
            // Failures are already logged and reported by `tick`
            self.tick().ok();
        }
    }
}
