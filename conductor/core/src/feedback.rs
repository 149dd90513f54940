//! Transient Feedback
//!
//! A single self-expiring status line ("Copied to clipboard!", rate-limit
//! notices, validation errors). At most one message is live; a new one always
//! replaces the old one and re-arms the deadline.
//!
//! The notifier does not spawn timers. It exposes its [`deadline`] and the
//! owner waits on it (the [`Conductor`](crate::Conductor) selects on it next to
//! backend completions). Showing a message re-arms the timer and clearing
//! disarms it, so an expiry can never fire after a reset.
//!
//! [`deadline`]: FeedbackNotifier::deadline

use std::time::Duration;

use tokio::time::Instant;

/// How long a feedback message stays visible
pub const FEEDBACK_DURATION: Duration = Duration::from_secs(2);

/// A live feedback message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackMessage {
    /// Message text
    pub text: String,
    /// When the message disappears
    pub expires_at: Instant,
}

/// Owner of the single feedback slot
#[derive(Clone, Debug)]
pub struct FeedbackNotifier {
    duration: Duration,
    current: Option<FeedbackMessage>,
}

impl Default for FeedbackNotifier {
    fn default() -> Self {
        Self::new(FEEDBACK_DURATION)
    }
}

impl FeedbackNotifier {
    /// Create a notifier whose messages live for `duration`
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    /// Show `text` from `now`, replacing any current message
    pub fn show(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        tracing::debug!(feedback = %text, "Feedback shown");
        self.current = Some(FeedbackMessage {
            text,
            expires_at: now + self.duration,
        });
    }

    /// Current message, if any
    #[must_use]
    pub fn current(&self) -> Option<&FeedbackMessage> {
        self.current.as_ref()
    }

    /// Current message text, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|m| m.text.as_str())
    }

    /// When the current message expires
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|m| m.expires_at)
    }

    /// Clear the message if it has expired by `now`
    ///
    /// Returns true if a message was cleared.
    pub fn expire_due(&mut self, now: Instant) -> bool {
        match self.current {
            Some(ref msg) if msg.expires_at <= now => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the message and disarm the deadline
    pub fn clear(&mut self) {
        self.current = None;
    }
}
