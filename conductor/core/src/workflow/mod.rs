//! Workflow Components
//!
//! The four backend-facing actions of a session. Each component has the same
//! three steps:
//!
//! 1. `begin` checks preconditions against [`SessionState`], marks the activity
//!    board, and captures a job (payloads plus a [`SourceStamp`])
//! 2. `run` performs the backend call(s) on a spawned task and turns the result
//!    into a [`Completion`]
//! 3. `apply` receives the completion back on the session thread and performs
//!    the state transition, unless the completion has gone stale
//!
//! Only steps 1 and 3 touch the session, and both run on the task that owns it.
//!
//! [`SessionState`]: crate::session::SessionState
//! [`SourceStamp`]: crate::session::SourceStamp

pub mod followup;
pub mod preview;
pub mod reply;
pub mod summarize;

use crate::backend::BackendError;
use crate::session::{Slot, SourceStamp, UploadId};

/// Feedback for a 429 from any endpoint
pub const RATE_LIMITED_FEEDBACK: &str = "⏱ Too many requests. Please wait and try again.";

/// Preview text written when extraction fails
pub const PREVIEW_FAILED: &str = "Failed to load preview.";

/// Summary report written when any summary request fails
pub const SUMMARY_FAILED: &str = "Failed to summarize uploaded content.";

/// Active reply written when generation fails for a reason other than 429
pub const GENERATE_FAILED: &str = "Error generating response.";

/// Feedback when generate is requested with no file
pub const NO_FILE_FEEDBACK: &str = "Please upload at least one file.";

/// Feedback for an empty follow-up prompt
pub const EMPTY_PROMPT_FEEDBACK: &str = "Please enter a follow-up prompt.";

/// Feedback for a follow-up with no reply to refine
pub const NO_REPLY_FEEDBACK: &str = "Generate a reply before asking a follow-up.";

/// Feedback when a follow-up fails for a reason other than 429
pub const FOLLOWUP_FAILED: &str = "Follow-up failed.";

/// Result of a backend job, delivered back to the session thread
#[derive(Debug)]
pub enum Completion {
    /// Text extraction finished
    Preview {
        /// Session epoch at issue time
        epoch: u64,
        /// Slot the file was in
        slot: Slot,
        /// Upload the text belongs to
        upload: UploadId,
        /// Extracted text or failure
        result: Result<String, BackendError>,
    },
    /// Both summary requests finished (absent slots are `None`)
    Summary {
        /// Sources at issue time
        stamp: SourceStamp,
        /// PDF summary, if a PDF was present
        pdf: Option<Result<String, BackendError>>,
        /// Email summary, if an email was present
        email: Option<Result<String, BackendError>>,
    },
    /// Reply generation finished
    Reply {
        /// Sources at issue time
        stamp: SourceStamp,
        /// Generated reply or failure
        result: Result<String, BackendError>,
    },
    /// Follow-up finished
    Followup {
        /// Sources at issue time
        stamp: SourceStamp,
        /// Prompt exactly as sent
        prompt: String,
        /// Revised reply or failure
        result: Result<String, BackendError>,
    },
    /// The feedback deadline passed
    FeedbackExpired,
}

impl Completion {
    /// Epoch the completion was issued in (`None` for timer events)
    #[must_use]
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Self::Preview { epoch, .. } => Some(*epoch),
            Self::Summary { stamp, .. }
            | Self::Reply { stamp, .. }
            | Self::Followup { stamp, .. } => Some(stamp.epoch),
            Self::FeedbackExpired => None,
        }
    }

    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Preview { .. } => "preview",
            Self::Summary { .. } => "summary",
            Self::Reply { .. } => "reply",
            Self::Followup { .. } => "followup",
            Self::FeedbackExpired => "feedback_expired",
        }
    }
}
