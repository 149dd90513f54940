//! Session Messages
//!
//! Messages sent from the Conductor to the UI surface. The surface never reads
//! session state directly; it renders the latest [`SessionSnapshot`] and
//! performs the few side effects the Conductor asks for (clear a file input,
//! copy text, save a file).
//!
//! # Design Philosophy
//!
//! A snapshot is complete, not a diff. Every transition publishes a fresh one,
//! so a surface that renders each snapshot as it arrives can never show a
//! half-applied state (a reset is one snapshot, not a sequence of clears).

use serde::{Deserialize, Serialize};

use crate::activity::{ActionKind, ActivityState};
use crate::session::{ConversationTurn, ReplySettings, SessionState, Slot};

/// File name used for reply downloads
pub const DOWNLOAD_FILE_NAME: &str = "generated_reply.txt";

/// Messages from Conductor to UI surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionMessage {
    /// Render this state
    Snapshot(Box<SessionSnapshot>),

    /// Clear the file input control for a slot
    ResetInput {
        /// Slot whose input should be emptied
        slot: Slot,
    },

    /// Put text on the clipboard
    CopyToClipboard {
        /// Text to copy
        text: String,
    },

    /// Save text as a file
    SaveFile {
        /// Suggested file name
        file_name: String,
        /// File contents
        contents: String,
    },
}

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new unique session ID
    ///
    /// Uses an atomic counter combined with timestamp to ensure uniqueness
    /// even when multiple sessions are created in the same millisecond.
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst);
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self(format!("session_{timestamp}_{count}"))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a surface shows for an occupied slot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: usize,
    /// MIME type
    pub mime_type: String,
}

/// Which controls are usable right now
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    /// Generate button
    pub generate: bool,
    /// Summarize button
    pub summarize: bool,
    /// Send follow-up button
    pub followup: bool,
    /// Copy button
    pub copy: bool,
    /// Download button
    pub download: bool,
}

impl Controls {
    /// Derive control enablement from session state
    #[must_use]
    pub fn derive(state: &SessionState) -> Self {
        let activity = state.activity();
        let any_file = state.has_any_upload();
        let has_reply = state.active_reply().is_some();
        Self {
            generate: any_file && !activity.is_in_flight(ActionKind::Generate),
            summarize: any_file && !activity.is_in_flight(ActionKind::Summarize),
            followup: has_reply && !activity.is_in_flight(ActionKind::Followup),
            copy: has_reply,
            download: has_reply,
        }
    }
}

/// Complete renderable state of a session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session this snapshot belongs to
    pub session_id: SessionId,
    /// Reset generation
    pub epoch: u64,
    /// PDF slot
    pub pdf: Option<FileSummary>,
    /// Email slot
    pub email: Option<FileSummary>,
    /// PDF preview text
    pub pdf_preview: Option<String>,
    /// Email preview text
    pub email_preview: Option<String>,
    /// Rendered summary report
    pub summary: Option<String>,
    /// Tone and strategy
    pub settings: ReplySettings,
    /// Current reply
    pub active_reply: Option<String>,
    /// Follow-up turns, oldest first
    pub history: Vec<ConversationTurn>,
    /// Follow-up prompt input
    pub followup_prompt: String,
    /// Transient feedback line
    pub feedback: Option<String>,
    /// Actions currently in flight
    pub busy: Vec<ActionKind>,
    /// Control enablement
    pub controls: Controls,
}

impl SessionSnapshot {
    /// Capture the current state
    #[must_use]
    pub fn capture(session_id: &SessionId, state: &SessionState) -> Self {
        let file = |slot: Slot| {
            state.upload(slot).map(|f| FileSummary {
                name: f.name.clone(),
                size: f.size(),
                mime_type: f.mime_type.clone(),
            })
        };

        Self {
            session_id: session_id.clone(),
            epoch: state.epoch(),
            pdf: file(Slot::Pdf),
            email: file(Slot::Email),
            pdf_preview: state.preview(Slot::Pdf).map(str::to_string),
            email_preview: state.preview(Slot::Email).map(str::to_string),
            summary: state.summary().map(|s| s.render()),
            settings: state.settings(),
            active_reply: state.active_reply().map(str::to_string),
            history: state.history().turns().to_vec(),
            followup_prompt: state.followup_prompt().to_string(),
            feedback: state.feedback().text().map(str::to_string),
            busy: state
                .activity()
                .iter()
                .filter(|(_, s)| *s == ActivityState::InFlight)
                .map(|(k, _)| k)
                .collect(),
            controls: Controls::derive(state),
        }
    }

    /// File summary for a slot
    #[must_use]
    pub fn file(&self, slot: Slot) -> Option<&FileSummary> {
        match slot {
            Slot::Pdf => self.pdf.as_ref(),
            Slot::Email => self.email.as_ref(),
        }
    }

    /// Preview text for a slot
    #[must_use]
    pub fn preview(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::Pdf => self.pdf_preview.as_deref(),
            Slot::Email => self.email_preview.as_deref(),
        }
    }

    /// Whether an action is in flight
    #[must_use]
    pub fn is_busy(&self, kind: ActionKind) -> bool {
        self.busy.contains(&kind)
    }
}
