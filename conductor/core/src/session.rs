//! Session State
//!
//! The single mutable record of a document-assistance session: the two upload
//! slots, their previews, the summary report, reply settings, the active reply
//! and the follow-up conversation history, plus the activity board and the
//! transient feedback line.
//!
//! # Design Philosophy
//!
//! `SessionState` is owned by exactly one [`Conductor`](crate::Conductor) and is
//! only changed through the transition methods below. Workflow components never
//! poke at fields directly, so every invariant lives in one place:
//!
//! - replacing or removing an upload clears that slot's preview and, session-wide,
//!   the summary, the active reply and the conversation history
//! - history is append-only and is cleared only by a source change or full reset
//! - a full reset starts a new epoch so late completions can be recognised

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::activity::{ActionKind, ActivityBoard, ActivityError};
use crate::backend::FailureKind;
use crate::feedback::FeedbackNotifier;

// =============================================================================
// Slots and uploads
// =============================================================================

/// One of the two fixed upload positions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// PDF attachment
    Pdf,
    /// Email thread (plain text or RFC 822)
    Email,
}

impl Slot {
    /// Both slots, PDF first
    pub const ALL: [Slot; 2] = [Slot::Pdf, Slot::Email];

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Email => "Email",
        }
    }

    /// Multipart field name used by the generation and summary endpoints
    #[must_use]
    pub fn form_field(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_field())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "email" | "eml" | "mail" => Ok(Self::Email),
            other => Err(format!("unknown slot: {other}")),
        }
    }
}

/// Identity of one accepted upload
///
/// A re-upload of the very same file still gets a fresh id; completions
/// compare ids, not contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(pub Uuid);

impl UploadId {
    /// Generate a new upload id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upload_{}", self.0.simple())
    }
}

/// A validated file sitting in one slot
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// Upload identity
    pub id: UploadId,
    /// Slot the file was accepted into
    pub slot: Slot,
    /// Original file name
    pub name: String,
    /// Raw bytes (shared with in-flight requests)
    pub content: Arc<[u8]>,
    /// MIME type as reported by the selection
    pub mime_type: String,
}

impl UploadedFile {
    /// Size of the content in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// A value kept once per slot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerSlot<T> {
    /// Value for the PDF slot
    pub pdf: T,
    /// Value for the Email slot
    pub email: T,
}

impl<T> PerSlot<T> {
    /// Borrow the value for a slot
    pub fn get(&self, slot: Slot) -> &T {
        match slot {
            Slot::Pdf => &self.pdf,
            Slot::Email => &self.email,
        }
    }

    /// Mutably borrow the value for a slot
    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        match slot {
            Slot::Pdf => &mut self.pdf,
            Slot::Email => &mut self.email,
        }
    }
}

// =============================================================================
// Summary report
// =============================================================================

/// Delimiter placed between the PDF and Email summary sections
pub const SUMMARY_DELIMITER: &str = "\n------------------------------\n";

/// Report text when summarize runs with no file present
pub const NO_FILE_SUMMARY: &str = "No file uploaded.";

/// One labelled section of a summary report
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    /// Slot the summary was produced from
    pub slot: Slot,
    /// Section heading
    pub label: String,
    /// Summary text from the backend
    pub text: String,
}

impl SummarySection {
    /// Section for a slot, with the slot's fixed heading
    #[must_use]
    pub fn for_slot(slot: Slot, text: impl Into<String>) -> Self {
        let label = match slot {
            Slot::Pdf => "📄 PDF Summary:",
            Slot::Email => "✉️ Email Summary:",
        };
        Self {
            slot,
            label: label.to_string(),
            text: text.into(),
        }
    }
}

/// The summary panel: either assembled sections or a single message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryReport {
    /// Ordered sections, PDF before Email
    Sections(Vec<SummarySection>),
    /// A single status line (failure or nothing to summarize)
    Notice(String),
}

impl SummaryReport {
    /// Assemble a report from per-slot summaries
    ///
    /// Order is always PDF then Email, whatever order the requests finished in.
    #[must_use]
    pub fn assemble(pdf: Option<String>, email: Option<String>) -> Self {
        let sections: Vec<SummarySection> = [(Slot::Pdf, pdf), (Slot::Email, email)]
            .into_iter()
            .filter_map(|(slot, text)| text.map(|t| SummarySection::for_slot(slot, t)))
            .collect();

        if sections.is_empty() {
            Self::Notice(NO_FILE_SUMMARY.to_string())
        } else {
            Self::Sections(sections)
        }
    }

    /// A report carrying a single message
    #[must_use]
    pub fn notice(text: impl Into<String>) -> Self {
        Self::Notice(text.into())
    }

    /// Render the report as displayed text
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Notice(text) => text.clone(),
            Self::Sections(sections) => {
                let mut out = String::new();
                for (i, section) in sections.iter().enumerate() {
                    if i > 0 {
                        out.push_str(SUMMARY_DELIMITER);
                    }
                    out.push_str(&section.label);
                    out.push('\n');
                    out.push_str(&section.text);
                    // The PDF section carries a trailing newline of its own
                    if section.slot == Slot::Pdf {
                        out.push('\n');
                    }
                }
                out
            }
        }
    }
}

// =============================================================================
// Reply settings
// =============================================================================

/// Tone of the generated reply, sent verbatim to the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    /// Professional
    #[default]
    Professional,
    /// Friendly
    Friendly,
    /// Assertive
    Assertive,
    /// Kind
    Kind,
    /// Enthusiastic
    Enthusiastic,
}

impl Tone {
    /// Every tone in display order
    pub const ALL: [Tone; 5] = [
        Tone::Professional,
        Tone::Friendly,
        Tone::Assertive,
        Tone::Kind,
        Tone::Enthusiastic,
    ];

    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Professional => "Professional",
            Self::Friendly => "Friendly",
            Self::Assertive => "Assertive",
            Self::Kind => "Kind",
            Self::Enthusiastic => "Enthusiastic",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown tone: {wanted}"))
    }
}

/// Reply strategy, sent verbatim to the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Standard
    #[default]
    Standard,
    /// Concise reply
    #[serde(rename = "Concise reply")]
    Concise,
    /// Elaborate reply
    #[serde(rename = "Elaborate reply")]
    Elaborate,
}

impl Strategy {
    /// Every strategy in display order
    pub const ALL: [Strategy; 3] = [Strategy::Standard, Strategy::Concise, Strategy::Elaborate];

    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Concise => "Concise reply",
            Self::Elaborate => "Elaborate reply",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    /// Accepts the wire value or its first word ("concise", "elaborate")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|st| {
                let name = st.as_str();
                name.eq_ignore_ascii_case(wanted)
                    || name
                        .split_whitespace()
                        .next()
                        .is_some_and(|first| first.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| format!("unknown strategy: {wanted}"))
    }
}

/// Generation parameters chosen by the user
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySettings {
    /// Reply tone
    pub tone: Tone,
    /// Reply strategy
    pub strategy: Strategy,
}

// =============================================================================
// Conversation history
// =============================================================================

/// One follow-up exchange; immutable once created
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    user_prompt: String,
    bot_reply: String,
}

impl ConversationTurn {
    /// Create a turn
    pub fn new(user_prompt: impl Into<String>, bot_reply: impl Into<String>) -> Self {
        Self {
            user_prompt: user_prompt.into(),
            bot_reply: bot_reply.into(),
        }
    }

    /// What the user asked for
    #[must_use]
    pub fn user_prompt(&self) -> &str {
        &self.user_prompt
    }

    /// The revised reply the backend returned
    #[must_use]
    pub fn bot_reply(&self) -> &str {
        &self.bot_reply
    }
}

/// Chronological, append-only list of follow-up turns
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    /// All turns, oldest first
    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether there are no turns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    fn clear(&mut self) {
        self.turns.clear();
    }
}

// =============================================================================
// Source stamp
// =============================================================================

/// Which sources a request was issued against
///
/// Captured when a request leaves and compared when its completion arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceStamp {
    /// Session epoch (bumped by full reset)
    pub epoch: u64,
    /// Upload in the PDF slot at issue time
    pub pdf: Option<UploadId>,
    /// Upload in the Email slot at issue time
    pub email: Option<UploadId>,
}

impl SourceStamp {
    /// Upload id recorded for a slot
    #[must_use]
    pub fn upload(&self, slot: Slot) -> Option<UploadId> {
        match slot {
            Slot::Pdf => self.pdf,
            Slot::Email => self.email,
        }
    }
}

// =============================================================================
// Session state
// =============================================================================

/// The shared session record
#[derive(Debug)]
pub struct SessionState {
    epoch: u64,
    uploads: PerSlot<Option<UploadedFile>>,
    previews: PerSlot<Option<String>>,
    summary: Option<SummaryReport>,
    settings: ReplySettings,
    active_reply: Option<String>,
    history: ConversationHistory,
    followup_prompt: String,
    activity: ActivityBoard,
    feedback: FeedbackNotifier,
}

impl SessionState {
    /// Create an empty session whose feedback messages live for `feedback_duration`
    #[must_use]
    pub fn new(feedback_duration: std::time::Duration) -> Self {
        Self {
            epoch: 0,
            uploads: PerSlot::default(),
            previews: PerSlot::default(),
            summary: None,
            settings: ReplySettings::default(),
            active_reply: None,
            history: ConversationHistory::default(),
            followup_prompt: String::new(),
            activity: ActivityBoard::default(),
            feedback: FeedbackNotifier::new(feedback_duration),
        }
    }

    // --- Reads ---------------------------------------------------------------

    /// Current epoch
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// File in a slot
    #[must_use]
    pub fn upload(&self, slot: Slot) -> Option<&UploadedFile> {
        self.uploads.get(slot).as_ref()
    }

    /// Whether at least one slot holds a file
    #[must_use]
    pub fn has_any_upload(&self) -> bool {
        self.uploads.pdf.is_some() || self.uploads.email.is_some()
    }

    /// Preview text for a slot
    #[must_use]
    pub fn preview(&self, slot: Slot) -> Option<&str> {
        self.previews.get(slot).as_deref()
    }

    /// Current summary report
    #[must_use]
    pub fn summary(&self) -> Option<&SummaryReport> {
        self.summary.as_ref()
    }

    /// Current reply settings
    #[must_use]
    pub fn settings(&self) -> ReplySettings {
        self.settings
    }

    /// Most recent reply
    #[must_use]
    pub fn active_reply(&self) -> Option<&str> {
        self.active_reply.as_deref()
    }

    /// Follow-up history
    #[must_use]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Contents of the follow-up prompt input
    #[must_use]
    pub fn followup_prompt(&self) -> &str {
        &self.followup_prompt
    }

    /// Activity board
    #[must_use]
    pub fn activity(&self) -> &ActivityBoard {
        &self.activity
    }

    /// Feedback notifier
    #[must_use]
    pub fn feedback(&self) -> &FeedbackNotifier {
        &self.feedback
    }

    /// Stamp of the current sources
    #[must_use]
    pub fn stamp(&self) -> SourceStamp {
        SourceStamp {
            epoch: self.epoch,
            pdf: self.uploads.pdf.as_ref().map(|f| f.id),
            email: self.uploads.email.as_ref().map(|f| f.id),
        }
    }

    /// Whether the sources recorded in `stamp` are still the current ones
    #[must_use]
    pub fn is_current(&self, stamp: &SourceStamp) -> bool {
        self.stamp() == *stamp
    }

    // --- Transitions ---------------------------------------------------------

    /// Put a validated file into its slot
    ///
    /// Returns the file it replaced, if any.
    pub fn accept_upload(&mut self, file: UploadedFile) -> Option<UploadedFile> {
        let slot = file.slot;
        *self.previews.get_mut(slot) = None;
        self.invalidate_derived();
        self.uploads.get_mut(slot).replace(file)
    }

    /// Clear a slot and its preview
    ///
    /// Returns the removed file, if there was one.
    pub fn remove_upload(&mut self, slot: Slot) -> Option<UploadedFile> {
        let removed = self.uploads.get_mut(slot).take();
        *self.previews.get_mut(slot) = None;
        self.activity.reset(ActionKind::preview(slot));
        if removed.is_some() {
            self.invalidate_derived();
        }
        removed
    }

    /// Store preview text if `upload` still occupies the slot
    ///
    /// Returns false (and stores nothing) for a stale preview.
    pub fn record_preview(&mut self, slot: Slot, upload: UploadId, text: String) -> bool {
        let current = self.uploads.get(slot).as_ref().map(|f| f.id);
        if current != Some(upload) {
            return false;
        }
        *self.previews.get_mut(slot) = Some(text);
        true
    }

    /// Replace the summary report wholesale
    pub fn replace_summary(&mut self, report: SummaryReport) {
        self.summary = Some(report);
    }

    /// Replace the active reply (history untouched)
    pub fn replace_reply(&mut self, reply: impl Into<String>) {
        self.active_reply = Some(reply.into());
    }

    /// Append a follow-up turn, make its reply active and clear the prompt input
    pub fn append_turn(&mut self, turn: ConversationTurn) {
        self.active_reply = Some(turn.bot_reply().to_string());
        self.history.push(turn);
        self.followup_prompt.clear();
    }

    /// Select a tone
    pub fn set_tone(&mut self, tone: Tone) {
        self.settings.tone = tone;
    }

    /// Select a strategy
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.settings.strategy = strategy;
    }

    /// Update the follow-up prompt input
    pub fn set_followup_prompt(&mut self, prompt: impl Into<String>) {
        self.followup_prompt = prompt.into();
    }

    /// Mark an action as started
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::AlreadyInFlight`] if a guarded action of the same
    /// kind is outstanding.
    pub fn begin_action(&mut self, kind: ActionKind) -> Result<(), ActivityError> {
        self.activity.begin(kind)
    }

    /// Mark a slot's preview as started; an older one is superseded
    pub fn restart_preview(&mut self, slot: Slot) {
        self.activity.restart_preview(slot);
    }

    /// Record how an action ended (`None` for success)
    pub fn finish_action(&mut self, kind: ActionKind, failure: Option<FailureKind>) {
        match failure {
            None => self.activity.succeed(kind),
            Some(category) => self.activity.fail(kind, category),
        }
    }

    /// Return an action to idle without recording an outcome
    pub fn abandon_action(&mut self, kind: ActionKind) {
        self.activity.reset(kind);
    }

    /// Show a transient feedback message, preempting any current one
    pub fn notify(&mut self, text: impl Into<String>) {
        self.feedback.show(text, Instant::now());
    }

    /// Clear the feedback message if it has expired by `now`
    pub fn expire_feedback(&mut self, now: Instant) -> bool {
        self.feedback.expire_due(now)
    }

    /// Return every field to its initial value and start a new epoch
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.uploads = PerSlot::default();
        self.previews = PerSlot::default();
        self.summary = None;
        self.settings = ReplySettings::default();
        self.active_reply = None;
        self.history.clear();
        self.followup_prompt.clear();
        self.activity = ActivityBoard::default();
        self.feedback.clear();
    }

    /// A source document changed: everything derived from the old sources goes
    fn invalidate_derived(&mut self) {
        self.summary = None;
        self.active_reply = None;
        self.history.clear();
    }
}
