//! Activity Tracking
//!
//! One small tagged state per kind of backend action. This replaces loose
//! "in flight" booleans: a kind is `Idle`, `InFlight`, or remembers how its last
//! run ended.
//!
//! Summarize, generate and follow-up are *guarded*: starting one while the same
//! kind is in flight is rejected, never queued. Previews are per slot and are
//! superseded instead, since a rapid re-upload must be able to start a new
//! preview; the older completion is dropped by upload identity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::FailureKind;
use crate::session::Slot;

/// Kinds of backend action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Text extraction for the PDF slot
    PdfPreview,
    /// Text extraction for the Email slot
    EmailPreview,
    /// Summary report
    Summarize,
    /// Primary reply generation
    Generate,
    /// Follow-up refinement
    Followup,
}

impl ActionKind {
    /// Every kind
    pub const ALL: [ActionKind; 5] = [
        ActionKind::PdfPreview,
        ActionKind::EmailPreview,
        ActionKind::Summarize,
        ActionKind::Generate,
        ActionKind::Followup,
    ];

    /// Preview kind for a slot
    #[must_use]
    pub fn preview(slot: Slot) -> Self {
        match slot {
            Slot::Pdf => Self::PdfPreview,
            Slot::Email => Self::EmailPreview,
        }
    }

    /// Whether a second start while in flight is rejected
    #[must_use]
    pub fn is_guarded(self) -> bool {
        matches!(self, Self::Summarize | Self::Generate | Self::Followup)
    }

    /// Label shown while the action runs
    #[must_use]
    pub fn busy_label(self) -> &'static str {
        match self {
            Self::PdfPreview | Self::EmailPreview => "Loading preview...",
            Self::Summarize => "Summarizing...",
            Self::Generate | Self::Followup => "Generating...",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::PdfPreview => 0,
            Self::EmailPreview => 1,
            Self::Summarize => 2,
            Self::Generate => 3,
            Self::Followup => 4,
        }
    }
}

/// State of one action kind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    /// Nothing outstanding, nothing remembered
    #[default]
    Idle,
    /// A request is outstanding
    InFlight,
    /// The last request succeeded
    Succeeded,
    /// The last request failed
    Failed(FailureKind),
}

impl ActivityState {
    /// Whether a request is outstanding
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::InFlight)
    }
}

/// Rejected attempt to start an action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ActivityError {
    /// The same kind is already outstanding
    #[error("{0:?} is already in flight")]
    AlreadyInFlight(ActionKind),
}

/// Activity state for every action kind
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActivityBoard {
    states: [ActivityState; 5],
}

impl ActivityBoard {
    /// State of a kind
    #[must_use]
    pub fn state(&self, kind: ActionKind) -> ActivityState {
        self.states[kind.index()]
    }

    /// Whether a kind is outstanding
    #[must_use]
    pub fn is_in_flight(&self, kind: ActionKind) -> bool {
        self.state(kind).is_in_flight()
    }

    /// Mark a kind as started
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::AlreadyInFlight`] for a guarded kind that is
    /// already outstanding. Preview kinds are always restarted.
    pub fn begin(&mut self, kind: ActionKind) -> Result<(), ActivityError> {
        if kind.is_guarded() && self.is_in_flight(kind) {
            return Err(ActivityError::AlreadyInFlight(kind));
        }
        self.states[kind.index()] = ActivityState::InFlight;
        Ok(())
    }

    /// Mark a slot's preview as started, superseding any outstanding one
    pub fn restart_preview(&mut self, slot: Slot) {
        self.states[ActionKind::preview(slot).index()] = ActivityState::InFlight;
    }

    /// Record a successful completion
    pub fn succeed(&mut self, kind: ActionKind) {
        self.states[kind.index()] = ActivityState::Succeeded;
    }

    /// Record a failed completion
    pub fn fail(&mut self, kind: ActionKind, category: FailureKind) {
        self.states[kind.index()] = ActivityState::Failed(category);
    }

    /// Return a kind to idle (abandoned or stale request)
    pub fn reset(&mut self, kind: ActionKind) {
        self.states[kind.index()] = ActivityState::Idle;
    }

    /// Every kind with its state
    pub fn iter(&self) -> impl Iterator<Item = (ActionKind, ActivityState)> + '_ {
        ActionKind::ALL.into_iter().map(|k| (k, self.state(k)))
    }
}
