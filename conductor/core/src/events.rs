//! Surface Events
//!
//! Events sent from the UI surface to the Conductor. These represent every
//! user action a document-assistance surface can report.
//!
//! # Design Philosophy
//!
//! UI surfaces are "dumb" renderers that forward user actions to the Conductor.
//! They don't interpret what actions mean or check whether an action is
//! allowed; they just report what happened. The Conductor decides how to
//! respond.

use serde::{Deserialize, Serialize};

use crate::intake::FileSelection;
use crate::session::{Slot, Strategy, Tone};

/// Events from UI surface to Conductor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    // ============================================
    // Source documents
    // ============================================
    /// User picked a file for a slot
    FileSelected {
        /// Target slot
        slot: Slot,
        /// The selection, not yet validated
        selection: FileSelection,
    },

    /// User removed the file from a slot
    FileRemoved {
        /// Slot to clear
        slot: Slot,
    },

    // ============================================
    // Reply settings
    // ============================================
    /// User picked a tone
    ToneSelected(Tone),

    /// User picked a strategy
    StrategySelected(Strategy),

    // ============================================
    // Actions
    // ============================================
    /// User asked for a summary of the uploads
    SummarizeRequested,

    /// User asked for a reply
    GenerateRequested,

    /// Follow-up prompt input changed
    FollowupPromptChanged(String),

    /// User sent the follow-up prompt
    FollowupRequested,

    /// User asked to copy the reply
    CopyRequested,

    /// User asked to download the reply
    DownloadRequested,

    /// User cleared everything
    ResetRequested,
}

impl SurfaceEvent {
    /// Short name for logs (never includes file contents or prompt text)
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FileSelected { .. } => "file_selected",
            Self::FileRemoved { .. } => "file_removed",
            Self::ToneSelected(_) => "tone_selected",
            Self::StrategySelected(_) => "strategy_selected",
            Self::SummarizeRequested => "summarize_requested",
            Self::GenerateRequested => "generate_requested",
            Self::FollowupPromptChanged(_) => "followup_prompt_changed",
            Self::FollowupRequested => "followup_requested",
            Self::CopyRequested => "copy_requested",
            Self::DownloadRequested => "download_requested",
            Self::ResetRequested => "reset_requested",
        }
    }
}
