//! Follow-up Conversation Manager
//!
//! Refines the active reply with a user prompt. Success appends one turn to the
//! history, makes its reply active and clears the prompt input. Failure of any
//! kind is feedback only; the last good reply and the history survive.

use std::sync::Arc;

use crate::activity::ActionKind;
use crate::backend::{AssistBackend, BackendError};
use crate::session::{ConversationTurn, SessionState, SourceStamp};

use super::{
    Completion, EMPTY_PROMPT_FEEDBACK, FOLLOWUP_FAILED, NO_REPLY_FEEDBACK, RATE_LIMITED_FEEDBACK,
};

/// A pending follow-up request
#[derive(Debug)]
pub struct FollowupJob {
    stamp: SourceStamp,
    previous: String,
    prompt: String,
}

/// Start a follow-up with the current prompt input
///
/// The prompt is sent as typed; only the emptiness check trims it.
pub fn begin(state: &mut SessionState) -> Option<FollowupJob> {
    let prompt = state.followup_prompt().to_string();
    if prompt.trim().is_empty() {
        state.notify(EMPTY_PROMPT_FEEDBACK);
        return None;
    }

    let Some(previous) = state.active_reply().map(str::to_string) else {
        state.notify(NO_REPLY_FEEDBACK);
        return None;
    };

    if let Err(err) = state.begin_action(ActionKind::Followup) {
        tracing::warn!(error = %err, "Follow-up rejected");
        return None;
    }

    tracing::debug!(prompt_chars = prompt.len(), "Follow-up requested");
    Some(FollowupJob {
        stamp: state.stamp(),
        previous,
        prompt,
    })
}

/// Perform the follow-up
pub async fn run<B: AssistBackend + ?Sized>(backend: Arc<B>, job: FollowupJob) -> Completion {
    let result = backend.followup_reply(&job.previous, &job.prompt).await;
    Completion::Followup {
        stamp: job.stamp,
        prompt: job.prompt,
        result,
    }
}

/// Apply a follow-up completion
///
/// Returns false if the sources changed since issue and the result was dropped.
pub fn apply(
    state: &mut SessionState,
    stamp: &SourceStamp,
    prompt: String,
    result: Result<String, BackendError>,
) -> bool {
    if !state.is_current(stamp) {
        tracing::warn!("Dropping follow-up for replaced sources");
        state.abandon_action(ActionKind::Followup);
        return false;
    }

    match result {
        Ok(reply) => {
            tracing::info!(turn = state.history().len() + 1, "Follow-up reply received");
            state.append_turn(ConversationTurn::new(prompt, reply));
            state.finish_action(ActionKind::Followup, None);
        }
        Err(err) => {
            tracing::warn!(error = %err, "Follow-up failed");
            if err.is_rate_limited() {
                state.notify(RATE_LIMITED_FEEDBACK);
            } else {
                state.notify(FOLLOWUP_FAILED);
            }
            state.finish_action(ActionKind::Followup, Some(err.category()));
        }
    }
    true
}
