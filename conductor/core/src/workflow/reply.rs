//! Reply Generator
//!
//! Primary generation from the uploaded sources with the selected tone and
//! strategy. Success replaces the active reply and leaves history alone. A
//! rate limit only shows feedback and keeps the previous reply; any other
//! failure replaces the reply with a failure line.

use std::sync::Arc;

use crate::activity::ActionKind;
use crate::backend::{AssistBackend, BackendError, FilePayload, GenerateRequest};
use crate::session::{SessionState, Slot, SourceStamp};

use super::{Completion, GENERATE_FAILED, NO_FILE_FEEDBACK, RATE_LIMITED_FEEDBACK};

/// A pending generation request
#[derive(Debug)]
pub struct ReplyJob {
    stamp: SourceStamp,
    request: GenerateRequest,
}

/// Start generating a reply
///
/// Returns `None` if there is no file (feedback is shown) or a generation is
/// already in flight.
pub fn begin(state: &mut SessionState) -> Option<ReplyJob> {
    if !state.has_any_upload() {
        state.notify(NO_FILE_FEEDBACK);
        return None;
    }

    if let Err(err) = state.begin_action(ActionKind::Generate) {
        tracing::warn!(error = %err, "Generate rejected");
        return None;
    }

    let settings = state.settings();
    let job = ReplyJob {
        stamp: state.stamp(),
        request: GenerateRequest {
            pdf: state.upload(Slot::Pdf).map(FilePayload::from),
            email: state.upload(Slot::Email).map(FilePayload::from),
            settings,
        },
    };
    tracing::debug!(tone = %settings.tone, strategy = %settings.strategy, "Generate requested");
    Some(job)
}

/// Perform the generation
pub async fn run<B: AssistBackend + ?Sized>(backend: Arc<B>, job: ReplyJob) -> Completion {
    let result = backend.generate_reply(&job.request).await;
    Completion::Reply {
        stamp: job.stamp,
        result,
    }
}

/// Apply a generation completion
///
/// Returns false if the sources changed since issue and the result was dropped.
pub fn apply(
    state: &mut SessionState,
    stamp: &SourceStamp,
    result: Result<String, BackendError>,
) -> bool {
    if !state.is_current(stamp) {
        tracing::warn!("Dropping reply for replaced sources");
        state.abandon_action(ActionKind::Generate);
        return false;
    }

    match result {
        Ok(reply) => {
            tracing::info!(chars = reply.len(), "Reply generated");
            state.replace_reply(reply);
            state.finish_action(ActionKind::Generate, None);
        }
        Err(err) => {
            tracing::warn!(error = %err, "Reply generation failed");
            if err.is_rate_limited() {
                state.notify(RATE_LIMITED_FEEDBACK);
            } else {
                state.replace_reply(GENERATE_FAILED);
            }
            state.finish_action(ActionKind::Generate, Some(err.category()));
        }
    }
    true
}
