//! Preview Fetcher
//!
//! One text-extraction request per accepted upload. Failure is local to the
//! slot: the preview becomes a placeholder and the session carries on.
//! A preview that arrives after its slot was re-filled or emptied is dropped.

use std::sync::Arc;

use crate::activity::ActionKind;
use crate::backend::{AssistBackend, FilePayload};
use crate::session::{SessionState, Slot, UploadId};

use super::{Completion, PREVIEW_FAILED, RATE_LIMITED_FEEDBACK};

/// A pending extraction request
#[derive(Debug)]
pub struct PreviewJob {
    epoch: u64,
    slot: Slot,
    upload: UploadId,
    file: FilePayload,
}

/// Start a preview for the file now in `slot`
///
/// Returns `None` if the slot is empty. A preview already outstanding for the
/// slot is superseded; its completion will fail the identity check.
pub fn begin(state: &mut SessionState, slot: Slot) -> Option<PreviewJob> {
    let file = state.upload(slot)?;
    let job = PreviewJob {
        epoch: state.epoch(),
        slot,
        upload: file.id,
        file: FilePayload::from(file),
    };
    state.restart_preview(slot);
    tracing::debug!(slot = %slot, upload_id = %job.upload, "Preview requested");
    Some(job)
}

/// Perform the extraction
pub async fn run<B: AssistBackend + ?Sized>(backend: Arc<B>, job: PreviewJob) -> Completion {
    let result = backend.preview_text(&job.file).await;
    Completion::Preview {
        epoch: job.epoch,
        slot: job.slot,
        upload: job.upload,
        result,
    }
}

/// Apply a preview completion
///
/// Returns false if the completion was stale and dropped.
pub fn apply(
    state: &mut SessionState,
    slot: Slot,
    upload: UploadId,
    result: Result<String, crate::backend::BackendError>,
) -> bool {
    let (text, failure) = match result {
        Ok(text) => (text, None),
        Err(err) => {
            tracing::warn!(slot = %slot, upload_id = %upload, error = %err, "Preview failed");
            (PREVIEW_FAILED.to_string(), Some(err))
        }
    };

    if !state.record_preview(slot, upload, text) {
        tracing::warn!(slot = %slot, upload_id = %upload, "Dropping stale preview");
        return false;
    }

    let kind = ActionKind::preview(slot);
    match failure {
        None => state.finish_action(kind, None),
        Some(err) => {
            if err.is_rate_limited() {
                state.notify(RATE_LIMITED_FEEDBACK);
            }
            state.finish_action(kind, Some(err.category()));
        }
    }
    true
}
