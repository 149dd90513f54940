//! Summarization Orchestrator
//!
//! One summary request per populated slot, issued concurrently and assembled
//! PDF-first whatever order they finish in. The report is all-or-nothing: a
//! failure in either request replaces the whole report with a failure line.

use std::sync::Arc;

use futures::future::OptionFuture;

use crate::activity::ActionKind;
use crate::backend::{AssistBackend, BackendError, FailureKind, FilePayload};
use crate::session::{SessionState, Slot, SourceStamp, SummaryReport};

use super::{Completion, RATE_LIMITED_FEEDBACK, SUMMARY_FAILED};

/// A pending summarize action
#[derive(Debug)]
pub struct SummaryJob {
    stamp: SourceStamp,
    pdf: Option<FilePayload>,
    email: Option<FilePayload>,
}

/// Start summarizing the current uploads
///
/// A second start while one is outstanding changes nothing. With no file
/// present the report becomes "No file uploaded." and nothing is sent.
/// Returns `None` when no request needs to go out.
pub fn begin(state: &mut SessionState) -> Option<SummaryJob> {
    if state.activity().is_in_flight(ActionKind::Summarize) {
        tracing::warn!("Summarize already in flight");
        return None;
    }

    if !state.has_any_upload() {
        state.replace_summary(SummaryReport::assemble(None, None));
        return None;
    }

    if let Err(err) = state.begin_action(ActionKind::Summarize) {
        tracing::warn!(error = %err, "Summarize rejected");
        return None;
    }

    let job = SummaryJob {
        stamp: state.stamp(),
        pdf: state.upload(Slot::Pdf).map(FilePayload::from),
        email: state.upload(Slot::Email).map(FilePayload::from),
    };
    tracing::debug!(
        pdf = job.pdf.is_some(),
        email = job.email.is_some(),
        "Summarize requested"
    );
    Some(job)
}

/// Issue both summary requests and wait for both
pub async fn run<B: AssistBackend + ?Sized>(backend: Arc<B>, job: SummaryJob) -> Completion {
    let pdf: OptionFuture<_> = job.pdf.as_ref().map(|f| backend.summarize(Slot::Pdf, f)).into();
    let email: OptionFuture<_> = job
        .email
        .as_ref()
        .map(|f| backend.summarize(Slot::Email, f))
        .into();
    let (pdf, email) = tokio::join!(pdf, email);

    Completion::Summary {
        stamp: job.stamp,
        pdf,
        email,
    }
}

/// Apply a summary completion
///
/// Returns false if the sources changed since issue and the result was dropped.
pub fn apply(
    state: &mut SessionState,
    stamp: &SourceStamp,
    pdf: Option<Result<String, BackendError>>,
    email: Option<Result<String, BackendError>>,
) -> bool {
    if !state.is_current(stamp) {
        tracing::warn!("Dropping summary for replaced sources");
        state.abandon_action(ActionKind::Summarize);
        return false;
    }

    match (pdf.transpose(), email.transpose()) {
        (Ok(pdf), Ok(email)) => {
            state.replace_summary(SummaryReport::assemble(pdf, email));
            state.finish_action(ActionKind::Summarize, None);
        }
        (pdf, email) => {
            let errors: Vec<BackendError> = [pdf.err(), email.err()].into_iter().flatten().collect();
            let category = if errors.iter().any(BackendError::is_rate_limited) {
                state.notify(RATE_LIMITED_FEEDBACK);
                FailureKind::RateLimited
            } else {
                FailureKind::Backend
            };
            for err in &errors {
                tracing::warn!(error = %err, "Summary request failed");
            }
            state.replace_summary(SummaryReport::notice(SUMMARY_FAILED));
            state.finish_action(ActionKind::Summarize, Some(category));
        }
    }
    true
}
