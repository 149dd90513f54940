//! Conductor - The Orchestration Core
//!
//! The Conductor owns one document-assistance session. It:
//! - validates file selections and fills the upload slots
//! - starts previews, summaries, reply generation and follow-ups
//! - applies backend completions, dropping the ones that went stale
//! - runs the feedback timer
//! - publishes a fresh snapshot to the UI surface after every change
//!
//! # Design Philosophy
//!
//! The Conductor is UI-agnostic. It communicates through:
//! - `SurfaceEvent`: user actions received FROM the UI surface
//! - `SessionMessage`: snapshots and side-effect requests sent TO the surface
//!
//! Backend calls run on spawned tasks, but their results come back through a
//! channel the Conductor drains itself, so [`SessionState`] is only ever
//! touched by whoever drives the Conductor. The driver loop looks like:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = surface_rx.recv() => conductor.handle_event(event).await?,
//!         Some(done) = conductor.next_completion() => conductor.apply_completion(done).await,
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::backend::AssistBackend;
use crate::config::ReplydeskConfigFile;
use crate::events::SurfaceEvent;
use crate::feedback::FEEDBACK_DURATION;
use crate::intake::{FileSelection, IntakePolicy, MAX_UPLOAD_BYTES};
use crate::messages::{Controls, SessionId, SessionMessage, SessionSnapshot, DOWNLOAD_FILE_NAME};
use crate::session::{SessionState, Slot};
use crate::workflow::{followup, preview, reply, summarize, Completion};

/// Feedback after a copy
pub const COPIED_FEEDBACK: &str = "Copied to clipboard!";

/// Feedback after a download
pub const DOWNLOADED_FEEDBACK: &str = "File downloaded!";

/// Capacity of the internal completion channel
const COMPLETION_CHANNEL_CAPACITY: usize = 64;

/// Conductor configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConductorConfig {
    /// Upload size limit in bytes
    pub max_file_bytes: usize,
    /// How long feedback messages stay visible
    pub feedback_duration: Duration,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_UPLOAD_BYTES,
            feedback_duration: FEEDBACK_DURATION,
        }
    }
}

impl ConductorConfig {
    /// Session settings from a loaded configuration file
    #[must_use]
    pub fn from_file_config(config: &ReplydeskConfigFile) -> Self {
        Self {
            max_file_bytes: config.intake.max_file_bytes,
            feedback_duration: Duration::from_millis(config.feedback.duration_ms),
        }
    }
}

/// The Conductor - headless session orchestrator
pub struct Conductor<B: AssistBackend> {
    /// Assistance backend
    backend: Arc<B>,
    /// Session identity
    session_id: SessionId,
    /// The session record
    state: SessionState,
    /// Upload validation rules
    intake: IntakePolicy,
    /// Channel to send messages to UI surface
    tx: mpsc::Sender<SessionMessage>,
    /// Completions from spawned backend jobs
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
    /// Jobs spawned whose completion has not been received yet
    outstanding: usize,
}

impl<B: AssistBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig, tx: mpsc::Sender<SessionMessage>) -> Self {
        Self::with_shared_backend(Arc::new(backend), config, tx)
    }

    /// Create a new Conductor around a backend that is shared elsewhere
    pub fn with_shared_backend(
        backend: Arc<B>,
        config: ConductorConfig,
        tx: mpsc::Sender<SessionMessage>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        Self {
            backend,
            session_id: SessionId::new(),
            state: SessionState::new(config.feedback_duration),
            intake: IntakePolicy::with_max_bytes(config.max_file_bytes),
            tx,
            completion_tx,
            completion_rx,
            outstanding: 0,
        }
    }

    /// Get the session ID
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Read-only view of the session
    pub fn session(&self) -> &SessionState {
        &self.state
    }

    /// Backend jobs still running
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Current renderable state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session_id, &self.state)
    }

    /// Current control enablement
    pub fn controls(&self) -> Controls {
        Controls::derive(&self.state)
    }

    /// Whether generate would be accepted
    pub fn can_generate(&self) -> bool {
        self.controls().generate
    }

    /// Whether summarize would be accepted
    pub fn can_summarize(&self) -> bool {
        self.controls().summarize
    }

    /// Whether a follow-up could be sent (the prompt is checked on send)
    pub fn can_followup(&self) -> bool {
        self.controls().followup
    }

    /// Start the Conductor (publish the initial state)
    pub async fn start(&mut self) -> anyhow::Result<()> {
        tracing::info!(
            session_id = %self.session_id.0,
            backend = self.backend.name(),
            "Session started"
        );
        self.publish().await;
        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> anyhow::Result<()> {
        tracing::debug!(event = event.name(), "Handling surface event");

        match event {
            SurfaceEvent::FileSelected { slot, selection } => {
                self.select_file(slot, selection).await;
            }

            SurfaceEvent::FileRemoved { slot } => {
                if let Some(removed) = self.state.remove_upload(slot) {
                    tracing::info!(slot = %slot, upload_id = %removed.id, "Upload removed");
                }
                self.send(SessionMessage::ResetInput { slot }).await;
            }

            SurfaceEvent::ToneSelected(tone) => self.state.set_tone(tone),

            SurfaceEvent::StrategySelected(strategy) => self.state.set_strategy(strategy),

            SurfaceEvent::SummarizeRequested => {
                if let Some(job) = summarize::begin(&mut self.state) {
                    self.spawn_job(summarize::run(Arc::clone(&self.backend), job));
                }
            }

            SurfaceEvent::GenerateRequested => {
                if let Some(job) = reply::begin(&mut self.state) {
                    self.spawn_job(reply::run(Arc::clone(&self.backend), job));
                }
            }

            SurfaceEvent::FollowupPromptChanged(prompt) => self.state.set_followup_prompt(prompt),

            SurfaceEvent::FollowupRequested => {
                if let Some(job) = followup::begin(&mut self.state) {
                    self.spawn_job(followup::run(Arc::clone(&self.backend), job));
                }
            }

            SurfaceEvent::CopyRequested => {
                if let Some(text) = self.state.active_reply().map(str::to_string) {
                    self.send(SessionMessage::CopyToClipboard { text }).await;
                    self.state.notify(COPIED_FEEDBACK);
                } else {
                    tracing::warn!("Copy requested with no reply");
                }
            }

            SurfaceEvent::DownloadRequested => {
                if let Some(contents) = self.state.active_reply().map(str::to_string) {
                    self.send(SessionMessage::SaveFile {
                        file_name: DOWNLOAD_FILE_NAME.to_string(),
                        contents,
                    })
                    .await;
                    self.state.notify(DOWNLOADED_FEEDBACK);
                } else {
                    tracing::warn!("Download requested with no reply");
                }
            }

            SurfaceEvent::ResetRequested => {
                self.state.reset();
                tracing::info!(epoch = self.state.epoch(), "Session reset");
                for slot in Slot::ALL {
                    self.send(SessionMessage::ResetInput { slot }).await;
                }
            }
        }

        self.publish().await;
        Ok(())
    }

    /// Validate a selection and, if accepted, start its preview
    async fn select_file(&mut self, slot: Slot, selection: FileSelection) {
        let name = selection.name.clone();
        match self.intake.validate(slot, selection) {
            Ok(file) => {
                tracing::info!(
                    slot = %slot,
                    upload_id = %file.id,
                    name = %file.name,
                    size = file.size(),
                    "Upload accepted"
                );
                self.state.accept_upload(file);
                if let Some(job) = preview::begin(&mut self.state, slot) {
                    self.spawn_job(preview::run(Arc::clone(&self.backend), job));
                }
            }
            Err(err) => {
                tracing::warn!(slot = %slot, name = %name, error = ?err, "Upload rejected");
                self.state.notify(err.to_string());
                self.send(SessionMessage::ResetInput { slot }).await;
            }
        }
    }

    /// Wait for the next backend completion or the feedback deadline
    ///
    /// Returns `None` only if the completion channel has closed, which cannot
    /// happen while the Conductor is alive.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        let deadline = self.state.feedback().deadline();
        let expiry = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            completion = self.completion_rx.recv() => completion,
            () = expiry => Some(Completion::FeedbackExpired),
        }
    }

    /// Apply a completion returned by [`Self::next_completion`]
    pub async fn apply_completion(&mut self, completion: Completion) {
        let kind = completion.kind();
        if !matches!(completion, Completion::FeedbackExpired) {
            self.outstanding = self.outstanding.saturating_sub(1);
        }

        if let Some(epoch) = completion.epoch() {
            if epoch != self.state.epoch() {
                tracing::warn!(kind, epoch, current = self.state.epoch(), "Dropping completion from before reset");
                return;
            }
        }

        let changed = match completion {
            Completion::Preview {
                slot,
                upload,
                result,
                ..
            } => preview::apply(&mut self.state, slot, upload, result),
            Completion::Summary { stamp, pdf, email } => {
                summarize::apply(&mut self.state, &stamp, pdf, email);
                true
            }
            Completion::Reply { stamp, result } => {
                reply::apply(&mut self.state, &stamp, result);
                true
            }
            Completion::Followup {
                stamp,
                prompt,
                result,
            } => {
                followup::apply(&mut self.state, &stamp, prompt, result);
                true
            }
            Completion::FeedbackExpired => self.state.expire_feedback(Instant::now()),
        };

        if changed {
            self.publish().await;
        }
    }

    /// Apply completions until no backend job is outstanding
    ///
    /// The feedback timer is not serviced while settling.
    pub async fn settle(&mut self) {
        while self.outstanding > 0 {
            let Some(completion) = self.completion_rx.recv().await else {
                break;
            };
            self.apply_completion(completion).await;
        }
    }

    /// Run a backend job on its own task, delivering its completion back here
    fn spawn_job<F>(&mut self, job: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        self.outstanding += 1;
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let completion = job.await;
            if tx.send(completion).await.is_err() {
                tracing::debug!("Conductor gone, discarding completion");
            }
        });
    }

    /// Publish the current snapshot
    async fn publish(&self) {
        self.send(SessionMessage::Snapshot(Box::new(self.snapshot())))
            .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: SessionMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, FilePayload, GenerateRequest};
    use crate::workflow::RATE_LIMITED_FEEDBACK;

    // Mock backend for testing
    struct MockBackend;

    #[async_trait::async_trait]
    impl AssistBackend for MockBackend {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn preview_text(&self, file: &FilePayload) -> Result<String, BackendError> {
            Ok(format!("preview of {}", file.name))
        }

        async fn summarize_pdf(&self, _file: &FilePayload) -> Result<String, BackendError> {
            Ok("pdf summary".to_string())
        }

        async fn summarize_email(&self, _file: &FilePayload) -> Result<String, BackendError> {
            Err(BackendError::RateLimited)
        }

        async fn generate_reply(&self, request: &GenerateRequest) -> Result<String, BackendError> {
            Ok(format!("{} reply", request.settings.tone))
        }

        async fn followup_reply(&self, previous: &str, prompt: &str) -> Result<String, BackendError> {
            Ok(format!("{previous} ({prompt})"))
        }
    }

    fn conductor() -> (Conductor<MockBackend>, mpsc::Receiver<SessionMessage>) {
        let (tx, rx) = mpsc::channel(100);
        (Conductor::new(MockBackend, ConductorConfig::default(), tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<SessionMessage>) -> Vec<SessionMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn pdf() -> SurfaceEvent {
        SurfaceEvent::FileSelected {
            slot: Slot::Pdf,
            selection: FileSelection::new("brief.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
        }
    }

    #[tokio::test]
    async fn test_conductor_start_publishes_snapshot() {
        let (mut conductor, mut rx) = conductor();
        conductor.start().await.unwrap();

        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg, SessionMessage::Snapshot(ref s) if s.pdf.is_none()));
        assert!(!conductor.can_generate());
    }

    #[tokio::test]
    async fn test_upload_fetches_preview() {
        let (mut conductor, _rx) = conductor();
        conductor.handle_event(pdf()).await.unwrap();
        assert_eq!(conductor.outstanding(), 1);
        assert!(conductor.can_generate());

        conductor.settle().await;
        assert_eq!(conductor.outstanding(), 0);
        assert_eq!(
            conductor.session().preview(Slot::Pdf),
            Some("preview of brief.pdf")
        );
    }

    #[tokio::test]
    async fn test_rejected_upload_resets_input() {
        let (mut conductor, mut rx) = conductor();
        conductor
            .handle_event(SurfaceEvent::FileSelected {
                slot: Slot::Email,
                selection: FileSelection::new("pic.png", "image/png", vec![0; 4]),
            })
            .await
            .unwrap();

        assert!(conductor.session().upload(Slot::Email).is_none());
        assert_eq!(conductor.outstanding(), 0);
        assert_eq!(
            conductor.session().feedback().text(),
            Some("Unsupported file type.")
        );
        let msgs = drain(&mut rx);
        assert!(msgs.contains(&SessionMessage::ResetInput { slot: Slot::Email }));
    }

    #[tokio::test]
    async fn test_copy_and_download() {
        let (mut conductor, mut rx) = conductor();
        conductor.handle_event(pdf()).await.unwrap();
        conductor.handle_event(SurfaceEvent::GenerateRequested).await.unwrap();
        conductor.settle().await;
        drain(&mut rx);

        conductor.handle_event(SurfaceEvent::CopyRequested).await.unwrap();
        assert_eq!(conductor.session().feedback().text(), Some(COPIED_FEEDBACK));
        conductor.handle_event(SurfaceEvent::DownloadRequested).await.unwrap();
        assert_eq!(conductor.session().feedback().text(), Some(DOWNLOADED_FEEDBACK));

        let msgs = drain(&mut rx);
        assert!(msgs.contains(&SessionMessage::CopyToClipboard {
            text: "Professional reply".to_string()
        }));
        assert!(msgs.contains(&SessionMessage::SaveFile {
            file_name: "generated_reply.txt".to_string(),
            contents: "Professional reply".to_string()
        }));
    }

    #[tokio::test]
    async fn test_copy_without_reply_is_ignored() {
        let (mut conductor, mut rx) = conductor();
        conductor.handle_event(SurfaceEvent::CopyRequested).await.unwrap();
        assert!(conductor.session().feedback().text().is_none());
        assert!(!drain(&mut rx)
            .iter()
            .any(|m| matches!(m, SessionMessage::CopyToClipboard { .. })));
    }

    #[tokio::test]
    async fn test_summary_rate_limit() {
        let (mut conductor, _rx) = conductor();
        conductor.handle_event(pdf()).await.unwrap();
        conductor
            .handle_event(SurfaceEvent::FileSelected {
                slot: Slot::Email,
                selection: FileSelection::new("t.txt", "text/plain", b"Hi".to_vec()),
            })
            .await
            .unwrap();
        conductor.handle_event(SurfaceEvent::SummarizeRequested).await.unwrap();
        conductor.settle().await;

        assert_eq!(
            conductor.snapshot().summary.as_deref(),
            Some("Failed to summarize uploaded content.")
        );
        assert_eq!(
            conductor.session().feedback().text(),
            Some(RATE_LIMITED_FEEDBACK)
        );
    }

    #[tokio::test]
    async fn test_reset_clears_inputs() {
        let (mut conductor, mut rx) = conductor();
        conductor.handle_event(pdf()).await.unwrap();
        conductor.settle().await;
        drain(&mut rx);

        conductor.handle_event(SurfaceEvent::ResetRequested).await.unwrap();
        let msgs = drain(&mut rx);
        assert!(msgs.contains(&SessionMessage::ResetInput { slot: Slot::Pdf }));
        assert!(msgs.contains(&SessionMessage::ResetInput { slot: Slot::Email }));
        match msgs.last() {
            Some(SessionMessage::Snapshot(s)) => {
                assert!(s.pdf.is_none());
                assert!(s.pdf_preview.is_none());
                assert_eq!(s.epoch, 1);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_feedback_expires() {
        let (tx, _rx) = mpsc::channel(100);
        let config = ConductorConfig {
            feedback_duration: Duration::from_millis(30),
            ..Default::default()
        };
        let mut conductor = Conductor::new(MockBackend, config, tx);
        conductor.handle_event(SurfaceEvent::GenerateRequested).await.unwrap();
        assert!(conductor.session().feedback().text().is_some());

        let completion = conductor.next_completion().await.unwrap();
        assert!(matches!(completion, Completion::FeedbackExpired));
        conductor.apply_completion(completion).await;
        assert!(conductor.session().feedback().text().is_none());
    }
}
