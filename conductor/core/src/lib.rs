//! Replydesk Core - Headless Document-Assistance Sessions
//!
//! This crate provides the session controller behind replydesk, completely
//! independent of any UI framework. A user supplies up to two source documents
//! (a PDF attachment and an email thread); the controller validates and
//! previews them, requests summaries, generates a toned reply through a remote
//! backend and refines it with follow-up prompts while keeping the history.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          UI Surface                              │
//! │              (CLI, GUI, test harness, anything)                  │
//! └───────────────┬──────────────────────────────▲───────────────────┘
//!                 │ SurfaceEvent (up)            │ SessionMessage (down)
//! ┌───────────────▼──────────────────────────────┴───────────────────┐
//! │                          Conductor                               │
//! │  ┌────────────┐  ┌────────────┐  ┌──────────────┐  ┌──────────┐  │
//! │  │  Intake    │  │  Session   │  │   Workflow   │  │ Feedback │  │
//! │  │ validation │  │   State    │  │  components  │  │  timer   │  │
//! │  └────────────┘  └────────────┘  └──────┬───────┘  └──────────┘  │
//! └─────────────────────────────────────────┼────────────────────────┘
//!                                           │ spawned jobs, completions
//!                                  ┌────────▼─────────┐
//!                                  │  AssistBackend   │
//!                                  │ (HTTP or mock)   │
//!                                  └──────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: owns the session, handles events, applies completions
//! - [`SurfaceEvent`]: user actions sent from the surface
//! - [`SessionMessage`]: snapshots and side-effect requests sent to the surface
//! - [`SessionState`]: the session record and its transitions
//! - [`AssistBackend`]: the remote service, with [`HttpBackend`] as the real one
//!
//! # Quick Start
//!
//! ```ignore
//! use replydesk_core::{Conductor, ConductorConfig, HttpBackend, BackendConfig, SurfaceEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let backend = HttpBackend::new(&BackendConfig::default())?;
//!     let mut conductor = Conductor::new(backend, ConductorConfig::default(), tx);
//!     conductor.start().await?;
//!
//!     conductor.handle_event(SurfaceEvent::GenerateRequested).await?;
//!     loop {
//!         tokio::select! {
//!             Some(msg) = rx.recv() => { /* render */ }
//!             Some(done) = conductor.next_completion() => conductor.apply_completion(done).await,
//!         }
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`activity`]: per-action in-flight tracking
//! - [`backend`]: backend abstraction and the HTTP client
//! - [`conductor`]: main Conductor struct
//! - [`config`]: layered TOML/env/CLI configuration
//! - [`events`]: events from the UI surface
//! - [`feedback`]: the transient feedback line
//! - [`intake`]: file selection validation
//! - [`messages`]: messages and snapshots for the UI surface
//! - [`session`]: session state and its invariants
//! - [`workflow`]: preview, summarize, reply and follow-up components
//!
//! # No UI Dependencies
//!
//! This crate has no dependency on any terminal or GUI toolkit. It's pure
//! session logic that can be driven from anywhere.

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod activity;
pub mod backend;
pub mod conductor;
pub mod config;
pub mod events;
pub mod feedback;
pub mod intake;
pub mod messages;
pub mod session;
pub mod workflow;

// Re-exports for convenience
pub use activity::{ActionKind, ActivityBoard, ActivityError, ActivityState};
pub use backend::{
    AssistBackend, BackendConfig, BackendError, FailureKind, FilePayload, GenerateRequest,
    HttpBackend,
};
pub use conductor::{Conductor, ConductorConfig};
pub use events::SurfaceEvent;
pub use feedback::{FeedbackMessage, FeedbackNotifier};
pub use intake::{FileSelection, IntakePolicy, ValidationError};
pub use messages::{Controls, FileSummary, SessionId, SessionMessage, SessionSnapshot};
pub use session::{
    ConversationHistory, ConversationTurn, ReplySettings, SessionState, Slot, SourceStamp,
    Strategy, SummaryReport, SummarySection, Tone, UploadId, UploadedFile,
};
pub use workflow::Completion;

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, ReplydeskConfigFile, ReplydeskToml,
};
