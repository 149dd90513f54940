//! Assistance Backend Integration
//!
//! Abstracted access to the document-assistance service through a common trait.
//!
//! # Available Backends
//!
//! - **HTTP**: the REST service (default `http://127.0.0.1:8000`)
//!
//! # Usage
//!
//! ```ignore
//! use replydesk_core::backend::{AssistBackend, BackendConfig, HttpBackend};
//!
//! let backend = HttpBackend::new(&BackendConfig::default())?;
//! let reply = backend.followup_reply("Thanks!", "Make it more formal.").await?;
//! ```

mod http;
mod traits;

pub use http::HttpBackend;
pub use traits::{
    AssistBackend, BackendConfig, BackendError, FailureKind, FilePayload, GenerateRequest,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};
