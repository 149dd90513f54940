//! Assist Backend Traits
//!
//! Trait definitions for the document-assistance service. The Conductor talks
//! to the service only through [`AssistBackend`], so tests can drive it with a
//! scripted backend and the CLI with [`HttpBackend`](super::HttpBackend).
//!
//! # Design Philosophy
//!
//! Every call is one request and one response; nothing streams and nothing is
//! retried. Failures are typed so callers can tell a rate limit (HTTP 429),
//! which gets its own user-visible notice, from every other failure.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{ReplySettings, Slot, UploadedFile};

/// A file handed to the backend
///
/// Content is shared with the session so issuing a request never copies the
/// upload.
#[derive(Clone, Debug)]
pub struct FilePayload {
    /// Original file name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Raw bytes
    pub content: Arc<[u8]>,
}

impl From<&UploadedFile> for FilePayload {
    fn from(file: &UploadedFile) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            content: Arc::clone(&file.content),
        }
    }
}

/// Reply generation request
#[derive(Clone, Debug, Default)]
pub struct GenerateRequest {
    /// PDF source, if uploaded
    pub pdf: Option<FilePayload>,
    /// Email source, if uploaded
    pub email: Option<FilePayload>,
    /// Tone and strategy
    pub settings: ReplySettings,
}

impl GenerateRequest {
    /// Source for a slot
    #[must_use]
    pub fn source(&self, slot: Slot) -> Option<&FilePayload> {
        match slot {
            Slot::Pdf => self.pdf.as_ref(),
            Slot::Email => self.email.as_ref(),
        }
    }
}

/// Coarse failure category, all a caller needs to pick a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// The service answered 429
    RateLimited,
    /// Anything else
    Backend,
}

/// Backend call failure
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP 429
    #[error("rate limited by backend")]
    RateLimited,

    /// Any other non-success status
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Connection, timeout or client setup failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Success status with a body that does not decode
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Category used to pick the user-visible message
    #[must_use]
    pub fn category(&self) -> FailureKind {
        match self {
            Self::RateLimited => FailureKind::RateLimited,
            _ => FailureKind::Backend,
        }
    }

    /// Whether this is a rate limit
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Document-assistance backend
///
/// Implement this trait to plug in a different service or a test double.
#[async_trait]
pub trait AssistBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Extract plain text from one file
    async fn preview_text(&self, file: &FilePayload) -> Result<String, BackendError>;

    /// Summarize a PDF
    async fn summarize_pdf(&self, file: &FilePayload) -> Result<String, BackendError>;

    /// Summarize an email thread
    async fn summarize_email(&self, file: &FilePayload) -> Result<String, BackendError>;

    /// Summarize whichever slot `slot` names
    async fn summarize(&self, slot: Slot, file: &FilePayload) -> Result<String, BackendError> {
        match slot {
            Slot::Pdf => self.summarize_pdf(file).await,
            Slot::Email => self.summarize_email(file).await,
        }
    }

    /// Generate a reply from the uploaded sources
    async fn generate_reply(&self, request: &GenerateRequest) -> Result<String, BackendError>;

    /// Revise `previous` according to `prompt`
    async fn followup_reply(&self, previous: &str, prompt: &str) -> Result<String, BackendError>;
}

#[async_trait]
impl<T: AssistBackend + ?Sized> AssistBackend for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn preview_text(&self, file: &FilePayload) -> Result<String, BackendError> {
        (**self).preview_text(file).await
    }

    async fn summarize_pdf(&self, file: &FilePayload) -> Result<String, BackendError> {
        (**self).summarize_pdf(file).await
    }

    async fn summarize_email(&self, file: &FilePayload) -> Result<String, BackendError> {
        (**self).summarize_email(file).await
    }

    async fn summarize(&self, slot: Slot, file: &FilePayload) -> Result<String, BackendError> {
        (**self).summarize(slot, file).await
    }

    async fn generate_reply(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        (**self).generate_reply(request).await
    }

    async fn followup_reply(&self, previous: &str, prompt: &str) -> Result<String, BackendError> {
        (**self).followup_reply(previous, prompt).await
    }
}

/// Connection settings for [`HttpBackend`](super::HttpBackend)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Service base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: std::time::Duration,
}

/// Default service address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl BackendConfig {
    /// Create a configuration for `base_url` with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        assert_eq!(BackendError::RateLimited.category(), FailureKind::RateLimited);
        assert_eq!(
            BackendError::Status {
                status: 500,
                body: String::new()
            }
            .category(),
            FailureKind::Backend
        );
        assert_eq!(
            BackendError::Transport("refused".into()).category(),
            FailureKind::Backend
        );
    }

    #[test]
    fn test_backend_config_trims_trailing_slash() {
        let config = BackendConfig::new("http://localhost:9000/");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(BackendConfig::default().base_url, DEFAULT_BASE_URL);
    }
}
