//! HTTP Backend Implementation
//!
//! [`AssistBackend`] over the document-assistance REST service.
//!
//! # Service API
//!
//! - `/preview-text` - multipart `file`, answers `{"text": ...}`
//! - `/summarize-pdf` - multipart `pdf`, answers `{"summary": ...}`
//! - `/summarize-email` - multipart `email`, answers `{"summary": ...}`
//! - `/generate-reply` - multipart `pdf`?, `email`?, `tone`, `strategy`,
//!   answers `{"reply": ...}`
//! - `/followup-reply` - JSON `{"previous", "prompt"}`, answers `{"reply": ...}`
//!
//! A 429 from any endpoint becomes [`BackendError::RateLimited`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::{AssistBackend, BackendConfig, BackendError, FilePayload, GenerateRequest};
use crate::session::Slot;

#[derive(Deserialize)]
struct ReplyBody {
    reply: String,
}

#[derive(Deserialize)]
struct TextBody {
    text: String,
}

#[derive(Deserialize)]
struct SummaryBody {
    summary: String,
}

#[derive(Serialize)]
struct FollowupBody<'a> {
    previous: &'a str,
    prompt: &'a str,
}

/// HTTP client for the assistance service
#[derive(Clone, Debug)]
pub struct HttpBackend {
    /// Base URL, no trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend for `config`
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Base URL requests go to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Multipart part carrying a file's name and MIME type
    fn file_part(file: &FilePayload) -> Result<Part, BackendError> {
        Part::bytes(file.content.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| BackendError::Transport(format!("invalid MIME type {}: {e}", file.mime_type)))
    }

    /// Send a prepared request and decode a success body
    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(endpoint, "Backend rate limited request");
            return Err(BackendError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, status = status.as_u16(), "Backend returned error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Malformed(e.to_string()))
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: Form,
    ) -> Result<T, BackendError> {
        tracing::debug!(backend = "http", endpoint, "Sending multipart request");
        let request = self.http_client.post(self.url(endpoint)).multipart(form);
        self.send_and_decode(endpoint, request).await
    }
}

#[async_trait]
impl AssistBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn preview_text(&self, file: &FilePayload) -> Result<String, BackendError> {
        let form = Form::new().part("file", Self::file_part(file)?);
        let body: TextBody = self.post_form("preview-text", form).await?;
        Ok(body.text)
    }

    async fn summarize_pdf(&self, file: &FilePayload) -> Result<String, BackendError> {
        self.summarize(Slot::Pdf, file).await
    }

    async fn summarize_email(&self, file: &FilePayload) -> Result<String, BackendError> {
        self.summarize(Slot::Email, file).await
    }

    async fn summarize(&self, slot: Slot, file: &FilePayload) -> Result<String, BackendError> {
        let endpoint = match slot {
            Slot::Pdf => "summarize-pdf",
            Slot::Email => "summarize-email",
        };
        let form = Form::new().part(slot.form_field(), Self::file_part(file)?);
        let body: SummaryBody = self.post_form(endpoint, form).await?;
        Ok(body.summary)
    }

    async fn generate_reply(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        let mut form = Form::new();
        for slot in Slot::ALL {
            if let Some(file) = request.source(slot) {
                form = form.part(slot.form_field(), Self::file_part(file)?);
            }
        }
        form = form
            .text("tone", request.settings.tone.as_str())
            .text("strategy", request.settings.strategy.as_str());

        let body: ReplyBody = self.post_form("generate-reply", form).await?;
        Ok(body.reply)
    }

    async fn followup_reply(&self, previous: &str, prompt: &str) -> Result<String, BackendError> {
        tracing::debug!(backend = "http", endpoint = "followup-reply", "Sending JSON request");
        let request = self
            .http_client
            .post(self.url("followup-reply"))
            .json(&FollowupBody { previous, prompt });
        let body: ReplyBody = self.send_and_decode("followup-reply", request).await?;
        Ok(body.reply)
    }
}
