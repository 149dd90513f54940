//! File Intake
//!
//! Validation of a user's file selection before it may occupy a slot. A
//! rejected selection never touches the session; the caller shows the error
//! text as feedback and clears the surface's file input.
//!
//! Type is checked before size, so an oversized file of the wrong type reports
//! the type.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{Slot, UploadId, UploadedFile};

/// Default upload size limit (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted in the PDF slot
pub const PDF_TYPES: &[&str] = &["application/pdf"];

/// MIME types accepted in the Email slot
pub const EMAIL_TYPES: &[&str] = &["text/plain", "message/rfc822"];

/// A file chosen by the user, not yet validated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelection {
    /// File name
    pub name: String,
    /// MIME type reported by the surface
    pub mime_type: String,
    /// Raw bytes
    pub content: Vec<u8>,
}

impl FileSelection {
    /// Create a selection
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content,
        }
    }
}

/// Why a selection was rejected
///
/// `Display` is the user-visible feedback text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// MIME type not accepted by the slot
    #[error("Unsupported file type.")]
    UnsupportedType {
        /// Target slot
        slot: Slot,
        /// Offending type
        mime_type: String,
    },

    /// Content exceeds the size limit
    #[error("File too large (max {}).", format_limit(.max))]
    TooLarge {
        /// Selection size in bytes
        size: usize,
        /// Limit in bytes
        max: usize,
    },
}

/// Size limit as shown to the user, in the largest unit that divides it
fn format_limit(max: &usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    match *max {
        0 => "0 bytes".to_string(),
        n if n % MIB == 0 => format!("{}MB", n / MIB),
        n if n % KIB == 0 => format!("{}KB", n / KIB),
        n => format!("{n} bytes"),
    }
}

/// Rules applied to every selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntakePolicy {
    /// Largest accepted file in bytes (inclusive)
    pub max_file_bytes: usize,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl IntakePolicy {
    /// Policy with a custom size limit
    #[must_use]
    pub fn with_max_bytes(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }

    /// MIME types a slot accepts
    #[must_use]
    pub fn accepted_types(slot: Slot) -> &'static [&'static str] {
        match slot {
            Slot::Pdf => PDF_TYPES,
            Slot::Email => EMAIL_TYPES,
        }
    }

    /// Validate a selection for `slot`, producing the upload on success
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnsupportedType`] or [`ValidationError::TooLarge`].
    pub fn validate(
        &self,
        slot: Slot,
        selection: FileSelection,
    ) -> Result<UploadedFile, ValidationError> {
        let mime_type = selection.mime_type.trim().to_ascii_lowercase();
        if !Self::accepted_types(slot).contains(&mime_type.as_str()) {
            return Err(ValidationError::UnsupportedType {
                slot,
                mime_type: selection.mime_type,
            });
        }

        let size = selection.content.len();
        if size > self.max_file_bytes {
            return Err(ValidationError::TooLarge {
                size,
                max: self.max_file_bytes,
            });
        }

        Ok(UploadedFile {
            id: UploadId::new(),
            slot,
            name: selection.name,
            content: Arc::from(selection.content),
            mime_type,
        })
    }
}

/// Guess a MIME type from a file name's extension
///
/// Only the extensions the slots accept are known; anything else is
/// `application/octet-stream` and will be rejected by validation.
#[must_use]
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "eml" => "message/rfc822",
        _ => "application/octet-stream",
    }
}
