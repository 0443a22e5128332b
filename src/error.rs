//! Error types for the docswap library.
//!
//! Every failure of a conversion attempt is a [`ConvertError`]. The session
//! always records a human-readable message before one of these is returned,
//! so a presentation layer can either show [`crate::SessionState::message`]
//! or match on the error itself.
//!
//! [`ErrorCategory`] groups the variants the way a user experiences them:
//!
//! * **Validation** — caught locally, nothing was sent. Fix the selection.
//! * **Transport** — the request never produced a response (network, timeout).
//! * **Service** — the conversion service answered with a non-2xx status.
//! * **Delivery** — the converted bytes arrived but could not be saved.
//! * **Usage** — programming or configuration mistakes on the caller's side.

use std::path::PathBuf;
use thiserror::Error;

/// Guidance shown when `submit` is called without a selected file.
pub const MSG_NO_FILE: &str = "Please choose a DOCX or PDF file first.";

/// Shown when the selected file is neither `.docx` nor `.pdf`.
pub const MSG_EXTENSION: &str = "Only .docx or .pdf files are allowed.";

/// Fallback when an error body cannot be decoded or parsed.
pub const MSG_SERVER_ERROR: &str = "Conversion failed (server error).";

/// Used when an error body parses but carries no `error` field.
pub const MSG_SERVICE_NO_DETAIL: &str = "Conversion failed";

/// Fallback for transport failures that carry no description.
pub const MSG_GENERIC: &str = "Conversion failed.";

/// All errors returned by the docswap library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// `submit` was called with nothing selected.
    #[error("{}", MSG_NO_FILE)]
    NoFileSelected,

    /// The selected file is not a `.docx` or `.pdf`.
    #[error("{} Got '{name}'.", MSG_EXTENSION)]
    UnsupportedExtension { name: String },

    /// Another `submit` on the same session has not finished yet.
    #[error("An upload is already in progress for this session")]
    UploadInFlight,

    /// The session was reset while this attempt was running; its result
    /// was dropped.
    #[error("Conversion result discarded because the session was reset")]
    Discarded,

    // ── Input errors ──────────────────────────────────────────────────────
    /// The file to select does not exist.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request failed before any response arrived.
    #[error("Upload to '{endpoint}' failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// No response within the configured timeout.
    #[error("Conversion timed out after {secs}s\nIncrease --timeout for large documents.")]
    Timeout { secs: u64 },

    // ── Service errors ────────────────────────────────────────────────────
    /// The service answered with a non-2xx status.
    ///
    /// `message` is the body's `error` field when it could be parsed,
    /// otherwise a generic fallback.
    #[error("Conversion service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    // ── Delivery errors ───────────────────────────────────────────────────
    /// The converted file could not be written to the download directory.
    #[error("Failed to save converted file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse grouping of [`ConvertError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Transport,
    Service,
    Delivery,
    Usage,
}

impl ConvertError {
    /// The category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::NoFileSelected | ConvertError::UnsupportedExtension { .. } => {
                ErrorCategory::Validation
            }
            ConvertError::Transport { .. } | ConvertError::Timeout { .. } => {
                ErrorCategory::Transport
            }
            ConvertError::Service { .. } => ErrorCategory::Service,
            ConvertError::OutputWriteFailed { .. } => ErrorCategory::Delivery,
            ConvertError::UploadInFlight
            | ConvertError::Discarded
            | ConvertError::FileNotFound { .. }
            | ConvertError::ReadFailed { .. }
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => ErrorCategory::Usage,
        }
    }

    /// Whether calling `submit` again (unchanged) might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Transport | ErrorCategory::Service | ErrorCategory::Delivery
        )
    }
}
