//! Stages of one conversion attempt.
//!
//! ## Data Flow
//!
//! ```text
//! SelectedFile ──▶ upload ──▶ response ──▶ download
//!                  (POST)     (name/msg)   (temp file → persist)
//! ```
//!
//! 1. [`upload`]   — multipart `POST` with a progress-reporting body; the
//!    only stage with network I/O
//! 2. [`response`] — classify the reply, derive the download name or the
//!    error message; infallible
//! 3. [`download`] — write the converted bytes exactly once

pub mod download;
pub mod response;
pub mod upload;
