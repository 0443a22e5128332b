//! # docswap
//!
//! Send a DOCX or PDF to a document-conversion service and save what comes
//! back (`.docx` → `.pdf`, `.pdf` → `.docx`).
//!
//! The conversion itself happens remotely. This crate owns the client side:
//! picking the file, uploading it with progress, making sense of the reply
//! and writing the converted file to disk.
//!
//! ## Attempt Overview
//!
//! ```text
//! select_file ──▶ submit
//!                  │
//!                  ├─ 1. Validate  file selected? .docx / .pdf?
//!                  ├─ 2. Upload    multipart POST, progress per chunk, 5 min timeout
//!                  ├─ 3. Interpret 2xx → filename; else → error message
//!                  └─ 4. Download  temp file → persisted under the derived name
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docswap::{ClientConfig, SelectedFile, Session, SessionStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .endpoint("http://localhost:7000/convert")
//!         .build()?;
//!     let session = Session::new(&config)?;
//!     session.select_file(SelectedFile::from_path("report.docx").await?);
//!
//!     let _ = session.submit().await;
//!     let state = session.state();
//!     if state.status() == SessionStatus::Done {
//!         println!("{}", state.message());
//!     } else {
//!         eprintln!("{}", state.message());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Service Contract
//!
//! * Request: `POST <endpoint>`, multipart form, one part named `file`.
//! * Success: 2xx, body = converted bytes, optional `Content-Disposition`.
//! * Failure: non-2xx, body ideally `{"error": "..."}`.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docswap` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_ENDPOINT};
pub use convert::{convert_file, convert_file_sync};
pub use document::{DocumentKind, SelectedFile};
pub use error::{ConvertError, ErrorCategory};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use session::{Session, SessionState, SessionStatus, SessionSummary};
