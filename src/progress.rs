//! Progress-callback trait for upload events.
//!
//! Inject an [`Arc<dyn UploadProgressCallback>`] via
//! [`crate::config::ClientConfigBuilder::progress_callback`] to receive
//! events while a file is sent to the conversion service.
//!
//! Session state changes (status, percentage, message) are also published on
//! the [`crate::Session::subscribe`] channel. The callback is the finer
//! grained of the two: it sees raw byte counts and the moment the body has
//! been fully handed to the transport.
//!
//! # Example
//!
//! ```rust
//! use docswap::{ClientConfig, UploadProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
//!
//! struct BytesSeen(AtomicU64);
//!
//! impl UploadProgressCallback for BytesSeen {
//!     fn on_bytes_sent(&self, loaded: u64, _total: Option<u64>) {
//!         self.0.store(loaded, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .progress_callback(Arc::new(BytesSeen(AtomicU64::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the uploader while a conversion attempt runs.
///
/// Implementations must be `Send + Sync`: byte events fire from inside the
/// HTTP client's body stream. Every method has a default no-op body.
///
/// For one attempt the order is: `on_upload_start`, zero or more
/// `on_bytes_sent` with non-decreasing `loaded`, `on_body_sent` after the
/// last chunk of a non-empty file, then exactly one of
/// `on_conversion_complete` or `on_conversion_error`.
pub trait UploadProgressCallback: Send + Sync {
    /// Called once the request is about to be sent.
    ///
    /// # Arguments
    /// * `file_name`   — name of the uploaded file
    /// * `total_bytes` — file size, `None` when unknown (empty file)
    fn on_upload_start(&self, file_name: &str, total_bytes: Option<u64>) {
        let _ = (file_name, total_bytes);
    }

    /// Cumulative bytes of the file handed to the transport.
    fn on_bytes_sent(&self, loaded: u64, total: Option<u64>) {
        let _ = (loaded, total);
    }

    /// The request body has been fully sent; the service is converting.
    fn on_body_sent(&self) {}

    /// Converted file saved.
    ///
    /// # Arguments
    /// * `file_name` — derived download name
    /// * `bytes`     — size of the converted file
    fn on_conversion_complete(&self, file_name: &str, bytes: u64) {
        let _ = (file_name, bytes);
    }

    /// Attempt ended in `Error`; `message` is what the session shows.
    fn on_conversion_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl UploadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ProgressCallback = Arc<dyn UploadProgressCallback>;

/// Integer percentage of `loaded` over `total`, rounded half up.
///
/// Returns `None` when the total is unknown or zero; callers keep the last
/// known percentage in that case.
pub fn percent(loaded: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)?;
    let scaled = (u128::from(loaded) * 200 + u128::from(total)) / (u128::from(total) * 2);
    Some(scaled.min(100) as u8)
}
