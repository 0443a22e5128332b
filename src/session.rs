//! The conversion session: one selected file, one attempt at a time.
//!
//! ```text
//!            submit()                 2xx + saved
//!   Idle ───────────────▶ Uploading ─────────────▶ Done
//!    ▲                        │
//!    │ reset()                │ timeout / network / non-2xx / save failed
//!    │                        ▼
//!    └──────────────────── Error
//! ```
//!
//! `Done` and `Error` only return to `Idle` through [`Session::reset`]. A new
//! selection leaves the status alone; the next `submit` re-enters
//! `Uploading`. Validation failures (no file, wrong extension) never leave
//! the current status; they only set the message.
//!
//! State lives in a [`tokio::sync::watch`] channel. All writes go through the
//! methods below, and presentation layers read snapshots or
//! [`Session::subscribe`] to changes.
//!
//! ## Single flight
//!
//! A session runs at most one upload. `submit` claims an atomic flag before
//! doing anything else; a second concurrent call gets
//! [`ConvertError::UploadInFlight`] and the state is not touched. The flag is
//! released when the claiming call returns or its future is dropped.
//!
//! ## Reset during an upload
//!
//! `reset` does not abort the request. Each attempt is numbered and a reset
//! bumps the number, so progress and the terminal write of the superseded
//! attempt are dropped and nothing is downloaded for it. The session stays
//! `Idle` and the late `submit` returns [`ConvertError::Discarded`].

use crate::config::ClientConfig;
use crate::document::SelectedFile;
use crate::error::{ConvertError, MSG_EXTENSION, MSG_NO_FILE};
use crate::pipeline::download::PendingDownload;
use crate::pipeline::response;
use crate::pipeline::upload::{ByteProgress, ServiceReply, Uploader};
use crate::progress::{percent, ProgressCallback};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Uploading,
    Done,
    Error,
}

/// Snapshot of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    selected_file: Option<Arc<SelectedFile>>,
    status: SessionStatus,
    progress_percent: u8,
    message: String,
    saved_to: Option<PathBuf>,
    attempt: u64,
}

impl SessionState {
    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// 0–100; meaningful while `Uploading` and after `Done`.
    ///
    /// Tracks bytes handed to the transport, so it can read 100 while still
    /// `Uploading` (body sent, service converting). An `Error` keeps the last
    /// value reached; only `Done` guarantees 100.
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Status or error text; empty when there is nothing to say.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the last successful attempt saved its file.
    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    /// Serializable view for `--json` output and UIs.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            file_name: self.selected_file.as_ref().map(|f| f.name().to_string()),
            file_size: self.selected_file.as_ref().map(|f| f.size()),
            status: self.status,
            progress_percent: self.progress_percent,
            message: self.message.clone(),
            saved_to: self.saved_to.clone(),
        }
    }
}

/// Flat, serializable form of [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub status: SessionStatus,
    pub progress_percent: u8,
    pub message: String,
    pub saved_to: Option<PathBuf>,
}

/// Drives selection, upload, interpretation and download for one file.
pub struct Session {
    uploader: Uploader,
    download_dir: PathBuf,
    overwrite: bool,
    progress: Option<ProgressCallback>,
    state: Arc<watch::Sender<SessionState>>,
    in_flight: AtomicBool,
}

impl Session {
    /// New `Idle` session with no file selected.
    pub fn new(config: &ClientConfig) -> Result<Self, ConvertError> {
        let (tx, _rx) = watch::channel(SessionState::default());
        Ok(Self {
            uploader: Uploader::new(config)?,
            download_dir: config.download_dir.clone(),
            overwrite: config.overwrite,
            progress: config.progress_callback.clone(),
            state: Arc::new(tx),
            in_flight: AtomicBool::new(false),
        })
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Whether a `submit` is currently running.
    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replace the selection. No validation happens here.
    pub fn select_file(&self, file: SelectedFile) {
        debug!("Selected {:?}", file);
        let file = Arc::new(file);
        self.state.send_modify(|s| s.selected_file = Some(file));
    }

    /// Drop the selection.
    pub fn clear_file(&self) {
        self.state.send_modify(|s| s.selected_file = None);
    }

    /// Back to `Idle`: no file, 0 %, empty message.
    ///
    /// Does not abort an upload in flight; see the module docs.
    pub fn reset(&self) {
        self.state.send_modify(|s| {
            let attempt = s.attempt + 1;
            *s = SessionState {
                attempt,
                ..SessionState::default()
            };
        });
        debug!("Session reset");
    }

    /// Convert the selected file and save the result.
    ///
    /// The session state (status, progress, message) is updated before this
    /// returns; the `Result` carries the same outcome for callers that prefer
    /// to branch on it. On success, returns the path of the saved file.
    pub async fn submit(&self) -> Result<PathBuf, ConvertError> {
        let _flight = FlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            warn!("submit() rejected: upload already in flight");
            ConvertError::UploadInFlight
        })?;

        let selected = self.state.borrow().selected_file.clone();
        let Some(file) = selected else {
            self.set_message(MSG_NO_FILE);
            return Err(ConvertError::NoFileSelected);
        };
        if file.kind().is_none() {
            self.set_message(MSG_EXTENSION);
            return Err(ConvertError::UnsupportedExtension {
                name: file.name().to_string(),
            });
        }

        let attempt = self.begin_attempt();
        let total = Some(file.size()).filter(|t| *t > 0);
        if let Some(cb) = &self.progress {
            cb.on_upload_start(file.name(), total);
        }

        let reply = self
            .uploader
            .send(&file, self.byte_progress(attempt))
            .await;

        match reply {
            Ok(ServiceReply::Converted {
                content_disposition,
                body,
            }) => {
                let name = response::derive_filename(content_disposition.as_deref(), file.name());
                self.deliver(attempt, PendingDownload::new(name, body)).await
            }
            Ok(ServiceReply::Rejected { status, body }) => {
                let message = response::error_message_from_body(&body);
                warn!("Service rejected {}: HTTP {} ({})", file.name(), status, message);
                self.fail(attempt, ConvertError::Service { status, message })
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", file.name(), e);
                self.fail(attempt, e)
            }
        }
    }

    async fn deliver(
        &self,
        attempt: u64,
        pending: PendingDownload,
    ) -> Result<PathBuf, ConvertError> {
        if !self.is_current(attempt) {
            info!("Discarding result of attempt {} after reset", attempt);
            return Err(ConvertError::Discarded);
        }

        let bytes = pending.len();
        match pending.deliver(&self.download_dir, self.overwrite).await {
            Ok(path) => {
                let shown = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let saved = path.clone();
                let applied = self.finish(attempt, |s| {
                    s.status = SessionStatus::Done;
                    s.progress_percent = 100;
                    s.message = format!("Conversion finished. Saved as {}.", shown);
                    s.saved_to = Some(saved);
                });
                if !applied {
                    // Reset landed while the file was being written.
                    info!("Discarding {} after reset", path.display());
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        warn!("Could not remove {}: {}", path.display(), e);
                    }
                    return Err(ConvertError::Discarded);
                }
                if let Some(cb) = &self.progress {
                    cb.on_conversion_complete(&shown, bytes);
                }
                info!("Conversion finished: {} ({} bytes)", path.display(), bytes);
                Ok(path)
            }
            Err(e) => self.fail(attempt, e),
        }
    }

    fn fail(&self, attempt: u64, error: ConvertError) -> Result<PathBuf, ConvertError> {
        let message = failure_message(&error);
        let applied = self.finish(attempt, |s| {
            s.status = SessionStatus::Error;
            s.message = message.clone();
        });
        if !applied {
            return Err(ConvertError::Discarded);
        }
        if let Some(cb) = &self.progress {
            cb.on_conversion_error(&message);
        }
        Err(error)
    }

    fn begin_attempt(&self) -> u64 {
        let mut attempt = 0;
        self.state.send_modify(|s| {
            s.attempt += 1;
            attempt = s.attempt;
            s.status = SessionStatus::Uploading;
            s.progress_percent = 0;
            s.message.clear();
            s.saved_to = None;
        });
        attempt
    }

    fn byte_progress(&self, attempt: u64) -> ByteProgress {
        let state = Arc::clone(&self.state);
        let cb = self.progress.clone();
        Arc::new(move |loaded: u64, total: Option<u64>| {
            if let Some(cb) = &cb {
                cb.on_bytes_sent(loaded, total);
                if total == Some(loaded) {
                    cb.on_body_sent();
                }
            }
            let Some(pct) = percent(loaded, total) else {
                return;
            };
            state.send_if_modified(|s| {
                if s.attempt != attempt
                    || s.status != SessionStatus::Uploading
                    || pct <= s.progress_percent
                {
                    return false;
                }
                s.progress_percent = pct;
                true
            });
        })
    }

    /// Apply a terminal write if `attempt` is still the current one.
    fn finish(&self, attempt: u64, apply: impl FnOnce(&mut SessionState)) -> bool {
        self.state.send_if_modified(|s| {
            if s.attempt != attempt {
                return false;
            }
            apply(s);
            true
        })
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.state.borrow().attempt == attempt
    }

    fn set_message(&self, message: &str) {
        self.state.send_modify(|s| s.message = message.to_string());
    }
}

/// Text the session shows for a failed attempt. Never empty.
fn failure_message(error: &ConvertError) -> String {
    match error {
        ConvertError::Service { message, .. } => message.clone(),
        ConvertError::Transport { reason, .. } => {
            response::transport_failure_message(Some(reason.as_str()))
        }
        ConvertError::Timeout { secs } => response::transport_failure_message(Some(
            format!("Conversion timed out after {secs}s.").as_str(),
        )),
        ConvertError::OutputWriteFailed { .. } => error.to_string(),
        _ => response::transport_failure_message(None),
    }
}

/// Holds the in-flight flag for the lifetime of one `submit`.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MSG_GENERIC;

    fn session() -> Session {
        let config = ClientConfig::builder()
            .endpoint("http://127.0.0.1:9/convert")
            .build()
            .unwrap();
        Session::new(&config).unwrap()
    }

    #[test]
    fn starts_idle_and_empty() {
        let s = session().state();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert!(s.selected_file().is_none());
        assert_eq!(s.progress_percent(), 0);
        assert!(s.message().is_empty());
    }

    #[tokio::test]
    async fn submit_without_file_sets_guidance() {
        let session = session();
        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, ConvertError::NoFileSelected));

        let s = session.state();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.message(), MSG_NO_FILE);
        assert!(!session.is_uploading());
    }

    #[tokio::test]
    async fn submit_rejects_other_extensions() {
        let session = session();
        for name in ["notes.txt", "old.DOC", "README", "slides.pptx"] {
            session.select_file(SelectedFile::from_bytes(name, b"x".to_vec()));
            let err = session.submit().await.unwrap_err();
            assert!(
                matches!(err, ConvertError::UnsupportedExtension { .. }),
                "{name}"
            );
            assert_eq!(session.state().message(), MSG_EXTENSION);
            assert_eq!(session.state().status(), SessionStatus::Idle);
        }
    }

    #[tokio::test]
    async fn concurrent_submit_is_rejected_without_touching_state() {
        let session = session();
        session.select_file(SelectedFile::from_bytes("a.pdf", b"%PDF".to_vec()));
        session.in_flight.store(true, Ordering::SeqCst);

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, ConvertError::UploadInFlight));
        assert_eq!(session.state().status(), SessionStatus::Idle);
        assert!(session.state().message().is_empty());
        // The rejected call must not release someone else's claim.
        assert!(session.is_uploading());
    }

    #[test]
    fn selection_does_not_change_status() {
        let session = session();
        session.state.send_modify(|s| {
            s.status = SessionStatus::Error;
            s.message = "boom".into();
        });
        session.select_file(SelectedFile::from_bytes("b.docx", vec![1]));
        let s = session.state();
        assert_eq!(s.status(), SessionStatus::Error);
        assert_eq!(s.selected_file().map(|f| f.name()), Some("b.docx"));

        session.clear_file();
        assert!(session.state().selected_file().is_none());
        assert_eq!(session.state().status(), SessionStatus::Error);
    }

    #[test]
    fn reset_from_any_state() {
        let session = session();
        for status in [
            SessionStatus::Idle,
            SessionStatus::Uploading,
            SessionStatus::Done,
            SessionStatus::Error,
        ] {
            session.select_file(SelectedFile::from_bytes("c.pdf", vec![1]));
            session.state.send_modify(|s| {
                s.status = status;
                s.progress_percent = 42;
                s.message = "something".into();
            });
            session.reset();
            let s = session.state();
            assert_eq!(s.status(), SessionStatus::Idle);
            assert!(s.selected_file().is_none());
            assert_eq!(s.progress_percent(), 0);
            assert!(s.message().is_empty());
        }
    }

    #[test]
    fn progress_ignores_stale_and_decreasing_updates() {
        let session = session();
        let attempt = session.begin_attempt();
        let report = session.byte_progress(attempt);

        report(50, Some(100));
        assert_eq!(session.state().progress_percent(), 50);
        report(20, Some(100));
        assert_eq!(session.state().progress_percent(), 50);
        report(70, None);
        assert_eq!(session.state().progress_percent(), 50);

        session.reset();
        report(90, Some(100));
        assert_eq!(session.state().progress_percent(), 0);
    }

    #[test]
    fn stale_terminal_write_is_dropped() {
        let session = session();
        let attempt = session.begin_attempt();
        session.reset();
        let err = session
            .fail(attempt, ConvertError::Timeout { secs: 1 })
            .unwrap_err();
        assert!(matches!(err, ConvertError::Discarded));
        assert_eq!(session.state().status(), SessionStatus::Idle);
    }

    #[derive(Default)]
    struct Completions(std::sync::atomic::AtomicUsize);

    impl crate::progress::UploadProgressCallback for Completions {
        fn on_conversion_complete(&self, _file_name: &str, _bytes: u64) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn reset_while_saving_removes_the_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let completions = Arc::new(Completions::default());
        let config = ClientConfig::builder()
            .endpoint("http://127.0.0.1:9/convert")
            .download_dir(dir.path())
            .progress_callback(completions.clone())
            .build()
            .unwrap();
        let session = Session::new(&config).unwrap();
        let attempt = session.begin_attempt();

        // The write runs on the blocking pool; the reset lands meanwhile.
        let (result, ()) = tokio::join!(
            session.deliver(attempt, PendingDownload::new("out.pdf", b"%PDF".to_vec())),
            async { session.reset() },
        );

        assert!(matches!(result, Err(ConvertError::Discarded)), "got {result:?}");
        let s = session.state();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert!(s.message().is_empty());
        assert!(s.saved_to().is_none());
        assert_eq!(completions.0.load(Ordering::SeqCst), 0);
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn failure_messages_are_never_empty() {
        assert_eq!(
            failure_message(&ConvertError::Transport {
                endpoint: "x".into(),
                reason: String::new(),
            }),
            MSG_GENERIC
        );
        assert_eq!(
            failure_message(&ConvertError::Timeout { secs: 300 }),
            "Conversion timed out after 300s."
        );
        assert_eq!(
            failure_message(&ConvertError::Internal("x".into())),
            MSG_GENERIC
        );
    }

    #[test]
    fn summary_serializes() {
        let session = session();
        session.select_file(SelectedFile::from_bytes("d.docx", vec![0; 10]));
        let json = serde_json::to_value(session.state().summary()).unwrap();
        assert_eq!(json["file_name"], "d.docx");
        assert_eq!(json["file_size"], 10);
        assert_eq!(json["status"], "idle");
    }
}
