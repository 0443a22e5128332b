//! Delivering the converted bytes as a file.
//!
//! A [`PendingDownload`] is created once per successful response and
//! consumed by [`PendingDownload::deliver`], so a second delivery of the
//! same response does not type-check. Bytes are written to a
//! [`tempfile::NamedTempFile`] inside the target directory and then
//! persisted under the final name. If anything fails before the persist,
//! dropping the temp file removes it; nothing half-written is left behind
//! under the user-visible name.

use crate::error::ConvertError;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Converted bytes waiting to be written.
#[derive(Debug)]
pub struct PendingDownload {
    file_name: String,
    bytes: Bytes,
}

impl PendingDownload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the file into `dir` and return its final path.
    ///
    /// Without `overwrite`, an existing `name.ext` leads to `name (1).ext`,
    /// `name (2).ext`, ... as browsers do. Blocking I/O runs on the blocking
    /// pool.
    pub async fn deliver(self, dir: &Path, overwrite: bool) -> Result<PathBuf, ConvertError> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || self.deliver_blocking(&dir, overwrite))
            .await
            .map_err(|e| ConvertError::Internal(format!("Download task failed: {}", e)))?
    }

    fn deliver_blocking(self, dir: &Path, overwrite: bool) -> Result<PathBuf, ConvertError> {
        let wanted = dir.join(&self.file_name);
        let write_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: wanted.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&self.bytes).map_err(write_err)?;
        tmp.flush().map_err(write_err)?;
        debug!("Staged {} bytes at {}", self.bytes.len(), tmp.path().display());

        let target = if overwrite {
            tmp.persist(&wanted).map_err(|e| write_err(e.error))?;
            wanted.clone()
        } else {
            persist_unique(tmp, dir, &self.file_name, MAX_NUMBERED).map_err(write_err)?
        };

        info!("Saved {}", target.display());
        Ok(target)
    }
}

/// Highest `(n)` suffix tried before giving up on a free name.
pub const MAX_NUMBERED: u32 = 9_999;

/// Persist without clobbering, numbering the name until one is free.
fn persist_unique(
    mut tmp: NamedTempFile,
    dir: &Path,
    file_name: &str,
    max_n: u32,
) -> Result<PathBuf, std::io::Error> {
    for n in 0..=max_n {
        let candidate = dir.join(numbered_name(file_name, n));
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(e.error),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free name for '{}' up to ({})", file_name, max_n),
    ))
}

/// `report.pdf` with `n = 2` → `report (2).pdf`; `n = 0` leaves it unchanged.
pub fn numbered_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({n}).{ext}"),
        _ => format!("{file_name} ({n})"),
    }
}
