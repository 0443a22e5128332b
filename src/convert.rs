//! One-shot entry points: select, submit, return the saved path.
//!
//! Use [`crate::Session`] directly when you need to observe state changes,
//! retry, or keep a selection around between attempts.

use crate::config::ClientConfig;
use crate::document::SelectedFile;
use crate::error::ConvertError;
use crate::session::Session;
use std::path::{Path, PathBuf};
use tracing::info;

/// Convert the document at `path` and save the result in
/// `config.download_dir`.
///
/// # Example
/// ```rust,no_run
/// use docswap::{convert_file, ClientConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder().download_dir("out").build()?;
/// let saved = convert_file("report.docx", &config).await?;
/// println!("saved {}", saved.display());
/// # Ok(())
/// # }
/// ```
pub async fn convert_file(
    path: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<PathBuf, ConvertError> {
    let path = path.as_ref();
    info!("Converting {}", path.display());
    let session = Session::new(config)?;
    session.select_file(SelectedFile::from_path(path).await?);
    session.submit().await
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_file_sync(
    path: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<PathBuf, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(path, config))
}
