//! The file a session converts: what it is, what it is called, and which of
//! the two supported formats it claims to be.
//!
//! Selection never validates. [`DocumentKind::from_file_name`] is consulted
//! only when the session submits, as a cheap local gate; the conversion
//! service does the authoritative check.

use bytes::Bytes;
use crate::error::ConvertError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One of the two formats the service converts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Classify a file name by the text after its last `.`, ignoring case.
    ///
    /// Returns `None` for names without a dot or with any other extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentKind::Docx),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }

    /// Extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Docx => "docx",
            DocumentKind::Pdf => "pdf",
        }
    }

    /// The format the service turns this one into.
    pub fn opposite(self) -> Self {
        match self {
            DocumentKind::Docx => DocumentKind::Pdf,
            DocumentKind::Pdf => DocumentKind::Docx,
        }
    }

    /// MIME type sent on the multipart part.
    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentKind::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// A user-provided file held in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    content: Bytes,
}

impl SelectedFile {
    /// Wrap bytes that already live in memory (drag-and-drop, tests).
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a file from disk; the selection keeps only its final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConvertError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ConvertError::FileNotFound {
                path: PathBuf::from(path),
            })?;
        debug!("Loaded {} ({} bytes)", name, content.len());
        Ok(Self {
            name,
            content: Bytes::from(content),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Cheap handle to the content; slices share the same allocation.
    pub fn bytes(&self) -> Bytes {
        self.content.clone()
    }

    /// Format claimed by the extension, if supported.
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_file_name(&self.name)
    }

    /// Size in megabytes with two decimals, e.g. `"1.50 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size() as f64 / 1024.0 / 1024.0)
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.content.len())
            .finish()
    }
}
