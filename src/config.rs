//! Configuration for talking to the conversion service.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. One struct holds every knob so the CLI, tests and
//! library callers construct sessions the same way.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:7000/convert";

/// Multipart field carrying the document.
pub const DEFAULT_FIELD_NAME: &str = "file";

/// Configuration for a conversion [`crate::Session`].
///
/// # Example
/// ```rust
/// use docswap::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .endpoint("https://convert.example.com/convert")
///     .timeout_secs(120)
///     .download_dir("/tmp")
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, 120);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Conversion endpoint receiving the `POST`. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Name of the multipart field holding the file. Default: `"file"`.
    pub field_name: String,

    /// Whole-request timeout in seconds. Default: 300.
    ///
    /// Covers sending the document, the service's conversion time and
    /// receiving the result. Large scanned PDFs can take minutes server-side.
    pub timeout_secs: u64,

    /// Size of each body chunk handed to the transport. Default: 64 KiB.
    ///
    /// Progress is reported once per chunk, so this bounds how often
    /// [`crate::UploadProgressCallback::on_bytes_sent`] fires.
    pub chunk_size: usize,

    /// Directory converted files are saved into. Default: current directory.
    pub download_dir: PathBuf,

    /// Replace an existing file with the same name. Default: false.
    ///
    /// When false, `name (1).ext`, `name (2).ext`, ... is used instead.
    pub overwrite: bool,

    /// Optional upload progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            timeout_secs: 300,
            chunk_size: 64 * 1024,
            download_dir: PathBuf::from("."),
            overwrite: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("field_name", &self.field_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("chunk_size", &self.chunk_size)
            .field("download_dir", &self.download_dir)
            .field("overwrite", &self.overwrite)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn UploadProgressCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.config.field_name = name.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    /// Attach a progress observer.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ConvertError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.endpoint).map_err(|e| {
            ConvertError::InvalidConfig(format!("endpoint '{}' is not a URL: {}", c.endpoint, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConvertError::InvalidConfig(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.field_name.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "multipart field name must not be empty".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        if c.chunk_size < 1024 {
            return Err(ConvertError::InvalidConfig(format!(
                "Chunk size must be ≥ 1024 bytes, got {}",
                c.chunk_size
            )));
        }
        Ok(self.config)
    }
}
