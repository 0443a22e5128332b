//! The HTTP round trip to the conversion service.
//!
//! One `POST` carrying a multipart form with a single file field. The file
//! part is a stream of fixed-size chunks; each chunk pulled by the transport
//! reports the cumulative byte count, which is how upload progress is
//! observed without hooking into the HTTP client's internals.
//!
//! The client-wide timeout bounds the whole exchange: sending, server-side
//! conversion and reading the reply.

use crate::config::ClientConfig;
use crate::document::SelectedFile;
use crate::error::ConvertError;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receives `(loaded, total)` as chunks are handed to the transport.
pub type ByteProgress = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// What the service answered.
#[derive(Debug)]
pub enum ServiceReply {
    /// 2xx: the body is the converted file.
    Converted {
        content_disposition: Option<String>,
        body: Bytes,
    },
    /// Non-2xx: the body should hold `{"error": "..."}` but may be anything.
    Rejected { status: u16, body: Bytes },
}

/// Thin wrapper over a configured [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct Uploader {
    client: Client,
    endpoint: String,
    field_name: String,
    chunk_size: usize,
    timeout_secs: u64,
}

impl Uploader {
    pub fn new(config: &ClientConfig) -> Result<Self, ConvertError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            field_name: config.field_name.clone(),
            chunk_size: config.chunk_size,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Send `file` and collect the reply.
    ///
    /// `Err` means no response was obtained: [`ConvertError::Timeout`] or
    /// [`ConvertError::Transport`]. A non-2xx status is a successful round
    /// trip and comes back as [`ServiceReply::Rejected`].
    pub async fn send(
        &self,
        file: &SelectedFile,
        on_progress: ByteProgress,
    ) -> Result<ServiceReply, ConvertError> {
        let form = self.build_form(file, on_progress)?;

        info!(
            "Uploading {} ({} bytes) to {}",
            file.name(),
            file.size(),
            self.endpoint
        );
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        debug!("Service answered HTTP {}", status);

        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| self.map_transport_error(e))?;
            Ok(ServiceReply::Converted {
                content_disposition,
                body,
            })
        } else {
            // A body we cannot read is treated as empty; the interpreter
            // falls back to its generic message.
            let body = match response.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    warn!("Could not read error body: {}", e);
                    Bytes::new()
                }
            };
            Ok(ServiceReply::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn build_form(
        &self,
        file: &SelectedFile,
        on_progress: ByteProgress,
    ) -> Result<Form, ConvertError> {
        let total = Some(file.size()).filter(|t| *t > 0);
        let chunks = split_chunks(file.bytes(), self.chunk_size);

        let mut loaded = 0u64;
        let body_stream = stream::iter(chunks).map(move |chunk| {
            loaded += chunk.len() as u64;
            on_progress(loaded, total);
            Ok::<_, std::io::Error>(chunk)
        });

        let mut part =
            Part::stream_with_length(Body::wrap_stream(body_stream), file.size())
                .file_name(file.name().to_string());
        if let Some(kind) = file.kind() {
            part = part.mime_str(kind.mime_type()).map_err(|e| {
                ConvertError::Internal(format!("Invalid MIME type for {}: {}", kind, e))
            })?;
        }

        Ok(Form::new().part(self.field_name.clone(), part))
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ConvertError {
        if e.is_timeout() {
            ConvertError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ConvertError::Transport {
                endpoint: self.endpoint.clone(),
                reason: describe(&e),
            }
        }
    }
}

/// Views of at most `chunk_size` bytes over `content`, without copying.
fn split_chunks(content: Bytes, chunk_size: usize) -> Vec<Bytes> {
    (0..content.len())
        .step_by(chunk_size)
        .map(|start| content.slice(start..(start + chunk_size).min(content.len())))
        .collect()
}

/// Flatten the error chain: reqwest's top-level message alone is usually
/// just "error sending request".
fn describe(e: &reqwest::Error) -> String {
    let mut out = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}
