//! Response interpretation: turn what the service sent back into a download
//! name or a message for the user.
//!
//! Nothing here can fail. Every function returns a usable string so the
//! session's terminal `message` is always assigned.
//!
//! ## Filename derivation
//!
//! 1. `Content-Disposition` header: RFC 5987 `filename*=UTF-8''…` or plain
//!    `filename="…"` / `filename=…`, percent-decoded.
//! 2. Otherwise [`fallback_filename`]: the uploaded name with its extension
//!    swapped for the other supported one. This is a heuristic. It assumes
//!    the service always performs exactly that inversion and nothing checks
//!    it; replace it here if the service contract changes.

use crate::document::DocumentKind;
use crate::error::{MSG_GENERIC, MSG_SERVER_ERROR, MSG_SERVICE_NO_DETAIL};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

/// Name used when nothing better can be derived.
pub const GENERIC_FILENAME: &str = "converted-file";

static RE_DISPOSITION_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)filename\*=UTF-8''([^;]+)|filename="?([^";]+)"?"#).unwrap()
});

/// Extract the filename from a `Content-Disposition` value.
///
/// The extended form wins when it comes first; both forms are
/// percent-decoded. Path components are stripped, and names that end up
/// empty, `.` or `..` count as no match.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let caps = RE_DISPOSITION_FILENAME.captures(header)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    sanitize(&decoded)
}

/// Swap the uploaded file's extension for the opposite supported one.
///
/// `report.docx` → `report.pdf`, `report.pdf` → `report.docx`. A name with
/// neither extension yields [`GENERIC_FILENAME`].
pub fn fallback_filename(uploaded: &str) -> String {
    let Some(kind) = DocumentKind::from_file_name(uploaded) else {
        warn!(
            "Cannot infer output name for '{}'; using '{}'",
            uploaded, GENERIC_FILENAME
        );
        return GENERIC_FILENAME.to_string();
    };
    let base = uploaded
        .rsplit_once('.')
        .map(|(base, _)| base)
        .unwrap_or(uploaded);
    format!("{}.{}", base, kind.opposite().extension())
}

/// Pick the download name: header first, inversion heuristic second.
pub fn derive_filename(disposition: Option<&str>, uploaded: &str) -> String {
    if let Some(name) = disposition.and_then(filename_from_disposition) {
        debug!("Filename from Content-Disposition: {}", name);
        return name;
    }
    let name = fallback_filename(uploaded);
    debug!("Filename from extension inversion: {}", name);
    name
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Message for a non-2xx response body.
///
/// Decodes the bytes as UTF-8, parses JSON and reads `error`. A parsed
/// body without a non-empty `error` gives [`MSG_SERVICE_NO_DETAIL`]; any
/// decode or parse failure gives [`MSG_SERVER_ERROR`].
pub fn error_message_from_body(body: &[u8]) -> String {
    let text = match std::str::from_utf8(body) {
        Ok(t) => t,
        Err(e) => {
            debug!("Error body is not UTF-8: {}", e);
            return MSG_SERVER_ERROR.to_string();
        }
    };
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody { error: Some(msg) }) if !msg.is_empty() => msg,
        Ok(_) => MSG_SERVICE_NO_DETAIL.to_string(),
        Err(e) => {
            debug!("Error body is not the expected JSON: {}", e);
            MSG_SERVER_ERROR.to_string()
        }
    }
}

/// Message for a request that produced no response at all.
pub fn transport_failure_message(reason: Option<&str>) -> String {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => MSG_GENERIC.to_string(),
    }
}

fn sanitize(name: &str) -> Option<String> {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .trim_matches('\0');
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}
