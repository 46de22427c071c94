//! Asset Resolver: turns each logical input into bytes on disk.
//!
//! Contract: exactly one fetch attempt per asset, exactly one file written
//! per asset into the request-scoped work directory, fail-fast. Retry
//! policy belongs to the caller.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

use crate::models::{AssetInput, AssetKind, MediaAsset, SourceForm};

/// Errors from asset resolution.
///
/// Fetch and decode failures are distinct kinds: a fetch failure is a
/// network/remote problem, a decode failure is a malformed inline payload.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP {status} fetching {url}")]
    FetchStatus { url: String, status: u16 },

    #[error("inline payload is not valid base64: {0}")]
    Decode(String),

    #[error("local file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Error kind string for the failure response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Fetch { .. }
            | ResolveError::FetchStatus { .. }
            | ResolveError::FileNotFound(_) => "AssetFetchError",
            ResolveError::Decode(_) => "AssetDecodeError",
            ResolveError::Io { .. } => "AssetFetchError",
        }
    }
}

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Resolves caller-supplied asset inputs into local files.
pub struct Resolver {
    client: reqwest::blocking::Client,
}

impl Resolver {
    /// Create a resolver whose HTTP fetches are bounded by `fetch_timeout`.
    ///
    /// Redirects are followed; any final non-2xx status is fatal.
    pub fn new(fetch_timeout: Duration) -> ResolveResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| ResolveError::Fetch {
                url: String::new(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    /// Resolve one asset into `<work_dir>/<kind filename>`.
    pub fn resolve(
        &self,
        input: &AssetInput,
        kind: AssetKind,
        work_dir: &Path,
    ) -> ResolveResult<MediaAsset> {
        let bytes = match input.form {
            SourceForm::Url => self.fetch_url(&input.value)?,
            SourceForm::Inline => decode_inline(&input.value)?,
            SourceForm::Path => read_local(Path::new(&input.value))?,
        };

        let target = work_dir.join(kind.local_filename());
        fs::write(&target, &bytes).map_err(|e| ResolveError::Io {
            path: target.clone(),
            source: e,
        })?;

        tracing::debug!(
            "Resolved {} asset ({} bytes) to {}",
            kind,
            bytes.len(),
            target.display()
        );

        Ok(MediaAsset {
            kind,
            source_form: input.form,
            resolved_path: target,
            size_bytes: bytes.len() as u64,
        })
    }

    fn fetch_url(&self, url: &str) -> ResolveResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ResolveError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(|e| ResolveError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Decode an inline base64 payload, tolerating an optional
/// `data:<mime>;base64,` prefix.
pub fn decode_inline(payload: &str) -> ResolveResult<Vec<u8>> {
    let encoded = strip_data_uri_prefix(payload);
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ResolveError::Decode(e.to_string()))
}

/// Strip a `data:<mime>;base64,` prefix when present.
fn strip_data_uri_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some(idx) = payload.find(";base64,") {
            return &payload[idx + ";base64,".len()..];
        }
    }
    payload
}

fn read_local(path: &Path) -> ResolveResult<Vec<u8>> {
    if !path.exists() {
        return Err(ResolveError::FileNotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(|e| ResolveError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
