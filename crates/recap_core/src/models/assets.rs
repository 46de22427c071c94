//! Asset descriptors: caller-supplied inputs and their resolved local form.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::{AssetKind, SourceForm};

/// A caller-supplied asset reference, before resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetInput {
    /// How the value should be interpreted.
    pub form: SourceForm,
    /// URL, base64 payload, or local path depending on `form`.
    pub value: String,
}

impl AssetInput {
    pub fn url(value: impl Into<String>) -> Self {
        Self {
            form: SourceForm::Url,
            value: value.into(),
        }
    }

    pub fn inline(value: impl Into<String>) -> Self {
        Self {
            form: SourceForm::Inline,
            value: value.into(),
        }
    }

    pub fn path(value: impl Into<String>) -> Self {
        Self {
            form: SourceForm::Path,
            value: value.into(),
        }
    }
}

/// An asset after resolution: bytes on disk in the request work directory.
///
/// Lives exactly as long as the request; the work directory (and with it
/// every resolved asset) is deleted when the job finishes, on every exit
/// path.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub kind: AssetKind,
    pub source_form: SourceForm,
    pub resolved_path: PathBuf,
    pub size_bytes: u64,
}

/// The full set of resolved inputs for one compose job.
#[derive(Debug, Clone)]
pub struct ResolvedAssets {
    pub video: MediaAsset,
    pub chart: MediaAsset,
    pub audio: Option<MediaAsset>,
}

impl ResolvedAssets {
    /// Whether a background audio track was supplied.
    pub fn has_background_audio(&self) -> bool {
        self.audio.is_some()
    }
}
