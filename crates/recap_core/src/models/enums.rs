//! Core enums used throughout the engine.

use serde::{Deserialize, Serialize};

/// Kind of media an asset contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Image,
    Audio,
}

impl AssetKind {
    /// Filename used for this asset inside the request work directory.
    ///
    /// Names are fixed per kind; uniqueness comes from the per-job directory.
    pub fn local_filename(&self) -> &'static str {
        match self {
            AssetKind::Video => "video.mp4",
            AssetKind::Image => "chart.png",
            AssetKind::Audio => "audio.mp3",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::Video => write!(f, "video"),
            AssetKind::Image => write!(f, "image"),
            AssetKind::Audio => write!(f, "audio"),
        }
    }
}

/// How an asset is supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceForm {
    /// Fetchable URL (HTTP GET, redirects followed).
    Url,
    /// Base64-encoded payload, optionally with a `data:<mime>;base64,` prefix.
    Inline,
    /// Path to a file already on the local filesystem.
    Path,
}

impl std::fmt::Display for SourceForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceForm::Url => write!(f, "url"),
            SourceForm::Inline => write!(f, "inline"),
            SourceForm::Path => write!(f, "path"),
        }
    }
}

/// How the rendered artifact is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Base64 data URI in the response body.
    #[default]
    Inline,
    /// Uploaded to the configured object store; response carries the URL.
    Uploaded,
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMode::Inline => write!(f, "inline"),
            DeliveryMode::Uploaded => write!(f, "uploaded"),
        }
    }
}

/// Lifecycle status of a compose job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Probing,
    Planning,
    Rendering,
    Publishing,
    Done,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Probing => write!(f, "probing"),
            JobStatus::Planning => write!(f, "planning"),
            JobStatus::Rendering => write!(f, "rendering"),
            JobStatus::Publishing => write!(f, "publishing"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_kind_filenames_are_distinct() {
        assert_ne!(
            AssetKind::Video.local_filename(),
            AssetKind::Image.local_filename()
        );
        assert_ne!(
            AssetKind::Image.local_filename(),
            AssetKind::Audio.local_filename()
        );
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&SourceForm::Inline).unwrap(),
            "\"inline\""
        );
        assert_eq!(
            serde_json::to_string(&DeliveryMode::Uploaded).unwrap(),
            "\"uploaded\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Rendering).unwrap(),
            "\"rendering\""
        );
    }
}
