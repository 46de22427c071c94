//! Artifact Publisher: delivers the rendered file and tears down the work
//! directory.
//!
//! Delivery is all-or-nothing: either the artifact reaches the caller in
//! the requested form or the job fails. Cleanup is best-effort and never
//! turns a successful render into a failure.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use thiserror::Error;

use crate::models::{ArtifactForm, DeliveryMode, OutputArtifact};

/// Errors from an object store backend.
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// The target name already exists and the store refuses overwrites.
    #[error("object '{0}' already exists")]
    NameExists(String),

    #[error("store operation failed: {0}")]
    Other(String),
}

/// Destination for uploaded artifacts.
///
/// `put` stores the bytes under `name` and returns a URL the caller can
/// retrieve them from. Implementations decide whether an existing name is
/// an error or an overwrite; the built-in pipeline treats [`ObjectStoreError::NameExists`]
/// as fatal and reports it distinctly.
pub trait ObjectStore: Send + Sync {
    fn put(&self, name: &str, bytes: &[u8]) -> Result<String, ObjectStoreError>;
}

/// Errors from the publish stage.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("artifact name '{0}' already exists in the store")]
    NameExists(String),

    #[error("upload of '{name}' failed: {reason}")]
    Upload { name: String, reason: String },

    #[error("uploaded delivery requested but no object store is configured")]
    NoStore,

    #[error("failed to read rendered artifact {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PublishError {
    /// Error kind string for the failure response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::NameExists(_) => "ArtifactNameExists",
            _ => "PublishError",
        }
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Deliver a rendered file in the requested form.
///
/// Inline delivery embeds the bytes as a `data:video/mp4;base64,` URI;
/// uploaded delivery hands them to the configured store under `name`.
/// Public on its own so a caller can retry delivery of a finished render
/// without re-running the pipeline.
pub fn publish_artifact(
    rendered: &Path,
    mode: DeliveryMode,
    name: &str,
    store: Option<&dyn ObjectStore>,
) -> PublishResult<OutputArtifact> {
    let bytes = std::fs::read(rendered).map_err(|e| PublishError::Io {
        path: rendered.to_path_buf(),
        source: e,
    })?;

    match mode {
        DeliveryMode::Inline => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
            Ok(OutputArtifact {
                form: ArtifactForm::Inline,
                value: format!("data:video/mp4;base64,{}", encoded),
            })
        }
        DeliveryMode::Uploaded => {
            let store = store.ok_or(PublishError::NoStore)?;
            let url = store.put(name, &bytes).map_err(|e| match e {
                ObjectStoreError::NameExists(n) => PublishError::NameExists(n),
                ObjectStoreError::Other(reason) => PublishError::Upload {
                    name: name.to_string(),
                    reason,
                },
            })?;
            Ok(OutputArtifact {
                form: ArtifactForm::Uploaded,
                value: url,
            })
        }
    }
}

/// Remove a job's work directory, waiting out a short grace period first
/// so backend processes can release their file handles.
///
/// Failures are logged, never escalated.
pub fn cleanup_work_dir(work_dir: &Path, grace: Duration) {
    if !work_dir.exists() {
        return;
    }
    if !grace.is_zero() {
        std::thread::sleep(grace);
    }
    if let Err(e) = std::fs::remove_dir_all(work_dir) {
        tracing::warn!(
            "Failed to remove work directory {}: {}",
            work_dir.display(),
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use tempfile::tempdir;

    /// In-memory store that rejects duplicate names.
    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl ObjectStore for MemoryStore {
        fn put(&self, name: &str, bytes: &[u8]) -> Result<String, ObjectStoreError> {
            let mut objects = self.objects.lock();
            if objects.contains_key(name) {
                return Err(ObjectStoreError::NameExists(name.to_string()));
            }
            objects.insert(name.to_string(), bytes.to_vec());
            Ok(format!("https://store.example/{}", name))
        }
    }

    struct FailingStore;

    impl ObjectStore for FailingStore {
        fn put(&self, _name: &str, _bytes: &[u8]) -> Result<String, ObjectStoreError> {
            Err(ObjectStoreError::Other("connection reset".to_string()))
        }
    }

    fn rendered_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("out.mp4");
        std::fs::write(&path, b"rendered bytes").unwrap();
        path
    }

    #[test]
    fn inline_delivery_embeds_data_uri() {
        let dir = tempdir().unwrap();
        let rendered = rendered_file(dir.path());

        let artifact = publish_artifact(&rendered, DeliveryMode::Inline, "clip.mp4", None).unwrap();
        assert_eq!(artifact.form, ArtifactForm::Inline);
        assert!(artifact.value.starts_with("data:video/mp4;base64,"));

        let encoded = artifact.value.trim_start_matches("data:video/mp4;base64,");
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, b"rendered bytes");
    }

    #[test]
    fn uploaded_delivery_returns_store_url() {
        let dir = tempdir().unwrap();
        let rendered = rendered_file(dir.path());
        let store = MemoryStore::default();

        let artifact =
            publish_artifact(&rendered, DeliveryMode::Uploaded, "clip.mp4", Some(&store)).unwrap();
        assert_eq!(artifact.form, ArtifactForm::Uploaded);
        assert_eq!(artifact.value, "https://store.example/clip.mp4");
    }

    #[test]
    fn duplicate_name_is_a_distinct_error() {
        let dir = tempdir().unwrap();
        let rendered = rendered_file(dir.path());
        let store = MemoryStore::default();

        publish_artifact(&rendered, DeliveryMode::Uploaded, "clip.mp4", Some(&store)).unwrap();
        let err = publish_artifact(&rendered, DeliveryMode::Uploaded, "clip.mp4", Some(&store))
            .unwrap_err();
        assert!(matches!(err, PublishError::NameExists(_)));
        assert_eq!(err.kind(), "ArtifactNameExists");
    }

    #[test]
    fn upload_failure_carries_reason() {
        let dir = tempdir().unwrap();
        let rendered = rendered_file(dir.path());

        let err = publish_artifact(
            &rendered,
            DeliveryMode::Uploaded,
            "clip.mp4",
            Some(&FailingStore),
        )
        .unwrap_err();
        assert!(matches!(err, PublishError::Upload { .. }));
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(err.kind(), "PublishError");
    }

    #[test]
    fn uploaded_without_store_fails() {
        let dir = tempdir().unwrap();
        let rendered = rendered_file(dir.path());
        let err = publish_artifact(&rendered, DeliveryMode::Uploaded, "clip.mp4", None).unwrap_err();
        assert!(matches!(err, PublishError::NoStore));
    }

    #[test]
    fn cleanup_removes_work_dir() {
        let root = tempdir().unwrap();
        let work = root.path().join("job_1");
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(work.join("video.mp4"), b"x").unwrap();

        cleanup_work_dir(&work, Duration::ZERO);
        assert!(!work.exists());
    }

    #[test]
    fn cleanup_of_missing_dir_is_quiet() {
        cleanup_work_dir(Path::new("/nonexistent/recap/work"), Duration::ZERO);
    }
}
