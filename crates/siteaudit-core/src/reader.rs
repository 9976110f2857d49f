//! Snapshot readers
//!
//! A reader collects one snapshot from the environment. Readers never touch
//! the document they observe.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{AuditError, Result, Snapshot};

/// Trait for collecting a snapshot from an environment
#[async_trait]
pub trait SnapshotReader: Send + Sync {
    async fn read(&self) -> Result<Snapshot>;
}

/// Hands out a snapshot that is already in memory
pub struct StaticSnapshotReader {
    snapshot: Snapshot,
}

impl StaticSnapshotReader {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl SnapshotReader for StaticSnapshotReader {
    async fn read(&self) -> Result<Snapshot> {
        Ok(self.snapshot.clone())
    }
}

/// Reads a JSON snapshot exported by the browser side
pub struct FileSnapshotReader {
    path: PathBuf,
}

impl FileSnapshotReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotReader for FileSnapshotReader {
    async fn read(&self) -> Result<Snapshot> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(AuditError::SnapshotUnavailable(format!(
                    "{} does not exist",
                    self.path.display()
                )));
            }
            Err(err) => return Err(err.into()),
        };
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        debug!(
            path = %self.path.display(),
            images = snapshot.image_count(),
            scripts = snapshot.script_count(),
            timings = snapshot.timings.len(),
            "Read snapshot"
        );
        Ok(snapshot)
    }
}

/// Defers reading until the environment signals load completion
pub struct GatedSnapshotReader<R> {
    inner: R,
    loaded: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
}

impl<R: SnapshotReader> GatedSnapshotReader<R> {
    /// Returns the reader and the sender the environment fires once loaded
    pub fn new(inner: R) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let reader = Self {
            inner,
            loaded: tokio::sync::Mutex::new(Some(rx)),
        };
        (reader, tx)
    }
}

#[async_trait]
impl<R: SnapshotReader> SnapshotReader for GatedSnapshotReader<R> {
    async fn read(&self) -> Result<Snapshot> {
        // the guard is held across the wait so concurrent reads queue behind it
        let mut pending = self.loaded.lock().await;
        if let Some(rx) = pending.take() {
            if rx.await.is_err() {
                warn!("Load signal dropped before firing, reading snapshot anyway");
            } else {
                debug!("Load completed");
            }
        }
        drop(pending);
        self.inner.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditError;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_file_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{ "title": "Portfolio", "images": [{ "alt": "me", "lazy": true }] }"#,
        )
        .unwrap();

        let snapshot = FileSnapshotReader::new(&path).read().await.unwrap();

        assert_eq!(snapshot.title.as_deref(), Some("Portfolio"));
        assert_eq!(snapshot.image_count(), 1);
        assert_eq!(snapshot.stylesheet_count(), 0);
    }

    #[tokio::test]
    async fn test_file_reader_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FileSnapshotReader::new(&path).read().await.unwrap_err();
        assert!(matches!(err, AuditError::Serialization(_)));

        let err = FileSnapshotReader::new(dir.path().join("missing.json"))
            .read()
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::SnapshotUnavailable(_)));
        assert!(err.to_string().contains("missing.json does not exist"));
    }

    #[tokio::test]
    async fn test_gated_reader_waits_for_load() {
        let snapshot = Snapshot {
            element_count: 7,
            ..Default::default()
        };
        let (reader, loaded) = GatedSnapshotReader::new(StaticSnapshotReader::new(snapshot));

        let handle = tokio::spawn(async move { reader.read().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_finished());

        loaded.send(()).unwrap();
        let snapshot = handle.await.unwrap().unwrap();
        assert_eq!(snapshot.element_count, 7);
    }

    #[tokio::test]
    async fn test_concurrent_reads_all_wait_for_load() {
        let (reader, loaded) = GatedSnapshotReader::new(StaticSnapshotReader::new(Snapshot::default()));
        let reader = Arc::new(reader);

        let first = tokio::spawn({
            let reader = Arc::clone(&reader);
            async move { reader.read().await }
        });
        let second = tokio::spawn({
            let reader = Arc::clone(&reader);
            async move { reader.read().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!first.is_finished());
        assert!(!second.is_finished());

        loaded.send(()).unwrap();
        assert!(first.await.unwrap().is_ok());
        assert!(second.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_gated_reader_survives_dropped_signal() {
        let (reader, loaded) = GatedSnapshotReader::new(StaticSnapshotReader::new(Snapshot::default()));
        drop(loaded);

        assert!(reader.read().await.is_ok());
        // later reads do not wait again
        assert!(reader.read().await.is_ok());
    }
}
