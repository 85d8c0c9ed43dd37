//! Storage backends
//!
//! A backend is the host's raw blob capability: fetch the serialized
//! configuration, or replace it on behalf of an actor with an edit summary.
//! Backends never cache and never retry.

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Who performs a write; passed through to the backend for auditing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor(String);

impl Actor {
    /// Create actor
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Actor used by maintenance operations
    #[must_use]
    pub fn system() -> Self {
        Self::new("confset-maintenance")
    }

    /// Actor name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw blob storage provided by the host
#[async_trait]
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Backing location; change notifications are keyed by it
    fn location(&self) -> &str;

    /// Fetch the serialized blob; `None` if nothing was ever written
    async fn fetch_raw_blob(&self) -> Result<Option<String>, BackendError>;

    /// Replace the serialized blob
    async fn write_raw_blob(
        &self,
        serialized: &str,
        actor: &Actor,
        summary: &str,
    ) -> Result<(), BackendError>;
}

/// Audit entry of one write to a [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRecord {
    /// Time of the write
    pub at: DateTime<Utc>,
    /// Writing actor
    pub actor: Actor,
    /// Edit summary
    pub summary: String,
    /// Payload written
    pub payload: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    payload: Option<String>,
    writes: Vec<WriteRecord>,
    fetches: usize,
    unavailable: bool,
}

/// In-process backend
///
/// Clones share state, so a clone can play the role of another process
/// editing the same location.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    location: String,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Create empty backend
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            state: Arc::default(),
        }
    }

    /// Create backend holding `payload`
    pub fn with_payload(location: impl Into<String>, payload: impl Into<String>) -> Self {
        let backend = Self::new(location);
        backend.set_payload(payload);
        backend
    }

    /// Replace the payload without going through a store (external edit)
    pub fn set_payload(&self, payload: impl Into<String>) {
        self.state.lock().payload = Some(payload.into());
    }

    /// Current payload
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        self.state.lock().payload.clone()
    }

    /// Make every fetch and write fail until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Number of fetches served so far
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetches
    }

    /// Audit log of writes
    #[must_use]
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().writes.clone()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch_raw_blob(&self) -> Result<Option<String>, BackendError> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(BackendError::new(format!("{} is unavailable", self.location)));
        }
        state.fetches += 1;
        Ok(state.payload.clone())
    }

    async fn write_raw_blob(
        &self,
        serialized: &str,
        actor: &Actor,
        summary: &str,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(BackendError::new(format!("{} is unavailable", self.location)));
        }
        state.payload = Some(serialized.to_string());
        state.writes.push(WriteRecord {
            at: Utc::now(),
            actor: actor.clone(),
            summary: summary.to_string(),
            payload: serialized.to_string(),
        });
        Ok(())
    }
}

/// JSON file on disk
///
/// Each write goes to its own uniquely named temporary file in the target's
/// directory, which is then persisted over the target, so readers never
/// observe a partial payload and concurrent writers never share a temp file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    location: String,
}

impl FileBackend {
    /// Create backend for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let location = format!("file:{}", path.display());
        Self { path, location }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn replace_file(path: &Path, contents: &[u8]) -> Result<(), BackendError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .map_err(|e| BackendError::with_source(format!("failed to create {}", dir.display()), e))?;

    let write_failed = |e: std::io::Error| {
        BackendError::with_source(format!("failed to write {}", path.display()), e)
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    temp.write_all(contents).map_err(write_failed)?;
    temp.as_file().sync_all().map_err(write_failed)?;
    temp.persist(path).map_err(|e| {
        BackendError::with_source(format!("failed to replace {}", path.display()), e.error)
    })?;
    Ok(())
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch_raw_blob(&self) -> Result<Option<String>, BackendError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::with_source(
                format!("failed to read {}", self.path.display()),
                e,
            )),
        }
    }

    async fn write_raw_blob(
        &self,
        serialized: &str,
        actor: &Actor,
        summary: &str,
    ) -> Result<(), BackendError> {
        let path = self.path.clone();
        let contents = serialized.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || replace_file(&path, &contents))
            .await
            .map_err(|e| BackendError::with_source("file write task failed", e))??;

        tracing::info!(location = %self.location, %actor, summary, "configuration file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_records_writes() {
        let backend = MemoryBackend::new("memory:test");
        assert_eq!(backend.fetch_raw_blob().await.unwrap(), None);

        backend
            .write_raw_blob("{\"A\":1}", &Actor::new("Admin"), "set A")
            .await
            .unwrap();

        assert_eq!(backend.fetch_raw_blob().await.unwrap().as_deref(), Some("{\"A\":1}"));
        assert_eq!(backend.fetch_count(), 2);

        let writes = backend.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].actor.name(), "Admin");
        assert_eq!(writes[0].summary, "set A");
    }

    #[tokio::test]
    async fn memory_backend_clones_share_state() {
        let backend = MemoryBackend::new("memory:test");
        let other_process = backend.clone();
        other_process.set_payload("{}");
        assert_eq!(backend.payload().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn memory_backend_outage() {
        let backend = MemoryBackend::with_payload("memory:test", "{}");
        backend.set_unavailable(true);
        assert!(backend.fetch_raw_blob().await.is_err());
        assert!(backend
            .write_raw_blob("{}", &Actor::system(), "noop")
            .await
            .is_err());
        assert_eq!(backend.fetch_count(), 0);

        backend.set_unavailable(false);
        assert!(backend.fetch_raw_blob().await.is_ok());
    }

    #[tokio::test]
    async fn file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested").join("config.json"));

        assert_eq!(backend.fetch_raw_blob().await.unwrap(), None);
        backend
            .write_raw_blob("{\"A\":1}", &Actor::new("Admin"), "create")
            .await
            .unwrap();
        assert_eq!(backend.fetch_raw_blob().await.unwrap().as_deref(), Some("{\"A\":1}"));
        assert!(backend.location().starts_with("file:"));
    }

    #[tokio::test]
    async fn concurrent_file_writes_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("config.json"));
        let payloads: Vec<String> = (0..16).map(|n| format!("{{\"A\":{n}}}")).collect();

        let writes = payloads.iter().map(|payload| {
            let backend = backend.clone();
            let payload = payload.clone();
            tokio::spawn(async move {
                backend
                    .write_raw_blob(&payload, &Actor::new("Admin"), "race")
                    .await
            })
        });
        for result in futures::future::join_all(writes).await {
            result.unwrap().unwrap();
        }

        let stored = backend.fetch_raw_blob().await.unwrap().unwrap();
        assert!(payloads.contains(&stored));
        // No temporary file is left next to the target
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("config.json")]);
    }

    #[tokio::test]
    async fn file_backend_reports_read_failures() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file
        let backend = FileBackend::new(dir.path());
        assert!(backend.fetch_raw_blob().await.is_err());
    }
}
