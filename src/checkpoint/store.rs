//! Object Stores
//!
//! Blob storage targets for checkpoints. A `location` groups the objects
//! of one cache (a bucket, a directory); `name` identifies one object in it.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::CheckpointError;

/// Suffix source for temporary files, unique per put within the process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

// == Object Store ==
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Writes `bytes` as object `name`, replacing any previous object.
    async fn put_object(&self, location: &str, name: &str, bytes: Bytes)
        -> Result<(), CheckpointError>;

    /// Reads object `name`, or `None` if it does not exist.
    async fn get_object(&self, location: &str, name: &str)
        -> Result<Option<Bytes>, CheckpointError>;
}

// == Filesystem Store ==
/// Stores each object as a file at `<root>/<location>/<name>`.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, location: &str, name: &str) -> PathBuf {
        self.root.join(location).join(name)
    }
}

fn storage_error(name: &str, source: std::io::Error) -> CheckpointError {
    CheckpointError::Storage {
        name: name.to_string(),
        source,
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_object(
        &self,
        location: &str,
        name: &str,
        bytes: Bytes,
    ) -> Result<(), CheckpointError> {
        let path = self.object_path(location, name);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| storage_error(name, e))?;
        }

        // Readers never observe a half-written object. Overlapping puts to
        // one object each rename their own file; the last rename wins.
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_file_name(format!("{name}.{}.{seq}.tmp", std::process::id()));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| storage_error(name, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(name, e))
    }

    async fn get_object(
        &self,
        location: &str,
        name: &str,
    ) -> Result<Option<Bytes>, CheckpointError> {
        match tokio::fs::read(self.object_path(location, name)).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(name, e)),
        }
    }
}

// == Memory Store ==
/// Keeps objects in process memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        location: &str,
        name: &str,
        bytes: Bytes,
    ) -> Result<(), CheckpointError> {
        self.objects
            .lock()
            .insert((location.to_string(), name.to_string()), bytes);
        Ok(())
    }

    async fn get_object(
        &self,
        location: &str,
        name: &str,
    ) -> Result<Option<Bytes>, CheckpointError> {
        Ok(self
            .objects
            .lock()
            .get(&(location.to_string(), name.to_string()))
            .cloned())
    }
}
