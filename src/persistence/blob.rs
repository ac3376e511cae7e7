use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::assets::decode::ImageMime;
use crate::foundation::error::{SynthError, SynthResult};
use crate::persistence::model::BlobRef;

const PREFIX: &str = "/uploads/";

/// Storage for uploaded images.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a fresh unique name.
    fn put(&self, mime: ImageMime, bytes: &[u8]) -> SynthResult<BlobRef>;
    /// Read a stored blob.
    fn get(&self, blob: &BlobRef) -> SynthResult<Vec<u8>>;
    /// Delete a stored blob. Deleting a missing blob is not an error.
    fn delete(&self, blob: &BlobRef) -> SynthResult<()>;
}

fn fresh_name(mime: ImageMime) -> String {
    format!("upload-{}.{}", uuid::Uuid::new_v4().simple(), mime.extension())
}

fn name_of(blob: &BlobRef) -> SynthResult<&str> {
    blob.as_str()
        .strip_prefix(PREFIX)
        .filter(|n| !n.is_empty() && !n.contains(['/', '\\']) && !n.starts_with('.'))
        .ok_or_else(|| SynthError::not_found(format!("blob '{}'", blob.as_str())))
}

fn io_error(e: std::io::Error, what: String) -> SynthError {
    match e.kind() {
        ErrorKind::NotFound => SynthError::not_found(what),
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            SynthError::transient(format!("{what}: {e}"))
        }
        _ => SynthError::Other(anyhow::Error::new(e).context(what)),
    }
}

/// Blob store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Return `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, mime: ImageMime, bytes: &[u8]) -> SynthResult<BlobRef> {
        let name = fresh_name(mime);
        let blob = BlobRef(format!("{PREFIX}{name}"));
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name, bytes.to_vec());
        Ok(blob)
    }

    fn get(&self, blob: &BlobRef) -> SynthResult<Vec<u8>> {
        let name = name_of(blob)?;
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| SynthError::not_found(format!("blob '{}'", blob.as_str())))
    }

    fn delete(&self, blob: &BlobRef) -> SynthResult<()> {
        let name = name_of(blob)?;
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name);
        Ok(())
    }
}

/// Blob store backed by a directory. Files are written under a temporary name and renamed.
#[derive(Clone, Debug)]
pub struct DirBlobStore {
    root: PathBuf,
}

impl DirBlobStore {
    /// Use `root`, creating it when missing.
    pub fn open(root: impl Into<PathBuf>) -> SynthResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| io_error(e, format!("create upload dir '{}'", root.display())))?;
        Ok(Self { root })
    }
}

impl BlobStore for DirBlobStore {
    fn put(&self, mime: ImageMime, bytes: &[u8]) -> SynthResult<BlobRef> {
        let name = fresh_name(mime);
        let path = self.root.join(&name);
        let tmp = self.root.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, bytes)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|e| {
                let _ = std::fs::remove_file(&tmp);
                io_error(e, format!("store upload '{}'", path.display()))
            })?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "upload stored");
        Ok(BlobRef(format!("{PREFIX}{name}")))
    }

    fn get(&self, blob: &BlobRef) -> SynthResult<Vec<u8>> {
        let path = self.root.join(name_of(blob)?);
        std::fs::read(&path).map_err(|e| io_error(e, format!("blob '{}'", blob.as_str())))
    }

    fn delete(&self, blob: &BlobRef) -> SynthResult<()> {
        let path = self.root.join(name_of(blob)?);
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(io_error(e, format!("delete blob '{}'", blob.as_str())))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persistence/blob.rs"]
mod tests;
