//! Synthesis record storage.
//!
//! Every [`SynthesisStore`] operation is atomic per record: the ownership check and the mutation
//! (or the like-set membership test and flip) happen under one lock, so concurrent callers can
//! never observe or produce a half-applied change.

use std::collections::{BTreeMap, HashMap};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::Context as _;

use crate::foundation::error::{SynthError, SynthResult};
use crate::persistence::model::{LikeState, Synthesis, SynthesisId, UserId, sort_newest_first};
use crate::transform::model::OverlayTransform;

/// Storage backend for synthesis records.
pub trait SynthesisStore: Send + Sync {
    /// Insert a new record. Fails if the id is taken.
    fn insert(&self, record: Synthesis) -> SynthResult<()>;

    /// Fetch a record.
    fn get(&self, id: &SynthesisId) -> SynthResult<Option<Synthesis>>;

    /// Replace the transform of a record owned by `requester`.
    fn update_transform(
        &self,
        id: &SynthesisId,
        requester: &UserId,
        transform: OverlayTransform,
    ) -> SynthResult<Synthesis>;

    /// Remove a record owned by `requester` and return it.
    fn remove(&self, id: &SynthesisId, requester: &UserId) -> SynthResult<Synthesis>;

    /// Flip `user`'s membership in the like set.
    fn toggle_like(&self, id: &SynthesisId, user: &UserId) -> SynthResult<LikeState>;

    /// Records created by `owner`, newest first.
    fn owned_by(&self, owner: &UserId) -> SynthResult<Vec<Synthesis>>;

    /// Records whose like set contains `user`, newest first.
    fn liked_by(&self, user: &UserId) -> SynthResult<Vec<Synthesis>>;
}

fn missing(id: &SynthesisId) -> SynthError {
    SynthError::not_found(format!("synthesis '{id}'"))
}

#[derive(Debug)]
struct Entry {
    record: Synthesis,
    removed: bool,
}

type Shared = Arc<Mutex<Entry>>;

/// In-memory store with one lock per record.
///
/// The map lock is only held to find or add entries; record mutations hold the record's own lock.
/// Removal marks the entry before unlinking it, so a toggle that already holds the entry sees the
/// removal and reports `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<SynthesisId, Shared>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: &SynthesisId) -> SynthResult<Shared> {
        let map = self.records.read().unwrap_or_else(|e| e.into_inner());
        map.get(id).cloned().ok_or_else(|| missing(id))
    }

    fn with_entry<T>(
        &self,
        id: &SynthesisId,
        f: impl FnOnce(&mut Entry) -> SynthResult<T>,
    ) -> SynthResult<T> {
        let shared = self.entry(id)?;
        let mut entry = shared.lock().unwrap_or_else(|e| e.into_inner());
        if entry.removed {
            return Err(missing(id));
        }
        f(&mut entry)
    }

    fn collect(&self, keep: impl Fn(&Synthesis) -> bool) -> Vec<Synthesis> {
        let shared: Vec<Shared> = {
            let map = self.records.read().unwrap_or_else(|e| e.into_inner());
            map.values().cloned().collect()
        };
        let mut out: Vec<Synthesis> = shared
            .iter()
            .filter_map(|s| {
                let entry = s.lock().unwrap_or_else(|e| e.into_inner());
                (!entry.removed && keep(&entry.record)).then(|| entry.record.clone())
            })
            .collect();
        sort_newest_first(&mut out);
        out
    }
}

impl SynthesisStore for MemoryStore {
    fn insert(&self, record: Synthesis) -> SynthResult<()> {
        let mut map = self.records.write().unwrap_or_else(|e| e.into_inner());
        if map.contains_key(&record.id) {
            return Err(SynthError::invalid_input(format!(
                "synthesis '{}' already exists",
                record.id
            )));
        }
        map.insert(
            record.id,
            Arc::new(Mutex::new(Entry {
                record,
                removed: false,
            })),
        );
        Ok(())
    }

    fn get(&self, id: &SynthesisId) -> SynthResult<Option<Synthesis>> {
        match self.with_entry(id, |e| Ok(e.record.clone())) {
            Ok(r) => Ok(Some(r)),
            Err(SynthError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn update_transform(
        &self,
        id: &SynthesisId,
        requester: &UserId,
        transform: OverlayTransform,
    ) -> SynthResult<Synthesis> {
        self.with_entry(id, |e| {
            e.record.ensure_owner(requester)?;
            e.record.transform = transform;
            Ok(e.record.clone())
        })
    }

    fn remove(&self, id: &SynthesisId, requester: &UserId) -> SynthResult<Synthesis> {
        let removed = self.with_entry(id, |e| {
            e.record.ensure_owner(requester)?;
            e.removed = true;
            Ok(e.record.clone())
        })?;
        let mut map = self.records.write().unwrap_or_else(|e| e.into_inner());
        map.remove(id);
        Ok(removed)
    }

    fn toggle_like(&self, id: &SynthesisId, user: &UserId) -> SynthResult<LikeState> {
        self.with_entry(id, |e| Ok(e.record.flip_like(user)))
    }

    fn owned_by(&self, owner: &UserId) -> SynthResult<Vec<Synthesis>> {
        Ok(self.collect(|r| &r.owner_id == owner))
    }

    fn liked_by(&self, user: &UserId) -> SynthResult<Vec<Synthesis>> {
        Ok(self.collect(|r| r.is_liked_by(user)))
    }
}

/// Store persisted as one JSON document.
///
/// Mutations are applied to a copy, written to a temporary file, renamed over the document, and
/// only then made visible. A failed write leaves both the file and the in-memory state untouched
/// and is reported as [`SynthError::TransientStorage`].
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<SynthesisId, Synthesis>>,
}

impl JsonFileStore {
    /// Open the document at `path`, starting empty when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> SynthResult<Self> {
        let path = path.into();
        let records = match std::fs::read(&path) {
            Ok(bytes) => {
                let list: Vec<Synthesis> = serde_json::from_slice(&bytes)?;
                list.into_iter().map(|r| (r.id, r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read synthesis store '{}'", path.display()))
                    .into());
            }
        };
        tracing::debug!(path = %path.display(), count = records.len(), "synthesis store opened");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&BTreeMap<SynthesisId, Synthesis>) -> T) -> T {
        let map = self.records.lock().unwrap_or_else(|e| e.into_inner());
        f(&map)
    }

    fn commit<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<SynthesisId, Synthesis>) -> SynthResult<T>,
    ) -> SynthResult<T> {
        let mut map = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = map.clone();
        let out = f(&mut next)?;
        write_document(&self.path, &next)?;
        *map = next;
        Ok(out)
    }
}

fn write_document(path: &Path, records: &BTreeMap<SynthesisId, Synthesis>) -> SynthResult<()> {
    let list: Vec<&Synthesis> = records.values().collect();
    let json = serde_json::to_vec_pretty(&list)?;
    let tmp = path.with_extension("json.tmp");
    let res = (|| -> anyhow::Result<()> {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("create '{}'", tmp.display()))?;
        f.write_all(&json)?;
        f.sync_all()?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("rename '{}' to '{}'", tmp.display(), path.display()))?;
        Ok(())
    })();
    res.map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        SynthError::transient(format!("{e:#}"))
    })
}

impl SynthesisStore for JsonFileStore {
    fn insert(&self, record: Synthesis) -> SynthResult<()> {
        self.commit(|map| {
            if map.contains_key(&record.id) {
                return Err(SynthError::invalid_input(format!(
                    "synthesis '{}' already exists",
                    record.id
                )));
            }
            map.insert(record.id, record);
            Ok(())
        })
    }

    fn get(&self, id: &SynthesisId) -> SynthResult<Option<Synthesis>> {
        Ok(self.read(|map| map.get(id).cloned()))
    }

    fn update_transform(
        &self,
        id: &SynthesisId,
        requester: &UserId,
        transform: OverlayTransform,
    ) -> SynthResult<Synthesis> {
        self.commit(|map| {
            let rec = map.get_mut(id).ok_or_else(|| missing(id))?;
            rec.ensure_owner(requester)?;
            rec.transform = transform;
            Ok(rec.clone())
        })
    }

    fn remove(&self, id: &SynthesisId, requester: &UserId) -> SynthResult<Synthesis> {
        self.commit(|map| {
            map.get(id).ok_or_else(|| missing(id))?.ensure_owner(requester)?;
            map.remove(id).ok_or_else(|| missing(id))
        })
    }

    fn toggle_like(&self, id: &SynthesisId, user: &UserId) -> SynthResult<LikeState> {
        self.commit(|map| {
            let rec = map.get_mut(id).ok_or_else(|| missing(id))?;
            Ok(rec.flip_like(user))
        })
    }

    fn owned_by(&self, owner: &UserId) -> SynthResult<Vec<Synthesis>> {
        let mut out = self.read(|map| {
            map.values()
                .filter(|r| &r.owner_id == owner)
                .cloned()
                .collect::<Vec<_>>()
        });
        sort_newest_first(&mut out);
        Ok(out)
    }

    fn liked_by(&self, user: &UserId) -> SynthResult<Vec<Synthesis>> {
        let mut out = self.read(|map| {
            map.values()
                .filter(|r| r.is_liked_by(user))
                .cloned()
                .collect::<Vec<_>>()
        });
        sort_newest_first(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persistence/store.rs"]
mod tests;
