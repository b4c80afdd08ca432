//! File-backed entity store
//!
//! Directory layout:
//! ```text
//! {root}/
//! └── {partition}/
//!     ├── roster/
//!     │   └── players.json
//!     ├── player_game_logs/
//!     │   └── {player-id}.json
//!     └── game_play_by_play/
//!         ├── {game-id}.json
//!         └── {game-id}.json.tmp   # interrupted write, never read
//! ```
//!
//! One file per entity. A file's presence is the only "already fetched"
//! marker, so there is no in-memory layer and no separate checkpoint.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::key::{EntityId, Partition};
use crate::kind::EntityKind;
use crate::record::RecordSet;

const ENTRY_EXT: &str = "json";
const TMP_SUFFIX: &str = ".tmp";

/// Persisted form of one record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub partition: Partition,
    pub kind: EntityKind,
    pub id: EntityId,
    pub fetched_at: chrono::DateTime<chrono::Utc>,
    pub record: RecordSet,
}

/// Borrowed view used for writing, avoids cloning the record.
#[derive(Serialize)]
struct EntryRef<'a> {
    partition: &'a Partition,
    kind: EntityKind,
    id: &'a EntityId,
    fetched_at: chrono::DateTime<chrono::Utc>,
    record: &'a RecordSet,
}

/// Durable write-once store keyed by (partition, kind, id).
#[derive(Debug, Clone)]
pub struct EntityStore {
    root: PathBuf,
}

impl EntityStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_dir(&self, partition: &Partition) -> PathBuf {
        self.root.join(partition.as_str())
    }

    pub fn kind_dir(&self, partition: &Partition, kind: EntityKind) -> PathBuf {
        self.partition_dir(partition).join(kind.dir_name())
    }

    pub fn entry_path(&self, partition: &Partition, kind: EntityKind, id: &EntityId) -> PathBuf {
        self.kind_dir(partition, kind)
            .join(format!("{id}.{ENTRY_EXT}"))
    }

    /// True iff a completed entry has been written for this key.
    pub fn exists(&self, partition: &Partition, kind: EntityKind, id: &EntityId) -> bool {
        id.is_path_safe() && self.entry_path(partition, kind, id).is_file()
    }

    /// Durably write an entry: temp file, fsync, atomic rename.
    ///
    /// Callers only invoke this when `exists` is false for the key.
    pub fn put(
        &self,
        partition: &Partition,
        kind: EntityKind,
        id: &EntityId,
        record: &RecordSet,
    ) -> Result<(), StoreError> {
        self.validate_key(kind, id)?;

        let dir = self.kind_dir(partition, kind);
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let final_path = self.entry_path(partition, kind, id);
        let tmp_path = dir.join(format!("{id}.{ENTRY_EXT}{TMP_SUFFIX}"));

        let entry = EntryRef {
            partition,
            kind,
            id,
            fetched_at: chrono::Utc::now(),
            record,
        };

        let file = fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &entry)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.flush())
            .and_then(|()| writer.get_ref().sync_all())
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        drop(writer);

        fs::rename(&tmp_path, &final_path).map_err(|e| StoreError::io(&final_path, e))?;
        log::debug!("stored {kind} {id} ({} rows) in {partition}", record.len());
        Ok(())
    }

    /// Read back a stored record set.
    pub fn get(
        &self,
        partition: &Partition,
        kind: EntityKind,
        id: &EntityId,
    ) -> Result<RecordSet, StoreError> {
        self.validate_key(kind, id)?;
        let path = self.entry_path(partition, kind, id);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                partition: partition.clone(),
                kind,
                id: id.clone(),
            });
        }
        read_entry(&path).map(|entry| entry.record)
    }

    /// Enumerate all stored entries of a kind.
    ///
    /// The returned iterator reads lazily; call again to restart.
    pub fn list_entries(
        &self,
        partition: &Partition,
        kind: EntityKind,
    ) -> Result<Entries, StoreError> {
        let paths = self.glob_kind(partition, kind, &format!("*.{ENTRY_EXT}"))?;
        Ok(Entries { paths })
    }

    /// Ids of all stored entries of a kind, sorted.
    pub fn list_ids(
        &self,
        partition: &Partition,
        kind: EntityKind,
    ) -> Result<Vec<EntityId>, StoreError> {
        let mut ids = Vec::new();
        for path in self.glob_kind(partition, kind, &format!("*.{ENTRY_EXT}"))? {
            let path = path.map_err(|e| {
                let path = e.path().to_path_buf();
                StoreError::io(path, e.into())
            })?;
            if let Some(stem) = path.file_stem() {
                ids.push(EntityId::new(stem.to_string_lossy().into_owned()));
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn count(&self, partition: &Partition, kind: EntityKind) -> Result<usize, StoreError> {
        self.list_ids(partition, kind).map(|ids| ids.len())
    }

    /// Partitions that have a directory under the root, sorted.
    pub fn partitions(&self) -> Result<Vec<Partition>, StoreError> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))? {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Ok(p) = Partition::new(entry.file_name().to_string_lossy().into_owned()) {
                out.push(p);
            }
        }
        out.sort();
        Ok(out)
    }

    /// Remove temp files left behind by interrupted writes of one kind.
    pub fn cleanup_tmp(&self, partition: &Partition, kind: EntityKind) -> Result<usize, StoreError> {
        let mut count = 0;
        for path in self.glob_kind(partition, kind, &format!("*{TMP_SUFFIX}"))? {
            let Ok(path) = path else { continue };
            log::info!("cleaning stale tmp: {}", path.display());
            fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
            count += 1;
        }
        Ok(count)
    }

    /// Reject ids that cannot be used as a file name.
    pub fn validate_key(&self, kind: EntityKind, id: &EntityId) -> Result<(), StoreError> {
        if id.is_path_safe() {
            Ok(())
        } else {
            Err(StoreError::InvalidKey {
                kind,
                id: id.clone(),
            })
        }
    }

    fn glob_kind(
        &self,
        partition: &Partition,
        kind: EntityKind,
        file_pattern: &str,
    ) -> Result<glob::Paths, StoreError> {
        let dir = self.kind_dir(partition, kind);
        let pattern = format!(
            "{}/{file_pattern}",
            glob::Pattern::escape(&dir.to_string_lossy())
        );
        glob::glob(&pattern).map_err(|e| {
            StoreError::io(
                &dir,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, e.msg),
            )
        })
    }
}

/// Lazy sequence of stored entries of one kind.
pub struct Entries {
    paths: glob::Paths,
}

impl Iterator for Entries {
    type Item = Result<CacheEntry, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = match self.paths.next()? {
            Ok(path) => path,
            Err(e) => {
                let path = e.path().to_path_buf();
                return Some(Err(StoreError::io(path, e.into())));
            }
        };
        Some(read_entry(&path))
    }
}

fn read_entry(path: &Path) -> Result<CacheEntry, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
