//! JSON file backed vector store.
//!
//! The whole store is one JSON document. Writers hold an exclusive lock on a
//! sidecar `.lock` file for the full read-modify-write cycle, so separate
//! processes sharing one store never lose each other's records. The new
//! document goes to a uniquely named temp file that is renamed over the
//! store, so readers never observe a half-written store.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::record::{DocumentRecord, Neighbor};
use crate::store::{VectorStore, check_dimension, rank};

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: Vec<DocumentRecord>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            records: Vec::new(),
        }
    }
}

/// Vector store persisted as a single JSON file.
pub struct JsonFileStore {
    /// Location of the store file.
    path: PathBuf,
}

impl JsonFileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the lock file guarding writes.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> StoreResult<StoreFile> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => parse_store(&self.path, &content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(StoreError::Read(format!("{}: {e}", self.path.display()))),
        }
    }

    /// Run one locked read-modify-write cycle on a blocking thread.
    ///
    /// `change` returns its result and whether the document must be saved.
    /// The cycle runs to completion even if the calling future is dropped,
    /// so a write is either fully committed or not made at all.
    async fn transact<T, F>(&self, change: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreFile) -> StoreResult<(T, bool)> + Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path();

        tokio::task::spawn_blocking(move || transact_blocking(&path, &lock_path, change))
            .await
            .map_err(|e| StoreError::Write(format!("store task failed: {e}")))?
    }
}

fn parse_store(path: &Path, content: &str) -> StoreResult<StoreFile> {
    let file: StoreFile = serde_json::from_str(content)
        .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;

    if file.version != FORMAT_VERSION {
        return Err(StoreError::Corrupt(format!(
            "{}: unsupported format version {}",
            path.display(),
            file.version
        )));
    }

    Ok(file)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn transact_blocking<T, F>(path: &Path, lock_path: &Path, change: F) -> StoreResult<T>
where
    F: FnOnce(&mut StoreFile) -> StoreResult<(T, bool)>,
{
    let parent = parent_dir(path);
    std::fs::create_dir_all(&parent)
        .map_err(|e| StoreError::Write(format!("{}: {e}", parent.display())))?;

    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)
        .map_err(|e| StoreError::Write(format!("{}: {e}", lock_path.display())))?;
    let mut lock = FileLock::new(lock_file);
    let _guard = lock
        .write()
        .map_err(|e| StoreError::Write(format!("{}: {e}", lock_path.display())))?;

    let mut file = match std::fs::read_to_string(path) {
        Ok(content) => parse_store(path, &content)?,
        Err(e) if e.kind() == ErrorKind::NotFound => StoreFile::default(),
        Err(e) => return Err(StoreError::Read(format!("{}: {e}", path.display()))),
    };

    let (value, changed) = change(&mut file)?;
    if changed {
        save(path, &parent, &file)?;
    }

    Ok(value)
}

fn save(path: &Path, parent: &Path, file: &StoreFile) -> StoreResult<()> {
    let content = serde_json::to_vec(file)?;

    // Unique temp file in the target directory so the rename stays atomic.
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| StoreError::Write(format!("{}: {e}", parent.display())))?;
    temp.write_all(&content)
        .and_then(|()| temp.as_file().sync_all())
        .map_err(|e| StoreError::Write(format!("{}: {e}", temp.path().display())))?;
    temp.persist(path)
        .map_err(|e| StoreError::Write(format!("{}: {}", path.display(), e.error)))?;

    debug!("Saved {} records to {}", file.records.len(), path.display());
    Ok(())
}

#[async_trait]
impl VectorStore for JsonFileStore {
    async fn insert(&self, record: DocumentRecord) -> StoreResult<()> {
        let id = record.id.clone();

        self.transact(move |file| {
            check_dimension(&file.records, record.dimension())?;
            file.records.push(record);
            Ok(((), true))
        })
        .await?;

        debug!("Inserted record {id} into {}", self.path.display());
        Ok(())
    }

    async fn delete_by_content(&self, content: &str) -> StoreResult<usize> {
        let content = content.to_string();
        let removed = self
            .transact(move |file| {
                let before = file.records.len();
                file.records.retain(|r| r.content != content);
                let removed = before - file.records.len();
                Ok((removed, removed > 0))
            })
            .await?;

        if removed > 0 {
            info!("Removed {removed} records from {}", self.path.display());
        }
        Ok(removed)
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<usize> {
        let id = id.to_string();
        let removed = self
            .transact(move |file| {
                let before = file.records.len();
                file.records.retain(|r| r.id != id);
                let removed = before - file.records.len();
                Ok((removed, removed > 0))
            })
            .await?;

        if removed > 0 {
            info!("Removed {removed} records from {}", self.path.display());
        }
        Ok(removed)
    }

    async fn nearest(&self, query: &[f32], k: usize) -> StoreResult<Vec<Neighbor>> {
        let file = self.load().await?;
        rank(&file.records, query, k)
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.load().await?.records.len())
    }
}
