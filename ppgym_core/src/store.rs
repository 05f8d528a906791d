//! Key-value persistence port.
//!
//! The session manager only ever talks to a [`KeyValueStore`]: string keys,
//! opaque JSON values. Two backends are provided:
//! - [`MemoryStore`] keeps everything in process memory (tests, ephemeral runs)
//! - [`JsonFileStore`] keeps one `<key>.json` file per key with file locking

use crate::{Error, Result};
use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;

/// Asynchronous key-value store holding JSON values
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key; `Ok(None)` when the key has never been written
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a key, replacing any previous value
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys, stopping at the first failure
    async fn remove_all(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Volatile process-local store
///
/// Reads and writes can be switched to fail so callers' error paths can be
/// exercised without a real broken disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of keys currently stored
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::StorageWrite {
                key: key.to_string(),
                message: "memory store is failing writes".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::StorageRead {
                key: key.to_string(),
                message: "memory store is failing reads".into(),
            });
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.check_write(key)?;
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.entries.write().await.remove(key);
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Directory-backed store with one JSON file per key
///
/// Writes are atomic (temp file, fsync, rename) and serialized with an
/// exclusive lock; reads take a shared lock. Blocking file I/O runs on the
/// blocking thread pool.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing a key; keys may only use `[A-Za-z0-9_-]`
    pub fn path_for(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| self.dir.join(format!("{}.json", key)))
    }

    fn checked_path(&self, key: &str, read: bool) -> Result<PathBuf> {
        self.path_for(key).ok_or_else(|| {
            let message = "key contains characters outside [A-Za-z0-9_-]".to_string();
            if read {
                Error::StorageRead {
                    key: key.to_string(),
                    message,
                }
            } else {
                Error::StorageWrite {
                    key: key.to_string(),
                    message,
                }
            }
        })
    }
}

/// Read one key file with shared locking
///
/// An empty file reads as absent. A file that is not valid JSON is moved
/// aside to `<name>.corrupt` and also reads as absent.
fn read_value(path: &Path) -> std::io::Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = {
        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        let _ = file.unlock();
        read?;
        contents
    };

    if contents.trim().is_empty() {
        tracing::debug!("{:?} is empty", path);
        return Ok(None);
    }

    match serde_json::from_str::<Value>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {:?}", path);
            Ok(Some(value))
        }
        Err(e) => {
            let aside = corrupt_path(path);
            tracing::warn!("Failed to parse {:?}: {}. Treating as empty.", path, e);
            match std::fs::rename(path, &aside) {
                Ok(()) => tracing::warn!("Kept unreadable data at {:?}", aside),
                Err(e) => tracing::warn!("Could not move {:?} aside: {}", path, e),
            }
            Ok(None)
        }
    }
}

/// Where an unreadable key file is kept, e.g. `workout_sessions.json.corrupt`
fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Atomically replace one key file
fn write_value(path: &Path, value: &Value) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    // Temp file in the same directory so the rename stays on one filesystem
    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| e.error)?;

    tracing::debug!("Saved {:?}", path);
    Ok(())
}

fn remove_value(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Run blocking file work off the async executor
async fn blocking<T, F>(f: F) -> std::io::Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.checked_path(key, true)?;
        blocking(move || read_value(&path))
            .await
            .map_err(|e| Error::StorageRead {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let path = self.checked_path(key, false)?;
        blocking(move || write_value(&path, &value))
            .await
            .map_err(|e| Error::StorageWrite {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.checked_path(key, false)?;
        blocking(move || remove_value(&path))
            .await
            .map_err(|e| Error::StorageWrite {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}
