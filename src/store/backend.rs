//! Persistence backends for the content store.
//!
//! A backend maps a content hash to its canonical text. Entries are written
//! at most once per hash; rewriting the same hash with identical content is
//! harmless.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::{MailError, Result};

/// Local persistence for content entries, keyed by canonical hash.
pub trait ContentBackend: Send + Sync {
    /// Persist the text under the given hash.
    fn write(&self, hash: &str, text: &str) -> Result<()>;

    /// Read the text stored under the given hash, if any.
    fn read(&self, hash: &str) -> Result<Option<String>>;

    /// Check whether an entry exists for the given hash.
    fn exists(&self, hash: &str) -> Result<bool>;
}

/// Filesystem backend.
///
/// Entries are stored in a sharded directory structure keyed by the first
/// two characters of the hash:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12...cd.msg
/// ├── cd/
/// │   └── cd90...12.msg
/// └── ...
/// ```
/// A backend reopened on an existing path serves previously written entries.
#[derive(Debug, Clone)]
pub struct FsBackend {
    base_path: PathBuf,
}

impl FsBackend {
    /// Open a filesystem backend at the given base path.
    ///
    /// The base directory is created if it doesn't exist.
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this backend.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the full file path for a hash.
    ///
    /// The path is constructed as: {base_path}/{shard}/{hash}.msg
    /// where shard is the first 2 characters of the hash.
    pub fn entry_path(&self, hash: &str) -> PathBuf {
        let shard = Self::shard(hash);
        self.base_path.join(shard).join(format!("{hash}.msg"))
    }

    /// The shard directory name for a hash: its first 2 characters.
    fn shard(hash: &str) -> &str {
        if hash.len() >= 2 {
            &hash[..2]
        } else {
            hash
        }
    }
}

impl ContentBackend for FsBackend {
    fn write(&self, hash: &str, text: &str) -> Result<()> {
        let path = self.entry_path(hash);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, text)?;

        Ok(())
    }

    fn read(&self, hash: &str) -> Result<Option<String>> {
        let path = self.entry_path(hash);

        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, hash: &str) -> Result<bool> {
        Ok(self.entry_path(hash).exists())
    }
}

/// In-memory backend for tests and ephemeral mailboxes.
///
/// Clones share the same entry map, so a test can keep a handle to inspect
/// or evict entries behind a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the backend holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Drop a single entry.
    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| MailError::Storage("content backend lock poisoned".to_string()))
    }
}

impl ContentBackend for MemoryBackend {
    fn write(&self, hash: &str, text: &str) -> Result<()> {
        self.lock()?.insert(hash.to_string(), text.to_string());
        Ok(())
    }

    fn read(&self, hash: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(hash).cloned())
    }

    fn exists(&self, hash: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_fs() -> (TempDir, FsBackend) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FsBackend::open(temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store");

        assert!(!path.exists());

        let backend = FsBackend::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(backend.base_path(), path);
    }

    #[test]
    fn test_fs_write_and_read() {
        let (_temp_dir, backend) = setup_fs();

        backend.write("abcd1234", "hello").unwrap();

        assert_eq!(backend.read("abcd1234").unwrap().as_deref(), Some("hello"));
        assert!(backend.exists("abcd1234").unwrap());
    }

    #[test]
    fn test_fs_read_missing_is_none() {
        let (_temp_dir, backend) = setup_fs();

        assert_eq!(backend.read("ffff0000").unwrap(), None);
        assert!(!backend.exists("ffff0000").unwrap());
    }

    #[test]
    fn test_fs_write_creates_shard_directory() {
        let (_temp_dir, backend) = setup_fs();

        backend.write("abcd1234", "x").unwrap();

        let shard_dir = backend.base_path().join("ab");
        assert!(shard_dir.is_dir());
    }

    #[test]
    fn test_fs_entry_path() {
        let (_temp_dir, backend) = setup_fs();

        let path = backend.entry_path("abcd1234");
        assert_eq!(path, backend.base_path().join("ab").join("abcd1234.msg"));
    }

    #[test]
    fn test_fs_shard_short_hash() {
        assert_eq!(FsBackend::shard("abcdef"), "ab");
        assert_eq!(FsBackend::shard("x"), "x");
        assert_eq!(FsBackend::shard(""), "");
    }

    #[test]
    fn test_fs_reopen_serves_existing_entries() {
        let temp_dir = TempDir::new().unwrap();

        {
            let backend = FsBackend::open(temp_dir.path()).unwrap();
            backend.write("abcd1234", "persisted").unwrap();
        }

        let reopened = FsBackend::open(temp_dir.path()).unwrap();
        assert_eq!(
            reopened.read("abcd1234").unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn test_fs_rewrite_same_hash() {
        let (_temp_dir, backend) = setup_fs();

        backend.write("abcd1234", "same").unwrap();
        backend.write("abcd1234", "same").unwrap();

        assert_eq!(backend.read("abcd1234").unwrap().as_deref(), Some("same"));
    }

    #[test]
    fn test_memory_write_and_read() {
        let backend = MemoryBackend::new();

        backend.write("abcd", "hello").unwrap();

        assert_eq!(backend.read("abcd").unwrap().as_deref(), Some("hello"));
        assert!(backend.exists("abcd").unwrap());
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_memory_read_missing_is_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.read("missing").unwrap(), None);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_memory_clones_share_entries() {
        let backend = MemoryBackend::new();
        let handle = backend.clone();

        backend.write("abcd", "shared").unwrap();
        assert_eq!(handle.read("abcd").unwrap().as_deref(), Some("shared"));

        handle.clear();
        assert!(backend.is_empty());
    }
}
