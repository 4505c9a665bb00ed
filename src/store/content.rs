//! Content-addressed message storage.
//!
//! A [`ContentStore`] persists canonical message text under a key derived
//! from the text itself, so identical content always maps to the same key
//! and `put` is idempotent. The canonical hash is the only identifier
//! callers ever see; when a remote pinning service issues its own content
//! id, the store records the canonical-hash to backend-id mapping
//! internally, persisted as `.id` entries in the local backend so it
//! survives a restart.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::StoreConfig;
use crate::{MailError, Result};

use super::backend::{ContentBackend, FsBackend, MemoryBackend};

/// Compute the canonical content hash: lowercase hex SHA-256 of the text.
///
/// This is the single addressing scheme of the whole system; directory
/// pointers and store keys both use it.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Backend key of the persisted remote-id record for a canonical hash.
/// Cannot collide with content keys, which are bare hex digests.
fn remote_id_key(hash: &str) -> String {
    format!("{hash}.id")
}

/// A remote pinning/content-addressing service.
///
/// The remote assigns its own id to stored content; that id never leaves
/// the [`ContentStore`].
pub trait RemoteStore: Send + Sync {
    /// Store the text remotely and return the backend's own id for it.
    fn put(&self, text: &str) -> Result<String>;

    /// Fetch text by the backend's own id.
    fn get(&self, id: &str) -> Result<Option<String>>;
}

/// Content-addressed key/value store for serialized message bodies.
///
/// The local backend is a cache in front of the optional remote service:
/// it can be rebuilt from the remote, and a local miss falls back to the
/// remote and re-caches the entry.
pub struct ContentStore {
    backend: Box<dyn ContentBackend>,
    remote: Option<Box<dyn RemoteStore>>,
    /// canonical hash -> remote backend id, cached over the persisted
    /// `.id` records in the local backend.
    remote_ids: Mutex<HashMap<String, String>>,
}

impl ContentStore {
    /// Create a store over the given local backend.
    pub fn new(backend: impl ContentBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            remote: None,
            remote_ids: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store bridging a local backend and a remote service.
    pub fn with_remote(
        backend: impl ContentBackend + 'static,
        remote: impl RemoteStore + 'static,
    ) -> Self {
        Self {
            backend: Box::new(backend),
            remote: Some(Box::new(remote)),
            remote_ids: Mutex::new(HashMap::new()),
        }
    }

    /// Open a filesystem-backed store at the given path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(FsBackend::open(path)?))
    }

    /// Open a filesystem-backed store at the configured path.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(config.path.as_str())
    }

    /// Create an in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Store content and return its canonical hash.
    ///
    /// Idempotent: putting identical content again returns the same hash
    /// and writes nothing new. The local write completes before any remote
    /// put is attempted, so a remote failure never leaves a dangling local
    /// state.
    pub fn put(&self, text: &str) -> Result<String> {
        let hash = content_hash(text);

        if !self.backend.exists(&hash)? {
            self.backend.write(&hash, text)?;
        } else {
            debug!(%hash, "content already stored");
        }

        if let Some(remote) = &self.remote {
            let mut ids = self.lock_ids()?;
            if !ids.contains_key(&hash) {
                let id_key = remote_id_key(&hash);
                let id = match self.backend.read(&id_key)? {
                    // Pinned by an earlier run; no need to pin again.
                    Some(id) => id,
                    None => {
                        let id = remote.put(text)?;
                        self.backend.write(&id_key, &id)?;
                        id
                    }
                };
                ids.insert(hash.clone(), id);
            }
        }

        Ok(hash)
    }

    /// Fetch content by canonical hash.
    ///
    /// Tries the local backend first, then the remote service; a remote hit
    /// is re-cached locally. An unknown hash is `NotFound`, which is an
    /// expected outcome rather than a failure.
    pub fn get(&self, hash: &str) -> Result<String> {
        if let Some(text) = self.backend.read(hash)? {
            return Ok(text);
        }

        if let Some(remote) = &self.remote {
            if let Some(id) = self.remote_id(hash)? {
                if let Some(text) = remote.get(&id)? {
                    self.backend.write(hash, &text)?;
                    return Ok(text);
                }
            }
        }

        Err(MailError::NotFound(format!("content {hash}")))
    }

    /// Check whether content for the given hash is available locally.
    pub fn contains(&self, hash: &str) -> Result<bool> {
        self.backend.exists(hash)
    }

    /// Look up the remote id for a hash, falling back to the persisted
    /// record when it is not cached yet.
    fn remote_id(&self, hash: &str) -> Result<Option<String>> {
        let mut ids = self.lock_ids()?;
        if let Some(id) = ids.get(hash) {
            return Ok(Some(id.clone()));
        }

        if let Some(id) = self.backend.read(&remote_id_key(hash))? {
            ids.insert(hash.to_string(), id.clone());
            return Ok(Some(id));
        }

        Ok(None)
    }

    fn lock_ids(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.remote_ids
            .lock()
            .map_err(|_| MailError::Storage("remote id map lock poisoned".to_string()))
    }
}
