//! The ledger-backed name directory.
//!
//! The directory is an external collaborator: it binds names to public
//! identifiers and keeps, per name, a counter and an indexed list of message
//! pointers (content hashes). This crate consumes it through the
//! [`DirectoryClient`] trait; the real ledger client lives outside.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::identity::IdentityKey;
use crate::{MailError, Result};

/// Client contract for the name directory.
///
/// All calls are blocking and synchronous from the mailbox's point of view;
/// a caller wanting a timeout wraps the call boundary. Pointer indices are
/// 1-based, matching the directory's message counter.
pub trait DirectoryClient {
    /// Look up the name bound to a public identifier, if any.
    fn resolve_name(&self, public_id: &str) -> Result<Option<String>>;

    /// Bind a name to the identity's public identifier.
    ///
    /// Returns `false` when the directory refuses the claim (name taken or
    /// identifier already bound).
    fn register_name(&self, identity: &IdentityKey, name: &str) -> Result<bool>;

    /// Current message count for a name.
    fn message_count(&self, name: &str) -> Result<u64>;

    /// Fetch the pointer hash stored at a 1-based index, if present.
    fn fetch_pointer(&self, name: &str, index: u64) -> Result<Option<String>>;

    /// Append a pointer hash under the destination name.
    ///
    /// Returns `false` when the directory rejects the append (for example,
    /// an unregistered destination).
    fn append_pointer(&self, identity: &IdentityKey, dest: &str, hash: &str) -> Result<bool>;
}

#[derive(Debug, Default)]
struct DirectoryState {
    /// public id -> name
    names: HashMap<String, String>,
    /// name -> public id
    owners: HashMap<String, String>,
    /// name -> ordered pointer hashes
    pointers: HashMap<String, Vec<String>>,
}

/// In-memory directory for tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DirectoryState>> {
        self.state
            .lock()
            .map_err(|_| MailError::Directory("directory lock poisoned".to_string()))
    }
}

impl DirectoryClient for MemoryDirectory {
    fn resolve_name(&self, public_id: &str) -> Result<Option<String>> {
        Ok(self.lock()?.names.get(public_id).cloned())
    }

    fn register_name(&self, identity: &IdentityKey, name: &str) -> Result<bool> {
        let mut state = self.lock()?;
        let public_id = identity.public_id();

        if state.names.contains_key(public_id) || state.owners.contains_key(name) {
            return Ok(false);
        }

        state.names.insert(public_id.to_string(), name.to_string());
        state.owners.insert(name.to_string(), public_id.to_string());
        state.pointers.insert(name.to_string(), Vec::new());
        Ok(true)
    }

    fn message_count(&self, name: &str) -> Result<u64> {
        Ok(self
            .lock()?
            .pointers
            .get(name)
            .map(|p| p.len() as u64)
            .unwrap_or(0))
    }

    fn fetch_pointer(&self, name: &str, index: u64) -> Result<Option<String>> {
        if index == 0 {
            return Ok(None);
        }

        Ok(self
            .lock()?
            .pointers
            .get(name)
            .and_then(|p| p.get((index - 1) as usize))
            .cloned())
    }

    fn append_pointer(&self, _identity: &IdentityKey, dest: &str, hash: &str) -> Result<bool> {
        let mut state = self.lock()?;

        if !state.owners.contains_key(dest) {
            return Ok(false);
        }

        state
            .pointers
            .entry(dest.to_string())
            .or_default()
            .push(hash.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(tag: u8) -> IdentityKey {
        IdentityKey::from_seed([tag; 32])
    }

    #[test]
    fn test_register_and_resolve() {
        let dir = MemoryDirectory::new();
        let alice = identity(1);

        assert!(dir.register_name(&alice, "alice").unwrap());
        assert_eq!(
            dir.resolve_name(alice.public_id()).unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn test_resolve_unbound_is_none() {
        let dir = MemoryDirectory::new();
        assert_eq!(dir.resolve_name("unknown").unwrap(), None);
    }

    #[test]
    fn test_register_taken_name_refused() {
        let dir = MemoryDirectory::new();

        assert!(dir.register_name(&identity(1), "alice").unwrap());
        assert!(!dir.register_name(&identity(2), "alice").unwrap());
    }

    #[test]
    fn test_register_second_name_refused() {
        let dir = MemoryDirectory::new();
        let alice = identity(1);

        assert!(dir.register_name(&alice, "alice").unwrap());
        assert!(!dir.register_name(&alice, "alice2").unwrap());
        assert_eq!(
            dir.resolve_name(alice.public_id()).unwrap().as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn test_append_and_fetch_pointers() {
        let dir = MemoryDirectory::new();
        let alice = identity(1);
        let bob = identity(2);

        dir.register_name(&bob, "bob").unwrap();

        assert!(dir.append_pointer(&alice, "bob", "hash-1").unwrap());
        assert!(dir.append_pointer(&alice, "bob", "hash-2").unwrap());

        assert_eq!(dir.message_count("bob").unwrap(), 2);
        assert_eq!(
            dir.fetch_pointer("bob", 1).unwrap().as_deref(),
            Some("hash-1")
        );
        assert_eq!(
            dir.fetch_pointer("bob", 2).unwrap().as_deref(),
            Some("hash-2")
        );
    }

    #[test]
    fn test_fetch_pointer_out_of_range() {
        let dir = MemoryDirectory::new();
        let bob = identity(2);
        dir.register_name(&bob, "bob").unwrap();

        assert_eq!(dir.fetch_pointer("bob", 0).unwrap(), None);
        assert_eq!(dir.fetch_pointer("bob", 1).unwrap(), None);
    }

    #[test]
    fn test_append_to_unknown_name_refused() {
        let dir = MemoryDirectory::new();
        assert!(!dir.append_pointer(&identity(1), "nobody", "hash").unwrap());
    }

    #[test]
    fn test_count_for_unknown_name_is_zero() {
        let dir = MemoryDirectory::new();
        assert_eq!(dir.message_count("nobody").unwrap(), 0);
    }
}
