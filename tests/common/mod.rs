//! Shared helpers for ledgermail integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use ledgermail::{
    DirectoryClient, IdentityKey, MemoryDirectory, Result,
};

/// Directory wrapper that counts every call, for asserting exactly which
/// network operations an operation performs.
#[derive(Default)]
pub struct CountingDirectory {
    inner: MemoryDirectory,
    pub resolves: AtomicUsize,
    pub registers: AtomicUsize,
    pub counts: AtomicUsize,
    pub fetches: AtomicUsize,
    pub appends: AtomicUsize,
}

impl CountingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_calls(&self) -> usize {
        self.counts.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

impl DirectoryClient for CountingDirectory {
    fn resolve_name(&self, public_id: &str) -> Result<Option<String>> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_name(public_id)
    }

    fn register_name(&self, identity: &IdentityKey, name: &str) -> Result<bool> {
        self.registers.fetch_add(1, Ordering::SeqCst);
        self.inner.register_name(identity, name)
    }

    fn message_count(&self, name: &str) -> Result<u64> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.message_count(name)
    }

    fn fetch_pointer(&self, name: &str, index: u64) -> Result<Option<String>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_pointer(name, index)
    }

    fn append_pointer(&self, identity: &IdentityKey, dest: &str, hash: &str) -> Result<bool> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.inner.append_pointer(identity, dest, hash)
    }
}

/// A deterministic identity for test fixtures.
pub fn identity(tag: u8) -> IdentityKey {
    IdentityKey::from_seed([tag; 32])
}
