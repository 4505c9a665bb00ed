//! Content-addressed storage for ledgermail.
//!
//! The store persists canonical message text under a hash derived from the
//! text, with an injected local backend and an optional remote pinning
//! service behind it.

mod backend;
mod content;

pub use backend::{ContentBackend, FsBackend, MemoryBackend};
pub use content::{content_hash, ContentStore, RemoteStore};
