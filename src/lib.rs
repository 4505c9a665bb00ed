//! ledgermail: decentralized store-and-forward mail.
//!
//! A public ledger serves only as a directory (name to address bindings and
//! a per-name message counter); message bodies live in a content-addressed
//! store. The [`Mailbox`] ties the two together: it resolves or registers a
//! name, publishes messages store-first, and pulls new messages with an
//! incremental, rate-limited sync.

pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod logging;
pub mod mailbox;
pub mod message;
pub mod store;

pub use config::Config;
pub use directory::{DirectoryClient, MemoryDirectory};
pub use error::{MailError, Result};
pub use identity::IdentityKey;
pub use mailbox::{Mailbox, SYNC_MIN_INTERVAL_SECS};
pub use message::{Attachment, CodecRegistry, Mail, Message, Payload};
pub use store::{content_hash, ContentBackend, ContentStore, FsBackend, MemoryBackend, RemoteStore};
