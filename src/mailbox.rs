//! Mailbox orchestration: identity resolution, one-time name registration,
//! outbound publishing, and incremental inbound sync.
//!
//! A mailbox is a session-scoped handle over durable external state (the
//! directory and the content store). All operations are blocking and are
//! expected to run sequentially from one logical owner; sync is a single
//! bounded unit of work driven by an external scheduler, never an internal
//! loop.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::directory::DirectoryClient;
use crate::identity::IdentityKey;
use crate::message::{CodecRegistry, Message};
use crate::store::ContentStore;
use crate::{MailError, Result};

/// Default minimum interval between sync passes, in seconds.
pub const SYNC_MIN_INTERVAL_SECS: u64 = 20;

/// A per-identity mailbox over a directory and a content store.
pub struct Mailbox<'a, D: DirectoryClient> {
    identity: IdentityKey,
    directory: &'a D,
    store: &'a ContentStore,
    codec: &'a CodecRegistry,
    /// Set at most once per identity, then immutable.
    name: Option<String>,
    /// Append-only, index-aligned with the directory counter.
    messages: Vec<Message>,
    /// Highest directory index already processed (appended or dropped).
    synced_index: u64,
    /// Indices whose content was present but undecodable. Dropped, never
    /// replaced by placeholders; exposed so callers can act on them.
    failed_indices: Vec<u64>,
    last_sync: Option<DateTime<Utc>>,
    min_interval_secs: u64,
    on_message: Option<Box<dyn Fn(&Message) + 'a>>,
}

impl<'a, D: DirectoryClient> Mailbox<'a, D> {
    /// Bind a mailbox to an identity over the given collaborators.
    ///
    /// The name is not resolved yet; call [`resolve`](Self::resolve) or
    /// [`register`](Self::register).
    pub fn new(
        identity: IdentityKey,
        directory: &'a D,
        store: &'a ContentStore,
        codec: &'a CodecRegistry,
    ) -> Self {
        Self {
            identity,
            directory,
            store,
            codec,
            name: None,
            messages: Vec::new(),
            synced_index: 0,
            failed_indices: Vec::new(),
            last_sync: None,
            min_interval_secs: SYNC_MIN_INTERVAL_SECS,
            on_message: None,
        }
    }

    /// Bind a mailbox whose sync scheduling comes from configuration.
    pub fn with_config(
        identity: IdentityKey,
        directory: &'a D,
        store: &'a ContentStore,
        codec: &'a CodecRegistry,
        config: &SyncConfig,
    ) -> Self {
        let mut mailbox = Self::new(identity, directory, store, codec);
        mailbox.min_interval_secs = config.min_interval_secs;
        mailbox
    }

    /// The identity this mailbox is bound to.
    pub fn identity(&self) -> &IdentityKey {
        &self.identity
    }

    /// The public identifier used for directory lookups.
    pub fn public_id(&self) -> &str {
        self.identity.public_id()
    }

    /// The resolved or registered name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The ordered message log.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Time of the last completed sync pass.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Directory indices dropped because their content failed to decode.
    pub fn failed_indices(&self) -> &[u64] {
        &self.failed_indices
    }

    /// Override the minimum sync interval. Mainly for configuration and
    /// tests; the default is [`SYNC_MIN_INTERVAL_SECS`].
    pub fn set_sync_interval(&mut self, secs: u64) {
        self.min_interval_secs = secs;
    }

    /// Install a callback invoked for each message appended by sync.
    pub fn on_message(&mut self, callback: impl Fn(&Message) + 'a) {
        self.on_message = Some(Box::new(callback));
    }

    /// Resolve this mailbox's name from the directory.
    ///
    /// Absence is a normal outcome, not an error; a directory fault is
    /// logged and reported as absence too; resolution never fails the
    /// mailbox. Once a name is known it is returned without a lookup.
    pub fn resolve(&mut self) -> Result<Option<String>> {
        if let Some(name) = &self.name {
            return Ok(Some(name.clone()));
        }

        match self.directory.resolve_name(self.identity.public_id()) {
            Ok(Some(name)) => {
                self.name = Some(name.clone());
                Ok(Some(name))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "name resolution failed");
                Ok(None)
            }
        }
    }

    /// Claim a name for this mailbox. One-time: a mailbox that already has
    /// a name fails with `AlreadyRegistered` and is left unchanged.
    ///
    /// The name is adopted locally only after the directory accepts the
    /// bind, so a crash between the two is recovered by a later
    /// [`resolve`](Self::resolve). Returns whether the directory accepted
    /// the claim.
    pub fn register(&mut self, name: &str) -> Result<bool> {
        if let Some(existing) = &self.name {
            return Err(MailError::AlreadyRegistered(existing.clone()));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(MailError::Validation("name is empty".to_string()));
        }

        let accepted = self.directory.register_name(&self.identity, name)?;
        if accepted {
            self.name = Some(name.to_string());
            info!(name, "registered mailbox name");
        }

        Ok(accepted)
    }

    /// Publish a message to its destination.
    ///
    /// The destination is validated before any external call. The content
    /// is stored first and linked second: a stored-but-unlinked blob is
    /// acceptable garbage, a linked-but-unstored pointer is not. Returns
    /// the result of the directory append; the content stays stored either
    /// way.
    pub fn send(&self, message: &Message) -> Result<bool> {
        self.validate_destination(message.to())?;

        let hash = self.store.put(&message.canonical_text())?;
        self.send_pointer(message.to(), &hash)
    }

    /// Link an already-stored content hash under a destination name.
    pub fn send_pointer(&self, dest: &str, hash: &str) -> Result<bool> {
        self.validate_destination(dest)?;

        if hash.is_empty() {
            return Err(MailError::Validation("content hash is empty".to_string()));
        }

        self.directory.append_pointer(&self.identity, dest, hash)
    }

    fn validate_destination(&self, dest: &str) -> Result<()> {
        if dest.is_empty() {
            return Err(MailError::Validation(
                "destination name is empty".to_string(),
            ));
        }

        if Some(dest) == self.name.as_deref() {
            return Err(MailError::Validation(
                "cannot send to own mailbox".to_string(),
            ));
        }

        Ok(())
    }

    /// Fetch messages appended to the directory since the last pass.
    ///
    /// Returns `Ok(false)` without any network work when the mailbox has no
    /// name or when called within the minimum interval of the previous
    /// pass. Otherwise walks the directory indices above the watermark
    /// strictly in order and returns whether the directory count changed.
    ///
    /// A pointer or content that fails to resolve stops the pass; the same
    /// index is retried next sync and indices already appended are never
    /// re-fetched. Content that resolves but fails to decode is dropped and
    /// recorded in [`failed_indices`](Self::failed_indices).
    pub fn sync(&mut self) -> Result<bool> {
        let Some(name) = self.name.clone() else {
            return Ok(false);
        };

        if let Some(last) = self.last_sync {
            if Utc::now() - last < Duration::seconds(self.min_interval_secs as i64) {
                return Ok(false);
            }
        }

        self.sync_pass(&name)
    }

    fn sync_pass(&mut self, name: &str) -> Result<bool> {
        let count = self.directory.message_count(name)?;
        let start = self.synced_index;

        for index in start + 1..=count {
            match self.fetch_message(name, index) {
                Ok(Some(message)) => {
                    self.messages.push(message);
                    self.synced_index = index;
                    if let Some(callback) = &self.on_message {
                        if let Some(message) = self.messages.last() {
                            callback(message);
                        }
                    }
                }
                Ok(None) => {
                    // Transient: retry from this index next pass.
                    break;
                }
                Err(MailError::Decode(reason)) => {
                    warn!(index, %reason, "dropping undecodable message");
                    self.failed_indices.push(index);
                    self.synced_index = index;
                }
                Err(e) => return Err(e),
            }
        }

        self.last_sync = Some(Utc::now());
        Ok(count != start)
    }

    /// Resolve one directory index to a decoded message.
    ///
    /// `Ok(None)` marks a transient failure (missing pointer or content not
    /// yet in the store); a decode failure surfaces as an error for the
    /// caller to classify.
    fn fetch_message(&self, name: &str, index: u64) -> Result<Option<Message>> {
        let pointer = match self.directory.fetch_pointer(name, index) {
            Ok(pointer) => pointer,
            Err(e) => {
                warn!(index, error = %e, "pointer fetch failed");
                return Ok(None);
            }
        };

        let Some(hash) = pointer else {
            warn!(index, "directory returned no pointer");
            return Ok(None);
        };

        let text = match self.store.get(&hash) {
            Ok(text) => text,
            Err(MailError::NotFound(_)) => {
                warn!(index, %hash, "content not yet available");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        self.codec.decode(&text).map(Some)
    }
}
