//! Mailbox identity keys.
//!
//! An [`IdentityKey`] is the keypair a mailbox is bound to. This crate only
//! needs it to produce a stable public identifier for directory lookups;
//! signing and transaction broadcast live in the wallet layer, outside this
//! crate.

use std::fmt;

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of the identity seed in bytes.
pub const SEED_LENGTH: usize = 32;

/// An identity keypair owning a mailbox.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityKey {
    seed: [u8; SEED_LENGTH],
    public_id: String,
}

impl IdentityKey {
    /// Generate a new identity from OS entropy.
    pub fn generate() -> Self {
        let mut seed = [0u8; SEED_LENGTH];
        rand::rng().fill_bytes(&mut seed);
        Self::from_seed(seed)
    }

    /// Reconstruct an identity from a seed.
    ///
    /// The same seed always yields the same public identifier.
    pub fn from_seed(seed: [u8; SEED_LENGTH]) -> Self {
        let public = Sha256::digest(seed);
        Self {
            seed,
            public_id: hex::encode(public),
        }
    }

    /// The stable public identifier used as the directory lookup key.
    pub fn public_id(&self) -> &str {
        &self.public_id
    }
}

impl fmt::Debug for IdentityKey {
    // Never print the seed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityKey")
            .field("public_id", &self.public_id)
            .finish_non_exhaustive()
    }
}
