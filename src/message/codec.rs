//! Canonical message codec and kind registry.
//!
//! The wire form of a message is a single-key JSON object whose outer key
//! is the kind discriminator:
//!
//! ```text
//! {"mail":{"body":"Hello","from":"alice","subject":"Hi","to":"bob"}}
//! ```
//!
//! Object keys serialize sorted, so encoding is deterministic and content
//! hashes stay valid across re-serialization. Decoding reads the kind first
//! and dispatches to whichever decoder is registered for it.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{MailError, Result};

use super::mail::Mail;
use super::types::{required_str, Message, Payload};

/// Decoder function for one message kind.
pub type DecodeFn = fn(&Map<String, Value>) -> Result<Box<dyn Payload>>;

/// Registry of per-kind message decoders.
///
/// New kinds register a decoder; the dispatch itself never changes.
pub struct CodecRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Create a registry with the built-in kinds (`mail`) registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Mail::KIND, Mail::decode);
        registry
    }

    /// Register a decoder for a message kind, replacing any existing one.
    pub fn register(&mut self, kind: &str, decode: DecodeFn) {
        self.decoders.insert(kind.to_string(), decode);
    }

    /// Whether a decoder is registered for the given kind.
    pub fn supports(&self, kind: &str) -> bool {
        self.decoders.contains_key(kind)
    }

    /// Serialize a message to its canonical text.
    pub fn encode(&self, message: &Message) -> String {
        message.canonical_text()
    }

    /// Parse canonical text into a [`Message`].
    ///
    /// Fails with a decode error when the text is not a single-kind object,
    /// the kind is unregistered, or a required field is missing. Required
    /// identity fields (`from`, `to`) are never defaulted.
    pub fn decode(&self, text: &str) -> Result<Message> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| MailError::Decode(format!("malformed message text: {e}")))?;

        let root = value
            .as_object()
            .ok_or_else(|| MailError::Decode("message root is not an object".to_string()))?;

        let (kind, inner) = match root.iter().next() {
            Some(entry) if root.len() == 1 => entry,
            _ => {
                return Err(MailError::Decode(
                    "message root must hold exactly one kind".to_string(),
                ))
            }
        };

        let fields = inner.as_object().ok_or_else(|| {
            MailError::Decode(format!("message kind `{kind}` does not hold fields"))
        })?;

        let decode = self
            .decoders
            .get(kind.as_str())
            .ok_or_else(|| MailError::Decode(format!("unknown message kind `{kind}`")))?;

        let payload = decode(fields)?;
        let from = required_str(fields, "from")?.to_string();
        let to = required_str(fields, "to")?.to_string();

        // Rebuild the wrapper from the parsed tree so the content is
        // canonical regardless of the input text's formatting.
        let mut wrapper = Map::new();
        wrapper.insert(kind.clone(), Value::Object(fields.clone()));

        Ok(Message::new(
            kind.clone(),
            from,
            to,
            Value::Object(wrapper),
            payload,
        ))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
