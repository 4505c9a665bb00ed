//! Message model: the generic field tree and the typed envelope around it.

use std::any::Any;
use std::fmt;
use std::sync::OnceLock;

use serde_json::{Map, Value};

use crate::store::content_hash;
use crate::{MailError, Result};

/// Read a required string field from a message tree.
///
/// Absence or a non-string value is a decode error naming the field; the
/// codec never substitutes defaults for required fields.
pub fn required_str<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| MailError::Decode(format!("missing required field `{name}`")))
}

/// Read an optional string field, defaulting to the empty string.
pub fn optional_str<'a>(fields: &'a Map<String, Value>, name: &str) -> &'a str {
    fields.get(name).and_then(Value::as_str).unwrap_or("")
}

/// A typed message payload, one per message kind.
///
/// Payloads describe their own field tree; the codec registry maps the kind
/// discriminator back to a decoder, so new kinds plug in without touching
/// the dispatch.
pub trait Payload: fmt::Debug {
    /// The kind discriminator written as the outer key of the canonical form.
    fn kind(&self) -> &'static str;

    /// Write this payload's fields into the message tree.
    fn write_fields(&self, fields: &mut Map<String, Value>);

    /// Downcast support for callers that know the concrete payload type.
    fn as_any(&self) -> &dyn Any;
}

/// A message: resolved addresses, the canonical field tree, the typed
/// payload, and a lazily computed content hash.
///
/// Immutable after construction; sent messages are never edited in place.
#[derive(Debug)]
pub struct Message {
    kind: String,
    from: String,
    to: String,
    /// Canonical single-key wrapper object: `{ "<kind>": { ...fields } }`.
    content: Value,
    payload: Box<dyn Payload>,
    hash: OnceLock<String>,
}

impl Message {
    pub(crate) fn new(
        kind: String,
        from: String,
        to: String,
        content: Value,
        payload: Box<dyn Payload>,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            content,
            payload,
            hash: OnceLock::new(),
        }
    }

    /// Build a message from an outgoing payload.
    ///
    /// The payload must write `from` and `to` fields; both are required
    /// identity fields.
    pub fn compose(payload: impl Payload + 'static) -> Result<Self> {
        let mut fields = Map::new();
        payload.write_fields(&mut fields);

        let from = required_str(&fields, "from")?.to_string();
        let to = required_str(&fields, "to")?.to_string();

        let kind = payload.kind().to_string();
        let mut wrapper = Map::new();
        wrapper.insert(kind.clone(), Value::Object(fields));

        Ok(Self::new(
            kind,
            from,
            to,
            Value::Object(wrapper),
            Box::new(payload),
        ))
    }

    /// The message kind discriminator.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The sender name carried in the content.
    ///
    /// Resolved from content, not validated against the authenticated
    /// sender.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// The destination name carried in the content.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// The canonical field tree, including the kind wrapper.
    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Canonical serialized text.
    ///
    /// Object keys serialize in sorted order, so identical trees always
    /// produce identical text.
    pub fn canonical_text(&self) -> String {
        self.content.to_string()
    }

    /// Content hash of the canonical text, computed on first use and cached.
    ///
    /// A pure function of the serialized content: re-serializing identical
    /// content yields the same hash.
    pub fn hash(&self) -> &str {
        self.hash
            .get_or_init(|| content_hash(&self.canonical_text()))
    }

    /// The typed payload, if it is of type `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref()
    }
}
