//! The `mail` message kind: subject, body, and content-addressed attachments.

use std::any::Any;

use serde_json::{json, Map, Value};

use crate::{MailError, Result};

use super::types::{optional_str, required_str, Message, Payload};

/// A content-addressed attachment reference.
///
/// The hash points at separately stored bytes, so a mail and its attachments
/// form a shallow DAG: mail -> attachment hash -> stored content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name, for display only.
    pub file_name: String,
    /// Content hash of the attachment bytes.
    pub hash: String,
}

impl Attachment {
    /// Create an attachment reference.
    pub fn new(file_name: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            hash: hash.into(),
        }
    }
}

/// A mail payload.
#[derive(Debug, Clone)]
pub struct Mail {
    /// Sender name.
    pub from: String,
    /// Destination name.
    pub to: String,
    /// Mail subject.
    pub subject: String,
    /// Mail body.
    pub body: String,
    /// Ordered attachment references.
    pub attachments: Vec<Attachment>,
}

impl Mail {
    /// Kind discriminator for mail messages.
    pub const KIND: &'static str = "mail";

    /// Create an outgoing mail.
    pub fn create(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    /// Append an attachment reference.
    pub fn attach(mut self, file_name: impl Into<String>, hash: impl Into<String>) -> Self {
        self.attachments.push(Attachment::new(file_name, hash));
        self
    }

    /// Wrap this mail into a sendable [`Message`].
    pub fn into_message(self) -> Result<Message> {
        Message::compose(self)
    }

    /// Decode a mail from its field tree.
    ///
    /// `from` and `to` are required; `subject` and `body` default to empty.
    /// Attachment entries must each carry `filename` and `hash`.
    pub(crate) fn decode(fields: &Map<String, Value>) -> Result<Box<dyn Payload>> {
        let from = required_str(fields, "from")?.to_string();
        let to = required_str(fields, "to")?.to_string();
        let subject = optional_str(fields, "subject").to_string();
        let body = optional_str(fields, "body").to_string();

        let mut attachments = Vec::new();
        if let Some(items) = fields.get("attachments") {
            let items = items.as_array().ok_or_else(|| {
                MailError::Decode("field `attachments` is not a list".to_string())
            })?;
            for item in items {
                let entry = item.as_object().ok_or_else(|| {
                    MailError::Decode("attachment entry is not an object".to_string())
                })?;
                let file_name = entry.get("filename").and_then(Value::as_str).ok_or_else(
                    || MailError::Decode("missing required field `attachments[].filename`".to_string()),
                )?;
                let hash = entry.get("hash").and_then(Value::as_str).ok_or_else(|| {
                    MailError::Decode("missing required field `attachments[].hash`".to_string())
                })?;
                attachments.push(Attachment::new(file_name, hash));
            }
        }

        Ok(Box::new(Mail {
            from,
            to,
            subject,
            body,
            attachments,
        }))
    }
}

impl Payload for Mail {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn write_fields(&self, fields: &mut Map<String, Value>) {
        fields.insert("from".to_string(), json!(self.from));
        fields.insert("to".to_string(), json!(self.to));
        fields.insert("subject".to_string(), json!(self.subject));
        fields.insert("body".to_string(), json!(self.body));

        if !self.attachments.is_empty() {
            let items: Vec<Value> = self
                .attachments
                .iter()
                .map(|a| json!({ "filename": a.file_name, "hash": a.hash }))
                .collect();
            fields.insert("attachments".to_string(), Value::Array(items));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
