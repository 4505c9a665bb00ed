//! Message model and canonical codec for ledgermail.

mod codec;
mod mail;
mod types;

pub use codec::{CodecRegistry, DecodeFn};
pub use mail::{Attachment, Mail};
pub use types::{optional_str, required_str, Message, Payload};
