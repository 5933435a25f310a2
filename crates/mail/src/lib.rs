//! Gmail-over-IMAP message model
//!
//! This crate turns raw mailbox protocol responses into structured messages:
//! - Header decoding with charset fallback
//! - Flag, label and Gmail identifier extraction from FETCH items
//! - MIME body walking into plain text, HTML and attachments
//! - Message mutations (read, star, label, delete, move, archive)
//! - Thread reconstruction across the received and sent mailboxes
//!
//! The connection itself is an external collaborator implementing
//! [`Transport`]; a [`Session`] wraps it with explicit mailbox state.

pub mod actions;
pub mod config;
pub mod decode;
pub mod error;
pub mod imap;
pub mod mime;
pub mod models;
pub mod query;

pub use actions::Ack;
pub use config::MailboxNames;
pub use decode::{decode_bytes, decode_header, parse_header, try_decode};
pub use error::MailError;
pub use imap::{
    FetchKind, InMemoryTransport, Mailbox, Response, ResponseData, Session, Status, StoreAction,
    StoredMessage, Transport, UidCommand,
};
pub use mime::{BodyParts, MimeMessage, MimeNode, PartInfo};
pub use models::{Attachment, Flag, Message, MessageId, RawFetch, ThreadId, Uid};
pub use query::merge_chronological;
