//! Mailbox protocol layer
//!
//! The connection itself is an external collaborator behind [`Transport`].
//! This module defines the commands sent through it, the responses it
//! returns, the metadata parsers for FETCH items and the [`Session`] that
//! tracks mailbox state across calls.

mod command;
pub mod fetch;
mod memory;
mod response;
mod session;
mod transport;

pub use command::{FetchKind, StoreAction, UidCommand, quote};
pub use fetch::{FetchMetadata, parse_fetch_header, parse_flags, parse_labels, parse_message_id, parse_thread_id, parse_uid};
pub use memory::{InMemoryTransport, Request, StoredMessage};
pub use response::{Response, ResponseData, Status};
pub use session::{Mailbox, Session};
pub use transport::Transport;
