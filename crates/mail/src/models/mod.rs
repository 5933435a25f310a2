//! Domain models for mail entities

mod attachment;
mod flag;
mod message;
mod thread;

pub use attachment::Attachment;
pub use flag::Flag;
pub use message::{Message, MessageId, RawFetch, Uid};
pub use thread::ThreadId;
