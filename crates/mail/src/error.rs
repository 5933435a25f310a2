//! Protocol failures surfaced by this crate

use thiserror::Error;

use crate::imap::Status;

/// A command the server refused or answered unusably
///
/// Malformed message content never produces one of these; content problems
/// are recovered where they are parsed.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mailbox {mailbox} could not be selected: {status}")]
    SelectRejected { mailbox: String, status: Status },

    #[error("{command} failed: {status}")]
    CommandRejected { command: String, status: Status },

    #[error("{command} returned no data")]
    MissingResponse { command: String },
}
