//! Contract of the connection component

use anyhow::Result;

use super::{Response, Status, UidCommand};

/// Request/response primitive provided by an authenticated IMAP connection
///
/// Implementations own connecting, authenticating and the wire format.
/// Errors returned here are transport failures and are propagated to the
/// caller unchanged; this layer never retries.
pub trait Transport {
    /// Select a mailbox for subsequent UID commands
    fn select(&mut self, mailbox: &str) -> Result<Status>;

    /// Issue a UID command in the selected mailbox
    fn uid(&mut self, command: &UidCommand) -> Result<Response>;

    /// Names of every mailbox (Gmail label) on the account
    fn list_mailboxes(&mut self) -> Result<Vec<String>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn select(&mut self, mailbox: &str) -> Result<Status> {
        (**self).select(mailbox)
    }

    fn uid(&mut self, command: &UidCommand) -> Result<Response> {
        (**self).uid(command)
    }

    fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        (**self).list_mailboxes()
    }
}
