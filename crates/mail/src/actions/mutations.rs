//! Flag and label mutations on a message
//!
//! Actions are performed in two steps:
//! 1. Issue the command through the session
//! 2. Update the message's cached flags or labels
//!
//! A transport failure aborts before step 2. A command the server answers
//! with NO or BAD still updates the cache and reports [`Ack::Unconfirmed`].

use anyhow::Result;
use log::info;

use super::Ack;
use crate::imap::{Session, StoreAction, Transport, UidCommand};
use crate::models::{Flag, Message};

impl Message {
    /// Mark as read
    pub fn read<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Ack> {
        self.add_flag(session, Flag::Seen)
    }

    /// Mark as unread
    pub fn unread<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Ack> {
        self.remove_flag(session, Flag::Seen)
    }

    pub fn star<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Ack> {
        self.add_flag(session, Flag::Flagged)
    }

    pub fn unstar<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Ack> {
        self.remove_flag(session, Flag::Flagged)
    }

    pub fn add_label<T: Transport>(&mut self, session: &mut Session<T>, label: &str) -> Result<Ack> {
        info!("Adding label {} to {} in {}", label, self.uid, self.mailbox);
        let ack = self.store(session, StoreAction::AddLabel(label.to_string()))?;
        if !self.has_label(label) {
            self.labels.push(label.to_string());
        }
        Ok(ack)
    }

    pub fn remove_label<T: Transport>(&mut self, session: &mut Session<T>, label: &str) -> Result<Ack> {
        info!("Removing label {} from {} in {}", label, self.uid, self.mailbox);
        let ack = self.store(session, StoreAction::RemoveLabel(label.to_string()))?;
        self.labels.retain(|l| l != label);
        Ok(ack)
    }

    /// Flag as deleted and move to the account's trash.
    ///
    /// A message already in a trash-like mailbox is only flagged.
    pub fn delete<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Ack> {
        info!("Deleting {} in {}", self.uid, self.mailbox);
        let ack = self.add_flag(session, Flag::Deleted)?;
        if session.names().is_trash(&self.mailbox) {
            return Ok(ack);
        }

        let trash = session.trash_mailbox()?;
        Ok(ack.and(self.move_to(session, &trash)?))
    }

    /// Copy into `target`, then delete from the current mailbox.
    ///
    /// Moving into a trash-like mailbox only copies; the delete that led
    /// here has already flagged the original.
    pub fn move_to<T: Transport>(&mut self, session: &mut Session<T>, target: &str) -> Result<Ack> {
        info!("Moving {} from {} to {}", self.uid, self.mailbox, target);
        let ack = Ack::from(session.copy(self.uid, target, &self.mailbox)?);
        if session.names().is_trash(target) {
            return Ok(ack);
        }

        Ok(ack.and(self.delete(session)?))
    }

    /// Move into the all-mail mailbox
    pub fn archive<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Ack> {
        let all_mail = session.names().all_mail.clone();
        self.move_to(session, &all_mail)
    }

    fn add_flag<T: Transport>(&mut self, session: &mut Session<T>, flag: Flag) -> Result<Ack> {
        info!("Adding {} to {} in {}", flag, self.uid, self.mailbox);
        let ack = self.store(session, StoreAction::AddFlag(flag.clone()))?;
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        Ok(ack)
    }

    fn remove_flag<T: Transport>(&mut self, session: &mut Session<T>, flag: Flag) -> Result<Ack> {
        info!("Removing {} from {} in {}", flag, self.uid, self.mailbox);
        let ack = self.store(session, StoreAction::RemoveFlag(flag.clone()))?;
        self.flags.retain(|f| *f != flag);
        Ok(ack)
    }

    fn store<T: Transport>(&self, session: &mut Session<T>, action: StoreAction) -> Result<Ack> {
        let command = UidCommand::Store { uid: self.uid, action };
        let response = session.uid_in(&self.mailbox, &command)?;
        Ok(Ack::from(response.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailboxNames;
    use crate::imap::{InMemoryTransport, StoredMessage};
    use crate::models::Uid;

    const RAW: &[u8] = b"Subject: hi\r\n\r\nbody\r\n";

    fn session() -> Session<InMemoryTransport> {
        let mut transport = InMemoryTransport::new();
        transport.insert("INBOX", Uid(5), StoredMessage::new("1", "2", RAW).with_labels(["Work"]));
        transport.add_mailbox("[Gmail]/All Mail");
        transport.add_mailbox("[Gmail]/Trash");
        Session::new(transport, MailboxNames::default())
    }

    fn store_commands(session: &mut Session<InMemoryTransport>) -> Vec<String> {
        session
            .transport()
            .uid_commands()
            .into_iter()
            .map(UidCommand::to_string)
            .collect()
    }

    #[test]
    fn test_read_unread() {
        let mut session = session();
        let mut message = Message::new("INBOX", Uid(5));

        assert!(message.read(&mut session).unwrap().is_confirmed());
        assert!(message.is_read());
        assert!(session.transport().message("INBOX", Uid(5)).unwrap().flags.contains(&Flag::Seen));

        message.unread(&mut session).unwrap();
        assert!(!message.is_read());
        assert_eq!(
            store_commands(&mut session),
            vec!["UID STORE 5 +FLAGS \\Seen", "UID STORE 5 -FLAGS \\Seen"]
        );
    }

    #[test]
    fn test_star_twice_keeps_single_flag() {
        let mut session = session();
        let mut message = Message::new("INBOX", Uid(5));
        message.star(&mut session).unwrap();
        message.star(&mut session).unwrap();
        assert_eq!(message.flags, vec![Flag::Flagged]);
    }

    #[test]
    fn test_labels() {
        let mut session = session();
        let mut message = Message::new("INBOX", Uid(5));

        message.add_label(&mut session, "Receipts 2024").unwrap();
        assert!(message.has_label("Receipts 2024"));
        message.remove_label(&mut session, "Receipts 2024").unwrap();
        assert!(!message.has_label("Receipts 2024"));

        assert_eq!(
            store_commands(&mut session),
            vec![
                "UID STORE 5 +X-GM-LABELS \"Receipts 2024\"",
                "UID STORE 5 -X-GM-LABELS \"Receipts 2024\"",
            ]
        );
    }

    #[test]
    fn test_rejected_store_is_unconfirmed_but_cached() {
        let mut session = session();
        session.transport().reject("INBOX", "STORE");
        let mut message = Message::new("INBOX", Uid(5));

        let ack = message.star(&mut session).unwrap();
        assert_eq!(ack, Ack::Unconfirmed);
        assert!(message.is_starred());
    }

    #[test]
    fn test_delete_moves_to_existing_trash() {
        let mut session = session();
        let mut message = Message::new("INBOX", Uid(5));

        assert!(message.delete(&mut session).unwrap().is_confirmed());
        assert!(message.is_deleted());
        assert_eq!(
            store_commands(&mut session),
            vec!["UID STORE 5 +FLAGS \\Deleted", "UID COPY 5 \"[Gmail]/Trash\""]
        );
        assert_eq!(session.transport().uids("[Gmail]/Trash").len(), 1);
    }

    #[test]
    fn test_delete_in_trash_does_not_move() {
        let mut session = session();
        session.transport().insert("[Gmail]/Trash", Uid(9), StoredMessage::new("1", "2", RAW));
        let mut message = Message::new("[Gmail]/Trash", Uid(9));

        message.delete(&mut session).unwrap();
        let commands = store_commands(&mut session);
        assert_eq!(commands, vec!["UID STORE 9 +FLAGS \\Deleted"]);
        assert_eq!(session.transport().list_calls(), 0);
    }

    #[test]
    fn test_archive() {
        let mut session = session();
        let mut message = Message::new("INBOX", Uid(5));

        message.archive(&mut session).unwrap();
        assert_eq!(
            store_commands(&mut session),
            vec![
                "UID COPY 5 \"[Gmail]/All Mail\"",
                "UID STORE 5 +FLAGS \\Deleted",
                "UID COPY 5 \"[Gmail]/Trash\"",
            ]
        );
        assert_eq!(session.transport().uids("[Gmail]/All Mail").len(), 1);
    }

    #[test]
    fn test_move_with_failed_copy_is_unconfirmed() {
        let mut session = session();
        let mut message = Message::new("INBOX", Uid(5));

        let ack = message.move_to(&mut session, "Missing").unwrap();
        assert_eq!(ack, Ack::Unconfirmed);
        assert!(message.is_deleted());
    }
}
