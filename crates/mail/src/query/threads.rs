//! Thread reconstruction across the received and sent mailboxes

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::imap::{Session, Transport};
use crate::models::{Message, ThreadId, Uid};

impl Message {
    /// Every message of this message's conversation, oldest first.
    ///
    /// Searches the message's own mailbox and then the sent mailbox for the
    /// thread id, fetches the hits in one batch per mailbox and caches them
    /// in the session. The message's mailbox is selected again afterwards.
    /// A mailbox whose search or fetch the server refuses contributes
    /// nothing. The same message seen in both mailboxes under different
    /// UIDs appears twice.
    pub fn fetch_thread<T: Transport>(&mut self, session: &mut Session<T>) -> Result<Vec<Message>> {
        self.fetch(session, false, false)?;
        let Some(thread_id) = self.thread_id.clone() else {
            warn!("{} in {} has no thread id", self.uid, self.mailbox);
            return Ok(Vec::new());
        };

        let original = self.mailbox.clone();
        let sent_mailbox = session.names().sent.clone();
        info!("Fetching thread {} from {} and {}", thread_id, original, sent_mailbox);

        let received = fetch_thread_in(session, &original, &thread_id)?;
        let sent = fetch_thread_in(session, &sent_mailbox, &thread_id)?;
        session.use_mailbox(&original)?;

        let messages = merge_chronological(received, sent);
        info!("Thread {} has {} messages", thread_id, messages.len());
        Ok(messages)
    }
}

/// Search one mailbox for a thread and fully fetch what it finds
fn fetch_thread_in<T: Transport>(
    session: &mut Session<T>,
    mailbox: &str,
    thread_id: &ThreadId,
) -> Result<Vec<Message>> {
    let uids = session.search_thread(mailbox, thread_id)?;
    if uids.is_empty() {
        return Ok(Vec::new());
    }

    let mut stubs: BTreeMap<Uid, Message> = uids
        .into_iter()
        .map(|uid| (uid, Message::new(mailbox, uid)))
        .collect();
    let status = session.fetch_multiple_messages(mailbox, &mut stubs)?;
    if !status.is_ok() {
        return Ok(Vec::new());
    }

    debug!("Thread {} has {} messages in {}", thread_id, stubs.len(), mailbox);
    let messages: Vec<Message> = stubs.into_values().collect();
    session.cache_messages(mailbox, messages.iter().cloned());
    Ok(messages)
}

/// Combine two result sets and order them by `sent_at` ascending.
///
/// Messages are identified by mailbox and UID; a later duplicate replaces
/// the earlier one. Ties keep their input order.
pub fn merge_chronological(received: Vec<Message>, sent: Vec<Message>) -> Vec<Message> {
    let mut merged: Vec<Message> = Vec::with_capacity(received.len() + sent.len());
    for message in received.into_iter().chain(sent) {
        match merged
            .iter_mut()
            .find(|m| m.mailbox == message.mailbox && m.uid == message.uid)
        {
            Some(existing) => *existing = message,
            None => merged.push(message),
        }
    }

    merged.sort_by_key(|m| m.sent_at);
    merged
}
