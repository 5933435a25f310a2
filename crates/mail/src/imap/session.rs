//! Mailbox session state
//!
//! The session owns the transport and every piece of state that depends on
//! it: which mailbox is selected, the per-mailbox message caches and the
//! account's label list. Operations that need a particular mailbox name it
//! explicitly and the session selects it on demand.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::{BTreeMap, HashMap};

use super::{FetchKind, Response, ResponseData, Status, Transport, UidCommand, fetch};
use crate::config::MailboxNames;
use crate::error::MailError;
use crate::models::{Message, ThreadId, Uid};

/// Cached messages of one mailbox, keyed by UID
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pub name: String,
    pub messages: BTreeMap<Uid, Message>,
}

impl Mailbox {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: BTreeMap::new(),
        }
    }
}

/// One logical connection to an account
///
/// Not shared between threads of control; give each its own session.
pub struct Session<T: Transport> {
    transport: T,
    names: MailboxNames,
    current: Option<String>,
    mailboxes: HashMap<String, Mailbox>,
    labels: Option<Vec<String>>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, names: MailboxNames) -> Self {
        Self {
            transport,
            names,
            current: None,
            mailboxes: HashMap::new(),
            labels: None,
        }
    }

    /// Select `mailbox` for subsequent commands
    pub fn use_mailbox(&mut self, mailbox: &str) -> Result<()> {
        debug!("Selecting {}", mailbox);
        let status = self
            .transport
            .select(mailbox)
            .with_context(|| format!("Failed to select {}", mailbox))?;

        if !status.is_ok() {
            self.current = None;
            return Err(MailError::SelectRejected {
                mailbox: mailbox.to_string(),
                status,
            }
            .into());
        }

        self.current = Some(mailbox.to_string());
        self.mailboxes
            .entry(mailbox.to_string())
            .or_insert_with(|| Mailbox::new(mailbox));
        Ok(())
    }

    /// The mailbox subsequent commands run in, if one is selected
    pub fn current_mailbox(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Cached messages of a mailbox that has been used in this session
    pub fn mailbox(&self, name: &str) -> Option<&Mailbox> {
        self.mailboxes.get(name)
    }

    pub fn names(&self) -> &MailboxNames {
        &self.names
    }

    /// Every mailbox/label name on the account, listed once per session
    pub fn labels(&mut self) -> Result<&[String]> {
        if self.labels.is_none() {
            self.refresh_labels()?;
        }
        Ok(self.labels.as_deref().unwrap_or_default())
    }

    /// List the labels again, replacing the cached copy
    pub fn refresh_labels(&mut self) -> Result<&[String]> {
        let labels = self
            .transport
            .list_mailboxes()
            .context("Failed to list mailboxes")?;
        debug!("Account has {} mailboxes", labels.len());
        Ok(self.labels.insert(labels).as_slice())
    }

    /// The trash-like mailbox that exists on this account.
    ///
    /// The first configured candidate present in the label list wins; when
    /// none is present the last candidate is assumed.
    pub fn trash_mailbox(&mut self) -> Result<String> {
        let candidates = self.names.trash_candidates();
        let labels = self.labels()?;

        let trash = candidates
            .iter()
            .find(|candidate| labels.contains(candidate))
            .or(candidates.last())
            .cloned()
            .unwrap_or_default();
        Ok(trash)
    }

    /// Issue a UID command in `mailbox`, selecting it first if needed
    pub fn uid_in(&mut self, mailbox: &str, command: &UidCommand) -> Result<Response> {
        if self.current.as_deref() != Some(mailbox) {
            self.use_mailbox(mailbox)?;
        }

        debug!("{} in {}", command, mailbox);
        self.transport
            .uid(command)
            .with_context(|| format!("{} failed in {}", command, mailbox))
    }

    /// Copy a message from `source` into `destination`
    pub fn copy(&mut self, uid: Uid, destination: &str, source: &str) -> Result<Status> {
        let command = UidCommand::Copy {
            uid,
            destination: destination.to_string(),
        };
        Ok(self.uid_in(source, &command)?.status)
    }

    /// UIDs in `mailbox` belonging to a thread.
    ///
    /// A search the server refuses finds nothing.
    pub fn search_thread(&mut self, mailbox: &str, thread_id: &ThreadId) -> Result<Vec<Uid>> {
        let command = UidCommand::Search {
            thread_id: thread_id.clone(),
        };
        let response = self.uid_in(mailbox, &command)?;
        if !response.status.is_ok() {
            debug!("{} in {} returned {}", command, mailbox, response.status);
            return Ok(Vec::new());
        }

        Ok(response
            .data
            .iter()
            .flat_map(|data| data.header().split_whitespace())
            .filter_map(Uid::parse)
            .collect())
    }

    /// Fully fetch every stub in one batched command.
    ///
    /// Each response item is routed to its stub by the item's `UID`; items
    /// without a known UID are skipped. Stubs are left untouched when the
    /// server refuses the fetch.
    pub fn fetch_multiple_messages(
        &mut self,
        mailbox: &str,
        stubs: &mut BTreeMap<Uid, Message>,
    ) -> Result<Status> {
        if stubs.is_empty() {
            return Ok(Status::Ok);
        }

        let command = UidCommand::Fetch {
            uids: stubs.keys().copied().collect(),
            kind: FetchKind::Full,
        };
        let response = self.uid_in(mailbox, &command)?;
        if !response.status.is_ok() {
            debug!("{} in {} returned {}", command, mailbox, response.status);
            return Ok(response.status);
        }

        for data in &response.data {
            route(stubs, data);
        }
        Ok(response.status)
    }

    /// Merge messages into the cache of `mailbox`, replacing entries with the same UID
    pub fn cache_messages(&mut self, mailbox: &str, messages: impl IntoIterator<Item = Message>) {
        let cache = self
            .mailboxes
            .entry(mailbox.to_string())
            .or_insert_with(|| Mailbox::new(mailbox));
        for message in messages {
            cache.messages.insert(message.uid, message);
        }
    }

    pub fn transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

fn route(stubs: &mut BTreeMap<Uid, Message>, data: &ResponseData) {
    let Some(uid) = fetch::parse_uid(data.header()) else {
        warn!("Fetch item without UID: {}", data.header());
        return;
    };

    match stubs.get_mut(&uid) {
        Some(stub) => stub.parse(data, false),
        None => warn!("Fetch item for unrequested UID {}", uid),
    }
}
