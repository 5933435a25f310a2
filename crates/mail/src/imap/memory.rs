//! In-memory transport implementation
//!
//! Behaves like a small Gmail account: mailboxes hold messages by UID, and
//! FETCH, STORE, SEARCH and COPY act on them. Every request is recorded so
//! callers can assert on exactly what was sent. Used for testing.

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};

use super::{FetchKind, Response, ResponseData, Status, StoreAction, Transport, UidCommand, quote};
use crate::models::{Flag, MessageId, ThreadId, Uid};

/// A message held by the in-memory server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub thread_id: ThreadId,
    pub message_id: MessageId,
    pub flags: Vec<Flag>,
    pub labels: Vec<String>,
    pub raw: Vec<u8>,
}

impl StoredMessage {
    pub fn new(thread_id: impl Into<ThreadId>, message_id: impl Into<MessageId>, raw: &[u8]) -> Self {
        Self {
            thread_id: thread_id.into(),
            message_id: message_id.into(),
            flags: Vec::new(),
            labels: Vec::new(),
            raw: raw.to_vec(),
        }
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = Flag>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }
}

/// A request the transport received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Select(String),
    Uid { mailbox: String, command: UidCommand },
    List,
}

/// In-memory implementation of Transport
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    mailboxes: BTreeMap<String, BTreeMap<Uid, StoredMessage>>,
    selected: Option<String>,
    rejected: HashSet<(String, &'static str)>,
    requests: Vec<Request>,
}

impl InMemoryTransport {
    /// Create a new account with no mailboxes
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mailbox(&mut self, name: &str) {
        self.mailboxes.entry(name.to_string()).or_default();
    }

    /// Put a message into a mailbox, creating the mailbox if needed
    pub fn insert(&mut self, mailbox: &str, uid: Uid, message: StoredMessage) {
        self.mailboxes
            .entry(mailbox.to_string())
            .or_default()
            .insert(uid, message);
    }

    pub fn message(&self, mailbox: &str, uid: Uid) -> Option<&StoredMessage> {
        self.mailboxes.get(mailbox)?.get(&uid)
    }

    pub fn uids(&self, mailbox: &str) -> Vec<Uid> {
        self.mailboxes
            .get(mailbox)
            .map(|messages| messages.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Answer every later `command` (e.g. `"SEARCH"`) in `mailbox` with NO
    pub fn reject(&mut self, mailbox: &str, command: &'static str) {
        self.rejected.insert((mailbox.to_string(), command));
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// UID commands received, in order
    pub fn uid_commands(&self) -> Vec<&UidCommand> {
        self.requests
            .iter()
            .filter_map(|request| match request {
                Request::Uid { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.requests
            .iter()
            .filter(|request| matches!(request, Request::List))
            .count()
    }

    fn fetch(messages: &BTreeMap<Uid, StoredMessage>, uids: &[Uid], kind: FetchKind) -> Vec<ResponseData> {
        uids.iter()
            .filter_map(|uid| {
                let (seq, (_, message)) = messages.iter().enumerate().find(|(_, (u, _))| *u == uid)?;
                let labels: Vec<String> = message.labels.iter().map(|l| quote(l)).collect();
                let flags: Vec<&str> = message.flags.iter().map(Flag::as_str).collect();
                let header = format!(
                    "{} (X-GM-THRID {} X-GM-MSGID {} X-GM-LABELS ({}) UID {} FLAGS ({})",
                    seq + 1,
                    message.thread_id,
                    message.message_id.as_str(),
                    labels.join(" "),
                    uid,
                    flags.join(" "),
                );

                Some(match kind {
                    FetchKind::Full => ResponseData::Fetched {
                        header: format!("{} BODY[] {{{}}}", header, message.raw.len()),
                        body: Some(message.raw.clone()),
                    },
                    FetchKind::Light => ResponseData::Line(format!("{})", header)),
                })
            })
            .collect()
    }

    fn store(message: &mut StoredMessage, action: &StoreAction) {
        match action {
            StoreAction::AddFlag(flag) => {
                if !message.flags.contains(flag) {
                    message.flags.push(flag.clone());
                }
            }
            StoreAction::RemoveFlag(flag) => message.flags.retain(|f| f != flag),
            StoreAction::AddLabel(label) => {
                if !message.labels.contains(label) {
                    message.labels.push(label.clone());
                }
            }
            StoreAction::RemoveLabel(label) => message.labels.retain(|l| l != label),
        }
    }
}

impl Transport for InMemoryTransport {
    fn select(&mut self, mailbox: &str) -> Result<Status> {
        self.requests.push(Request::Select(mailbox.to_string()));
        if self.mailboxes.contains_key(mailbox) {
            self.selected = Some(mailbox.to_string());
            Ok(Status::Ok)
        } else {
            self.selected = None;
            Ok(Status::No)
        }
    }

    fn uid(&mut self, command: &UidCommand) -> Result<Response> {
        let Some(mailbox) = self.selected.clone() else {
            return Ok(Response::new(Status::Bad, Vec::new()));
        };
        self.requests.push(Request::Uid {
            mailbox: mailbox.clone(),
            command: command.clone(),
        });
        if self.rejected.contains(&(mailbox.clone(), command.name())) {
            return Ok(Response::new(Status::No, Vec::new()));
        }

        match command {
            UidCommand::Fetch { uids, kind } => {
                let data = self
                    .mailboxes
                    .get(&mailbox)
                    .map(|messages| Self::fetch(messages, uids, *kind))
                    .unwrap_or_default();
                Ok(Response::ok(data))
            }
            UidCommand::Store { uid, action } => {
                if let Some(message) = self.mailboxes.get_mut(&mailbox).and_then(|m| m.get_mut(uid)) {
                    Self::store(message, action);
                }
                Ok(Response::done())
            }
            UidCommand::Search { thread_id } => {
                let uids: Vec<String> = self
                    .mailboxes
                    .get(&mailbox)
                    .into_iter()
                    .flatten()
                    .filter(|(_, message)| &message.thread_id == thread_id)
                    .map(|(uid, _)| uid.to_string())
                    .collect();
                Ok(Response::ok(vec![ResponseData::Line(uids.join(" "))]))
            }
            UidCommand::Copy { uid, destination } => {
                let source = self.message(&mailbox, *uid).cloned();
                let (Some(message), Some(target)) = (source, self.mailboxes.get_mut(destination)) else {
                    return Ok(Response::new(Status::No, Vec::new()));
                };
                let next = target.keys().next_back().map_or(1, |last| last.0 + 1);
                target.insert(Uid(next), message);
                Ok(Response::done())
            }
        }
    }

    fn list_mailboxes(&mut self) -> Result<Vec<String>> {
        self.requests.push(Request::List);
        Ok(self.mailboxes.keys().cloned().collect())
    }
}
