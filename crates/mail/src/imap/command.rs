//! UID-addressed commands issued through the transport

use std::fmt;

use crate::models::{Flag, ThreadId, Uid};

/// Data items requested by a FETCH
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Full message body plus metadata
    Full,
    /// Flags, thread id, message id and labels only; no body download
    Light,
}

impl FetchKind {
    pub fn items(&self) -> &'static str {
        match self {
            FetchKind::Full => "(BODY.PEEK[] FLAGS X-GM-THRID X-GM-MSGID X-GM-LABELS)",
            FetchKind::Light => "(FLAGS X-GM-THRID X-GM-MSGID X-GM-LABELS)",
        }
    }
}

/// A single STORE change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    AddFlag(Flag),
    RemoveFlag(Flag),
    AddLabel(String),
    RemoveLabel(String),
}

impl StoreAction {
    /// The STORE data item name, e.g. `+FLAGS`
    pub fn item(&self) -> &'static str {
        match self {
            StoreAction::AddFlag(_) => "+FLAGS",
            StoreAction::RemoveFlag(_) => "-FLAGS",
            StoreAction::AddLabel(_) => "+X-GM-LABELS",
            StoreAction::RemoveLabel(_) => "-X-GM-LABELS",
        }
    }

    /// The STORE value in wire form
    pub fn value(&self) -> String {
        match self {
            StoreAction::AddFlag(flag) | StoreAction::RemoveFlag(flag) => flag.to_string(),
            StoreAction::AddLabel(label) | StoreAction::RemoveLabel(label) => quote(label),
        }
    }
}

/// A UID command understood by [`Transport::uid`](super::Transport::uid)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidCommand {
    Fetch { uids: Vec<Uid>, kind: FetchKind },
    Store { uid: Uid, action: StoreAction },
    Search { thread_id: ThreadId },
    Copy { uid: Uid, destination: String },
}

impl UidCommand {
    /// Command name following `UID`
    pub fn name(&self) -> &'static str {
        match self {
            UidCommand::Fetch { .. } => "FETCH",
            UidCommand::Store { .. } => "STORE",
            UidCommand::Search { .. } => "SEARCH",
            UidCommand::Copy { .. } => "COPY",
        }
    }

    /// The UID set the command addresses; SEARCH addresses none
    pub fn identifier(&self) -> Option<String> {
        match self {
            UidCommand::Fetch { uids, .. } => Some(
                uids.iter()
                    .map(Uid::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            UidCommand::Store { uid, .. } | UidCommand::Copy { uid, .. } => Some(uid.to_string()),
            UidCommand::Search { .. } => None,
        }
    }

    /// Remaining arguments in wire form
    pub fn args(&self) -> Vec<String> {
        match self {
            UidCommand::Fetch { kind, .. } => vec![kind.items().to_string()],
            UidCommand::Store { action, .. } => vec![action.item().to_string(), action.value()],
            UidCommand::Search { thread_id } => vec![format!("(X-GM-THRID {})", thread_id)],
            UidCommand::Copy { destination, .. } => vec![quote(destination)],
        }
    }
}

impl fmt::Display for UidCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UID {}", self.name())?;
        if let Some(id) = self.identifier() {
            write!(f, " {}", id)?;
        }
        for arg in self.args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Render a string as an IMAP astring, quoting it when it is not a plain atom
pub fn quote(value: &str) -> String {
    let is_atom = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_graphic() && !matches!(c, '(' | ')' | '{' | '"' | '\\' | '%' | '*'));
    if is_atom {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
