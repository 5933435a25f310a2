//! Account-specific names of the special mailboxes
//!
//! Loaded from (in order of priority):
//! 1. `mailboxes.json` in the gmail-imap config directory
//! 2. The `GMAIL_MAILBOX_PREFIX` environment variable applied to the defaults
//! 3. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mailbox names filename in the config directory
const MAILBOXES_FILE: &str = "mailboxes.json";

/// Environment variable overriding the `[Gmail]` prefix
const PREFIX_ENV: &str = "GMAIL_MAILBOX_PREFIX";

const DEFAULT_PREFIX: &str = "[Gmail]";

/// Names of the mailboxes the message operations depend on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxNames {
    /// Mailbox holding sent messages, searched for the outgoing half of a thread
    pub sent: String,
    /// Mailbox every message lives in; the archive destination
    pub all_mail: String,
    /// Trash-like mailbox names in order of preference
    pub trash_candidates: Vec<String>,
}

impl Default for MailboxNames {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}

impl MailboxNames {
    /// Default names under a different special-folder prefix, e.g. `[Google Mail]`
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            sent: format!("{}/Sent Mail", prefix),
            all_mail: format!("{}/All Mail", prefix),
            trash_candidates: vec![format!("{}/Trash", prefix), format!("{}/Bin", prefix)],
        }
    }

    /// Load names using the following priority:
    /// 1. JSON file (~/.config/gmail-imap/mailboxes.json)
    /// 2. `GMAIL_MAILBOX_PREFIX` environment variable
    /// 3. Built-in defaults
    pub fn load() -> Result<Self> {
        let file = config::config_path(MAILBOXES_FILE);
        let prefix = std::env::var(PREFIX_ENV).ok();
        Self::load_from(file.as_deref(), prefix.as_deref())
    }

    /// Resolve names from an optional settings file and an optional prefix.
    ///
    /// An existing file wins over the prefix; a blank prefix counts as unset.
    pub fn load_from(file: Option<&Path>, prefix: Option<&str>) -> Result<Self> {
        if let Some(path) = file
            && path.is_file()
        {
            return Self::from_file(path);
        }

        if let Some(prefix) = prefix.map(str::trim)
            && !prefix.is_empty()
        {
            return Ok(Self::with_prefix(prefix));
        }

        Ok(Self::default())
    }

    /// Load names from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse names from a JSON string; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse mailbox names JSON")
    }

    /// Write these names to the config directory so later [`MailboxNames::load`] calls pick them up
    pub fn save(&self) -> Result<()> {
        config::save_json(MAILBOXES_FILE, self)
    }

    /// Write these names to a specific JSON file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        config::save_json_file(path, self)
    }

    /// Trash candidates, never empty
    pub fn trash_candidates(&self) -> Vec<String> {
        if self.trash_candidates.is_empty() {
            Self::default().trash_candidates
        } else {
            self.trash_candidates.clone()
        }
    }

    /// Whether `mailbox` is one of the trash-like mailboxes
    pub fn is_trash(&self, mailbox: &str) -> bool {
        self.trash_candidates().iter().any(|name| name == mailbox)
    }
}
