//! IMAP message flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// A protocol flag on a message
///
/// System flags are recognised case-insensitively; anything else is kept
/// as a keyword exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Seen,
    Answered,
    Flagged,
    Deleted,
    Draft,
    Recent,
    Keyword(String),
}

impl Flag {
    /// Parse a single flag token such as `\Seen` or `$Forwarded`
    pub fn parse(token: &str) -> Self {
        const SYSTEM: [(&str, Flag); 6] = [
            ("\\Seen", Flag::Seen),
            ("\\Answered", Flag::Answered),
            ("\\Flagged", Flag::Flagged),
            ("\\Deleted", Flag::Deleted),
            ("\\Draft", Flag::Draft),
            ("\\Recent", Flag::Recent),
        ];

        SYSTEM
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|(_, flag)| flag)
            .unwrap_or_else(|| Flag::Keyword(token.to_string()))
    }

    /// Wire form of the flag
    pub fn as_str(&self) -> &str {
        match self {
            Flag::Seen => "\\Seen",
            Flag::Answered => "\\Answered",
            Flag::Flagged => "\\Flagged",
            Flag::Deleted => "\\Deleted",
            Flag::Draft => "\\Draft",
            Flag::Recent => "\\Recent",
            Flag::Keyword(k) => k,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
