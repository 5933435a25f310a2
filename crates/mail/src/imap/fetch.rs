//! Metadata extraction from FETCH response text
//!
//! A FETCH item's metadata arrives as one text blob such as
//! `1 (X-GM-THRID 1278455344230334865 X-GM-MSGID 1278455344230334865
//! X-GM-LABELS (\Inbox "Work Stuff") UID 42 FLAGS (\Seen))`. The helpers
//! here pull individual fields out of that blob. A field that is not
//! present comes back empty or `None`, never as a default value.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Flag, MessageId, ThreadId, Uid};

static FLAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(])FLAGS \(([^)]*)\)").expect("flags pattern is valid")
});
static THREAD_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"X-GM-THRID (\d+)").expect("thread id pattern is valid"));
static MESSAGE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"X-GM-MSGID (\d+)").expect("message id pattern is valid"));
static UID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(])UID (\d+)").expect("uid pattern is valid"));

const LABELS_KEY: &str = "X-GM-LABELS (";

/// Everything a FETCH metadata blob says about a message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchMetadata {
    pub flags: Vec<Flag>,
    pub labels: Vec<String>,
    pub thread_id: Option<ThreadId>,
    pub message_id: Option<MessageId>,
}

/// Extract flags, labels and Gmail identifiers from a metadata blob
pub fn parse_fetch_header(raw: &str) -> FetchMetadata {
    FetchMetadata {
        flags: parse_flags(raw),
        labels: parse_labels(raw),
        thread_id: parse_thread_id(raw),
        message_id: parse_message_id(raw),
    }
}

/// The `FLAGS (...)` list; the last occurrence wins
pub fn parse_flags(raw: &str) -> Vec<Flag> {
    FLAGS
        .captures_iter(raw)
        .last()
        .and_then(|captures| captures.get(1))
        .map(|list| list.as_str().split_whitespace().map(Flag::parse).collect())
        .unwrap_or_default()
}

pub fn parse_thread_id(raw: &str) -> Option<ThreadId> {
    capture_digits(&THREAD_ID, raw).map(ThreadId::new)
}

pub fn parse_message_id(raw: &str) -> Option<MessageId> {
    capture_digits(&MESSAGE_ID, raw).map(MessageId::new)
}

pub fn parse_uid(raw: &str) -> Option<Uid> {
    capture_digits(&UID, raw).and_then(Uid::parse)
}

fn capture_digits<'a>(pattern: &Regex, raw: &'a str) -> Option<&'a str> {
    pattern
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// The `X-GM-LABELS (...)` list with quoting removed.
///
/// Tokens are separated by unquoted spaces. Inside a token `\\`, `\"` and
/// `\ ` stand for the escaped character; any other backslash sequence is
/// kept as is, so system labels such as `\Inbox` survive. An unterminated
/// list counts as absent.
pub fn parse_labels(raw: &str) -> Vec<String> {
    let Some(start) = raw.find(LABELS_KEY) else {
        return Vec::new();
    };

    let mut labels = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut in_quotes = false;
    let mut closed = false;
    let mut chars = raw[start + LABELS_KEY.len()..].chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                has_token = true;
                match chars.next() {
                    Some(escaped @ ('\\' | '"' | ' ')) => current.push(escaped),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => current.push('\\'),
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            ')' if !in_quotes => {
                closed = true;
                break;
            }
            ' ' if !in_quotes => {
                if has_token {
                    labels.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            _ => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if !closed {
        return Vec::new();
    }
    if has_token {
        labels.push(current);
    }
    labels
}
