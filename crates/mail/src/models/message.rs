//! Message entity: identity, decoded envelope, content and cached state

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::{Attachment, Flag, ThreadId};
use crate::decode::parse_header;
use crate::error::MailError;
use crate::imap::{FetchKind, ResponseData, Session, Transport, UidCommand, fetch};
use crate::mime::{self, MimeNode};

/// Protocol UID of a message, unique within one mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Uid(pub u32);

impl Uid {
    pub fn parse(s: &str) -> Option<Self> {
        s.trim().parse().ok().map(Self)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gmail message identifier (`X-GM-MSGID`), stable across mailboxes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unparsed FETCH data kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFetch {
    pub header: String,
    pub body: Option<Vec<u8>>,
}

/// One message in a mailbox
///
/// Constructed with identity only, then populated by [`Message::fetch`],
/// [`Message::fetch_light`] or a batched fetch through the session.
/// `flags` and `labels` cache the last known server state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// UID within `mailbox`
    pub uid: Uid,
    /// Name of the mailbox the UID belongs to
    pub mailbox: String,
    pub message_id: Option<MessageId>,
    pub thread_id: Option<ThreadId>,

    pub to: Option<String>,
    pub from: Option<String>,
    pub cc: Option<String>,
    pub delivered_to: Option<String>,
    pub subject: Option<String>,
    /// Date header, or the parse time when the header is missing or unreadable
    pub sent_at: Option<DateTime<Utc>>,

    /// Plain-text body
    pub body: Option<String>,
    /// HTML body
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,

    pub flags: Vec<Flag>,
    pub labels: Vec<String>,

    /// Decoded top-level headers from the last body parse
    pub headers: HashMap<String, String>,
    /// MIME tree from the last full fetch
    #[serde(skip)]
    pub mime: Option<MimeNode>,
    /// Raw FETCH data, kept only when requested
    pub raw: Option<RawFetch>,
}

impl Message {
    /// Create a message stub that has not been fetched yet
    pub fn new(mailbox: impl Into<String>, uid: Uid) -> Self {
        Self {
            uid,
            mailbox: mailbox.into(),
            message_id: None,
            thread_id: None,
            to: None,
            from: None,
            cc: None,
            delivered_to: None,
            subject: None,
            sent_at: None,
            body: None,
            html: None,
            attachments: Vec::new(),
            flags: Vec::new(),
            labels: Vec::new(),
            headers: HashMap::new(),
            mime: None,
            raw: None,
        }
    }

    pub fn is_read(&self) -> bool {
        self.flags.contains(&Flag::Seen)
    }

    pub fn is_starred(&self) -> bool {
        self.flags.contains(&Flag::Flagged)
    }

    pub fn is_draft(&self) -> bool {
        self.flags.contains(&Flag::Draft)
    }

    pub fn is_deleted(&self) -> bool {
        self.flags.contains(&Flag::Deleted)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Whether a full fetch has populated the body
    pub fn is_fetched(&self) -> bool {
        self.mime.is_some()
    }

    /// Apply the metadata blob of a FETCH item.
    ///
    /// Flags and labels are replaced; identifiers are only set when present.
    pub fn parse_fetch_header(&mut self, raw: &str) {
        let meta = fetch::parse_fetch_header(raw);
        self.flags = meta.flags;
        self.labels = meta.labels;
        if meta.thread_id.is_some() {
            self.thread_id = meta.thread_id;
        }
        if meta.message_id.is_some() {
            self.message_id = meta.message_id;
        }
    }

    /// Parse the message literal: envelope, date, bodies and attachments
    pub fn parse_fetch_body(&mut self, raw: &[u8]) {
        let parsed = mime::parse(raw);
        let decoded = |name: &str| parsed.header(name).map(parse_header);

        self.headers = parsed
            .headers
            .iter()
            .map(|h| (h.name.clone(), parse_header(&h.value)))
            .collect();
        self.to = decoded("To");
        self.from = decoded("From");
        self.cc = decoded("Cc");
        self.delivered_to = decoded("Delivered-To");
        self.subject = decoded("Subject");
        self.sent_at = Some(parse_sent_at(decoded("Date").as_deref()));

        let parts = mime::walk(&parsed.root);
        self.body = parts.body;
        self.html = parts.html;
        self.attachments = parts.attachments;
        self.mime = Some(parsed.root);
    }

    /// Apply one FETCH data item, which may or may not carry a body
    pub fn parse(&mut self, data: &ResponseData, keep_raw: bool) {
        let header = data.header();
        let body = data.body();

        self.parse_fetch_header(header);
        if let Some(body) = body
            && !body.is_empty()
        {
            self.parse_fetch_body(body);
        }

        if keep_raw {
            self.raw = Some(RawFetch {
                header: header.to_string(),
                body: body.map(<[u8]>::to_vec),
            });
        }
    }

    /// Fetch the full message unless it was already fetched.
    ///
    /// Downloads the body; use [`Message::fetch_light`] to refresh metadata only.
    pub fn fetch<T: Transport>(
        &mut self,
        session: &mut Session<T>,
        keep_raw: bool,
        force: bool,
    ) -> Result<Option<&MimeNode>> {
        if !self.is_fetched() || force {
            let data = self.request(session, FetchKind::Full)?;
            self.parse(&data, keep_raw);
        }
        Ok(self.mime.as_ref())
    }

    /// Refresh flags, labels and identifiers without downloading the body
    pub fn fetch_light<T: Transport>(&mut self, session: &mut Session<T>, keep_raw: bool) -> Result<()> {
        let data = self.request(session, FetchKind::Light)?;
        self.parse(&data, keep_raw);
        Ok(())
    }

    fn request<T: Transport>(&self, session: &mut Session<T>, kind: FetchKind) -> Result<ResponseData> {
        debug!("Fetching {} in {} ({:?})", self.uid, self.mailbox, kind);
        let command = UidCommand::Fetch {
            uids: vec![self.uid],
            kind,
        };
        let response = session.uid_in(&self.mailbox, &command)?;
        if !response.status.is_ok() {
            return Err(MailError::CommandRejected {
                command: command.to_string(),
                status: response.status,
            }
            .into());
        }

        response.data.into_iter().next().ok_or_else(|| {
            MailError::MissingResponse {
                command: command.to_string(),
            }
            .into()
        })
    }
}

/// Parse a Date header, substituting the current time when it is unusable
fn parse_sent_at(date: Option<&str>) -> DateTime<Utc> {
    date.and_then(parse_date).unwrap_or_else(Utc::now)
}

fn parse_date(date: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(date.trim()) {
        return Some(parsed.with_timezone(&Utc));
    }

    // mailparse is lenient about day names, spacing and zones, but would
    // also read a date out of text with no numbers at all
    if !date.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let timestamp = mailparse::dateparse(date).ok()?;
    Utc.timestamp_opt(timestamp, 0).single()
}
