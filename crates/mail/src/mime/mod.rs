//! MIME structure of a fetched message
//!
//! A raw RFC 5322 message is parsed with `mailparse` and converted into a
//! [`MimeNode`] tree, which the walker turns into body text and attachments.

mod walker;

pub use walker::{BodyParts, walk};

use log::warn;
use mailparse::{DispositionType, MailHeaderMap, ParsedMail, parse_mail};

use crate::decode::decode_text;

/// Parts nested deeper than this are kept as opaque leaves
const MAX_DEPTH: usize = 32;

/// Content metadata shared by every node kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartInfo {
    /// Lowercased `type/subtype`
    pub content_type: String,
    /// Charset parameter as declared, if any
    pub charset: Option<String>,
    /// Disposition type (`attachment`, `inline`, ...) when the part has a
    /// Content-Disposition header
    pub disposition: Option<String>,
    /// Decoded filename from the disposition or content-type parameters
    pub filename: Option<String>,
}

impl PartInfo {
    /// A bare text/plain part with no parameters
    pub fn text_plain() -> Self {
        Self {
            content_type: "text/plain".to_string(),
            charset: None,
            disposition: None,
            filename: None,
        }
    }

    /// Major type, e.g. `text` for `text/html`
    pub fn maintype(&self) -> &str {
        self.content_type
            .split_once('/')
            .map_or(self.content_type.as_str(), |(main, _)| main)
    }

    /// Whether this part should be extracted as an attachment
    pub fn is_attachment(&self) -> bool {
        self.disposition.is_some() && self.filename.is_some()
    }

    fn from_parsed(mail: &ParsedMail<'_>) -> Self {
        let ctype = &mail.ctype;
        let has_disposition = mail.headers.get_first_header("Content-Disposition").is_some();
        let disposition = mail.get_content_disposition();

        let filename = disposition
            .params
            .get("filename")
            .or_else(|| ctype.params.get("name"))
            .map(|name| decode_text(name));

        Self {
            content_type: ctype.mimetype.to_ascii_lowercase(),
            charset: ctype.params.get("charset").cloned(),
            disposition: has_disposition.then(|| match disposition.disposition {
                DispositionType::Inline => "inline".to_string(),
                DispositionType::Attachment => "attachment".to_string(),
                DispositionType::FormData => "form-data".to_string(),
                DispositionType::Extension(other) => other.to_ascii_lowercase(),
            }),
            filename,
        }
    }
}

/// A node in the MIME tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    /// A part with direct, transfer-decoded content
    Leaf { part: PartInfo, payload: Vec<u8> },
    /// A multipart container with ordered children
    Multipart {
        part: PartInfo,
        children: Vec<MimeNode>,
    },
    /// An attached `message/rfc822`, parsed into its own tree
    Embedded {
        part: PartInfo,
        message: Box<MimeNode>,
    },
}

impl MimeNode {
    pub fn part(&self) -> &PartInfo {
        match self {
            MimeNode::Leaf { part, .. }
            | MimeNode::Multipart { part, .. }
            | MimeNode::Embedded { part, .. } => part,
        }
    }

    fn from_parsed(mail: &ParsedMail<'_>, depth: usize) -> Self {
        let part = PartInfo::from_parsed(mail);

        if depth < MAX_DEPTH {
            if part.maintype() == "multipart" {
                let children = mail
                    .subparts
                    .iter()
                    .map(|child| Self::from_parsed(child, depth + 1))
                    .collect();
                return MimeNode::Multipart { part, children };
            }

            if part.content_type == "message/rfc822"
                && let Some(message) = embedded_message(mail, depth)
            {
                return MimeNode::Embedded {
                    part,
                    message: Box::new(message),
                };
            }
        }

        let payload = mail.get_body_raw().unwrap_or_else(|e| {
            warn!("Failed to decode {} part body: {}", part.content_type, e);
            Vec::new()
        });
        MimeNode::Leaf { part, payload }
    }
}

fn embedded_message(mail: &ParsedMail<'_>, depth: usize) -> Option<MimeNode> {
    if let Some(inner) = mail.subparts.first() {
        return Some(MimeNode::from_parsed(inner, depth + 1));
    }

    let raw = mail.get_body_raw().ok()?;
    let inner = parse_mail(&raw).ok()?;
    Some(MimeNode::from_parsed(&inner, depth + 1))
}

/// A header as it appeared in the message, before decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHeader {
    pub name: String,
    pub value: Vec<u8>,
}

/// A parsed message: its top-level headers and MIME tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeMessage {
    pub headers: Vec<RawHeader>,
    pub root: MimeNode,
}

impl MimeMessage {
    /// Raw value of the first header with this name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_slice())
    }
}

/// Parse a raw message. Never fails: input `mailparse` rejects is kept
/// as a single text/plain body over the raw bytes.
pub fn parse(raw: &[u8]) -> MimeMessage {
    match parse_mail(raw) {
        Ok(mail) => MimeMessage {
            headers: mail
                .headers
                .iter()
                .map(|h| RawHeader {
                    name: h.get_key(),
                    value: h.get_value_raw().to_vec(),
                })
                .collect(),
            root: MimeNode::from_parsed(&mail, 0),
        },
        Err(e) => {
            warn!("Unparsable message body ({}); keeping it as plain text", e);
            MimeMessage {
                headers: Vec::new(),
                root: MimeNode::Leaf {
                    part: PartInfo::text_plain(),
                    payload: raw.to_vec(),
                },
            }
        }
    }
}
