//! Responses returned by the transport

use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion status of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ok,
    No,
    Bad,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "OK",
            Status::No => "NO",
            Status::Bad => "BAD",
        })
    }
}

/// One untagged data item of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseData {
    /// A FETCH item: the metadata text and, when requested, the message literal
    Fetched { header: String, body: Option<Vec<u8>> },
    /// A bare text line (SEARCH results, body-less FETCH items)
    Line(String),
}

impl ResponseData {
    /// The metadata text of the item
    pub fn header(&self) -> &str {
        match self {
            ResponseData::Fetched { header, .. } => header,
            ResponseData::Line(line) => line,
        }
    }

    /// The message literal, if present
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            ResponseData::Fetched { body, .. } => body.as_deref(),
            ResponseData::Line(_) => None,
        }
    }
}

/// Status plus data items of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub data: Vec<ResponseData>,
}

impl Response {
    pub fn new(status: Status, data: Vec<ResponseData>) -> Self {
        Self { status, data }
    }

    /// Successful response carrying data
    pub fn ok(data: Vec<ResponseData>) -> Self {
        Self::new(Status::Ok, data)
    }

    /// Successful response without data
    pub fn done() -> Self {
        Self::ok(Vec::new())
    }
}
