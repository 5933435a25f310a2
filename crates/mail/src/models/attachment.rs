//! Attachment model

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file part extracted from a message body
///
/// Only parts that declare both a content disposition and a filename
/// become attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Decoded filename
    pub name: String,
    /// Transfer-decoded bytes; `None` for embedded messages
    pub payload: Option<Vec<u8>>,
    /// Payload size in kilobytes (1000 bytes), rounded
    pub size: Option<u64>,
}

impl Attachment {
    /// Attachment with file content
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        let size = Some(kilobytes(payload.len()));
        Self {
            name: name.into(),
            payload: Some(payload),
            size,
        }
    }

    /// Attachment for a structured part (an attached message) with no byte payload
    pub fn without_payload(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
            size: None,
        }
    }

    /// Write the payload to disk.
    ///
    /// With no path the attachment name is used; if `path` is a directory
    /// the file is written inside it under the attachment name.
    /// Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let Some(payload) = &self.payload else {
            bail!("Attachment {} has no payload to save", self.name);
        };

        let target = match path {
            None => PathBuf::from(&self.name),
            Some(dir) if dir.is_dir() => dir.join(&self.name),
            Some(file) => file.to_path_buf(),
        };

        std::fs::write(&target, payload)
            .with_context(|| format!("Failed to write attachment: {}", target.display()))?;
        Ok(target)
    }
}

fn kilobytes(len: usize) -> u64 {
    (len as f64 / 1000.0).round() as u64
}
