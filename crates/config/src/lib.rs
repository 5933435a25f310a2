//! Settings files for gmail-imap
//!
//! Account-specific overrides live as JSON documents in one directory,
//! `<platform config dir>/gmail-imap/` (`~/.config/gmail-imap/` on Linux).
//! The mail crate keeps its special-mailbox names there in
//! `mailboxes.json`; anything serde can read or write fits.
//!
//! Reads never create the directory; writes create it on demand.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config directory
const APP_DIR: &str = "gmail-imap";

/// The settings directory, if the platform has a config directory at all
pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_DIR))
}

/// Full path of a settings file
pub fn config_path(filename: &str) -> Option<PathBuf> {
    Some(config_dir()?.join(filename))
}

/// Whether a settings file is present
pub fn config_exists(filename: &str) -> bool {
    config_path(filename).is_some_and(|path| path.is_file())
}

/// Read a JSON document from any path; errors name the file
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

/// Write a settings file by name, creating the directory if needed
pub fn save_json<T: Serialize>(filename: &str, value: &T) -> Result<()> {
    let path = ensure_config_dir()?.join(filename);
    save_json_file(&path, value)
}

/// Write a value as pretty JSON to any path
pub fn save_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(value)?;
    json.push(b'\n');
    fs::write(path, json).with_context(|| format!("Failed to write config file: {}", path.display()))
}
