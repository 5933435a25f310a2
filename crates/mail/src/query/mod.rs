//! Query API
//!
//! Reconstructs conversations from the mailbox layer.

mod threads;

pub use threads::merge_chronological;
