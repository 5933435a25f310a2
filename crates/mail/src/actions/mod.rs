//! Message actions module
//!
//! Flag and label mutations plus the delete/move/archive operations built
//! on them. Each action issues its commands first and then updates the
//! message's cached state.

mod mutations;

use serde::{Deserialize, Serialize};

use crate::imap::Status;

/// Whether the server acknowledged a mutation
///
/// The local cache is updated either way; `Unconfirmed` means the command
/// went out but the server did not answer OK, so the cache may disagree
/// with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ack {
    Confirmed,
    Unconfirmed,
}

impl Ack {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Ack::Confirmed)
    }

    /// Combine the acknowledgements of two commands of one operation
    pub fn and(self, other: Ack) -> Ack {
        if self.is_confirmed() && other.is_confirmed() {
            Ack::Confirmed
        } else {
            Ack::Unconfirmed
        }
    }
}

impl From<Status> for Ack {
    fn from(status: Status) -> Self {
        if status.is_ok() {
            Ack::Confirmed
        } else {
            Ack::Unconfirmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert_eq!(Ack::from(Status::Ok), Ack::Confirmed);
        assert_eq!(Ack::from(Status::No), Ack::Unconfirmed);
        assert_eq!(Ack::from(Status::Bad), Ack::Unconfirmed);
    }

    #[test]
    fn test_and() {
        assert!(Ack::Confirmed.and(Ack::Confirmed).is_confirmed());
        assert!(!Ack::Confirmed.and(Ack::Unconfirmed).is_confirmed());
        assert!(!Ack::Unconfirmed.and(Ack::Confirmed).is_confirmed());
    }
}
