//! Opaque identifier newtypes.
//!
//! Ids are plain strings on the wire (`#[serde(transparent)]`). Ticket and
//! comment ids are assigned by the store from a monotonic sequence; user ids
//! come from the identity provider and are never minted here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique ticket identifier, immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub(crate) fn from_seq(seq: u64) -> Self {
        Self(format!("t-{seq}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier for a portal user (creator, assignee, or supervisor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique comment identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub(crate) fn from_seq(seq: u64) -> Self {
        Self(format!("c-{seq}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{CommentId, TicketId, UserId};

    #[test]
    fn sequence_ids_are_prefixed() {
        assert_eq!(TicketId::from_seq(7).as_str(), "t-7");
        assert_eq!(CommentId::from_seq(12).as_str(), "c-12");
    }

    #[test]
    fn serde_is_transparent() {
        let id = TicketId::new("t-3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"t-3\"");
        let back: TicketId = serde_json::from_str("\"t-3\"").unwrap();
        assert_eq!(back, id);

        let user = UserId::new("alice");
        assert_eq!(serde_json::to_string(&user).unwrap(), "\"alice\"");
    }
}
