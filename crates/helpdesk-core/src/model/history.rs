//! Append-only audit history for ticket mutations.
//!
//! Each successful engine operation appends exactly one [`HistoryRecord`].
//! The action is a closed tagged-variant enum with a typed payload per
//! action; the loosely-typed `previousValue`/`newValue` strings of the wire
//! format are *derived* from the payload, not stored.

use super::id::{TicketId, UserId};
use super::ticket::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of audit actions, with the data each one carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryAction {
    /// Ticket entered the lifecycle in `new`.
    Created,
    /// Assignee set; `from` is the status before the transition to `assigned`.
    Assigned { assignee: UserId, from: Status },
    /// One-way escalation flag flipped; supervisor attached. Status unchanged.
    Escalated { supervisor: UserId },
    /// A plain status transition (currently: resolve).
    StatusChange { from: Status, to: Status },
    /// Creator closed the ticket, recording the confirmation outcome.
    Closed { from: Status, confirmed: bool },
    /// Creator reopened a closed ticket.
    Reopened { from: Status },
    /// Reserved for automated field maintenance; no engine operation emits
    /// this today.
    Updated,
}

impl HistoryAction {
    /// The stable wire tag for this action.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Assigned { .. } => "ASSIGNED",
            Self::Escalated { .. } => "ESCALATED",
            Self::StatusChange { .. } => "STATUS_CHANGE",
            Self::Closed { .. } => "CLOSED",
            Self::Reopened { .. } => "REOPENED",
            Self::Updated => "UPDATED",
        }
    }

    /// String-encoded value before the mutation, where one applies.
    #[must_use]
    pub fn previous_value(&self) -> Option<String> {
        match self {
            Self::Created | Self::Updated => None,
            Self::Assigned { from, .. }
            | Self::StatusChange { from, .. }
            | Self::Closed { from, .. }
            | Self::Reopened { from } => Some(from.as_str().to_string()),
            Self::Escalated { .. } => Some("false".to_string()),
        }
    }

    /// String-encoded value after the mutation, where one applies.
    ///
    /// For status-affecting actions this is the ticket's post-mutation
    /// status; for escalation it is the flipped flag.
    #[must_use]
    pub fn new_value(&self) -> Option<String> {
        match self {
            Self::Created | Self::Updated => None,
            Self::Assigned { .. } => Some(Status::Assigned.as_str().to_string()),
            Self::StatusChange { to, .. } => Some(to.as_str().to_string()),
            Self::Closed { .. } => Some(Status::Closed.as_str().to_string()),
            Self::Reopened { .. } => Some(Status::Reopened.as_str().to_string()),
            Self::Escalated { .. } => Some("true".to_string()),
        }
    }
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Who performed a mutation: a real user, or the `system` sentinel for
/// automated mutations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HistoryActor {
    User(UserId),
    System,
}

impl HistoryActor {
    const SYSTEM: &'static str = "system";

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User(id) => id.as_str(),
            Self::System => Self::SYSTEM,
        }
    }
}

impl fmt::Display for HistoryActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryActor {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::SYSTEM {
            Ok(Self::System)
        } else {
            Ok(Self::User(UserId::new(s)))
        }
    }
}

// Serde: a plain string, with "system" reserved for the sentinel.
impl Serialize for HistoryActor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HistoryActor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(if s == Self::SYSTEM {
            Self::System
        } else {
            Self::User(UserId::new(s))
        })
    }
}

/// One row of the append-only ledger. Never edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub ticket_id: TicketId,
    pub actor: HistoryActor,
    #[serde(flatten)]
    pub action: HistoryAction,
    pub timestamp: DateTime<Utc>,
}
