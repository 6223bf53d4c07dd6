//! The ticket aggregate and its closed status/severity sets.

use super::id::{TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The seven lifecycle states.
///
/// `Reopened` is deliberately distinct from `New`: a closed ticket that the
/// creator reopens never returns to the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    Assigned,
    InProgress,
    PendingInfo,
    Resolved,
    Closed,
    Reopened,
}

impl Status {
    /// All states in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::New,
        Self::Assigned,
        Self::InProgress,
        Self::PendingInfo,
        Self::Resolved,
        Self::Closed,
        Self::Reopened,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::PendingInfo => "pending_info",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
        }
    }

    /// Closed is the only state that requires an explicit reopening action
    /// to re-enter the active set.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Caller-chosen severity. Set at creation; the engine never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Normal,
    Urgent,
    MissionCritical,
}

impl Severity {
    /// All severities in ascending order of attention.
    pub const ALL: [Self; 4] = [Self::Low, Self::Normal, Self::Urgent, Self::MissionCritical];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::Urgent => "urgent",
            Self::MissionCritical => "mission_critical",
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "pending_info" => Ok(Self::PendingInfo),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            "reopened" => Ok(Self::Reopened),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "urgent" => Ok(Self::Urgent),
            "mission_critical" => Ok(Self::MissionCritical),
            _ => Err(ParseEnumError {
                expected: "severity",
                got: s.to_string(),
            }),
        }
    }
}

/// Structural violation found on a ticket (empty required field, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: &'static str,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl std::error::Error for FieldViolation {}

/// The ticket record.
///
/// Only the workflow engine mutates these fields, always under the ticket's
/// store lock. `created_by`, `campus_id`, `category`, and `created_at` are
/// immutable after creation; `assigned_to` is set only by assignment,
/// `supervisor_id` only by escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub severity: Severity,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
    pub supervisor_id: Option<UserId>,
    pub campus_id: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub is_escalated: bool,
    pub confirmation_required: bool,
    pub confirmation_status: Option<bool>,
}

impl Ticket {
    /// Structural validation: required text fields must be non-empty after
    /// trimming. Business rules live in the engine, not here.
    pub fn validate(&self) -> Result<(), FieldViolation> {
        if self.title.trim().is_empty() {
            return Err(FieldViolation {
                field: "title",
                reason: "must not be empty",
            });
        }
        if self.description.trim().is_empty() {
            return Err(FieldViolation {
                field: "description",
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    /// The cross-field lifecycle invariant: `closed_at` is set iff the
    /// ticket is closed, and a closed ticket always carries a confirmation
    /// outcome.
    #[must_use]
    pub fn lifecycle_consistent(&self) -> bool {
        let closed = self.status.is_closed();
        if self.closed_at.is_some() != closed {
            return false;
        }
        if closed && self.confirmation_status.is_none() {
            return false;
        }
        self.updated_at >= self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldViolation, Severity, Status, Ticket};
    use crate::model::id::{TicketId, UserId};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn ticket() -> Ticket {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        Ticket {
            id: TicketId::new("t-1"),
            title: "Cannot access email".into(),
            description: "Server not found since this morning".into(),
            status: Status::New,
            severity: Severity::Normal,
            created_by: UserId::new("u1"),
            assigned_to: None,
            supervisor_id: None,
            campus_id: "campus-1".into(),
            category: "Email".into(),
            created_at: t0,
            updated_at: t0,
            closed_at: None,
            is_escalated: false,
            confirmation_required: true,
            confirmation_status: None,
        }
    }

    #[test]
    fn enum_json_roundtrips() {
        assert_eq!(serde_json::to_string(&Status::New).unwrap(), "\"new\"");
        assert_eq!(
            serde_json::to_string(&Status::PendingInfo).unwrap(),
            "\"pending_info\""
        );
        assert_eq!(
            serde_json::to_string(&Severity::MissionCritical).unwrap(),
            "\"mission_critical\""
        );

        assert_eq!(
            serde_json::from_str::<Status>("\"reopened\"").unwrap(),
            Status::Reopened
        );
        assert_eq!(
            serde_json::from_str::<Severity>("\"urgent\"").unwrap(),
            Severity::Urgent
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in Status::ALL {
            assert_eq!(Status::from_str(&value.to_string()).unwrap(), value);
        }
        for value in Severity::ALL {
            assert_eq!(Severity::from_str(&value.to_string()).unwrap(), value);
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(Status::from_str("open").is_err());
        assert!(Severity::from_str("critical").is_err());
    }

    #[test]
    fn validate_requires_title_and_description() {
        assert!(ticket().validate().is_ok());

        let mut blank_title = ticket();
        blank_title.title = "   ".into();
        assert_eq!(
            blank_title.validate(),
            Err(FieldViolation {
                field: "title",
                reason: "must not be empty",
            })
        );

        let mut blank_desc = ticket();
        blank_desc.description = String::new();
        assert!(blank_desc.validate().is_err());
    }

    #[test]
    fn lifecycle_consistency_links_closed_at_to_status() {
        let mut t = ticket();
        assert!(t.lifecycle_consistent());

        t.closed_at = Some(t.created_at);
        assert!(!t.lifecycle_consistent());

        t.status = Status::Closed;
        assert!(!t.lifecycle_consistent(), "closed without confirmation outcome");

        t.confirmation_status = Some(true);
        assert!(t.lifecycle_consistent());
    }
}
