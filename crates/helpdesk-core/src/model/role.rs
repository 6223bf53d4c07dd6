//! Portal roles and the acting identity.

use super::id::UserId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The four portal roles.
///
/// `ItStaff` and `Supervisor` drive tickets through the lifecycle;
/// `EndUser` owns creation, closure, and reopening of their own tickets;
/// `Manager` is read-everything with no transition powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    EndUser,
    ItStaff,
    Supervisor,
    Manager,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Self; 4] = [Self::EndUser, Self::ItStaff, Self::Supervisor, Self::Manager];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EndUser => "enduser",
            Self::ItStaff => "itstaff",
            Self::Supervisor => "supervisor",
            Self::Manager => "manager",
        }
    }

    /// Staff-tier roles may read internal comments.
    #[must_use]
    pub const fn is_staff_tier(self) -> bool {
        matches!(self, Self::ItStaff | Self::Supervisor | Self::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole {
    pub raw: String,
}

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown role '{}': expected one of enduser, itstaff, supervisor, manager",
            self.raw
        )
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enduser" => Ok(Self::EndUser),
            "itstaff" => Ok(Self::ItStaff),
            "supervisor" => Ok(Self::Supervisor),
            "manager" => Ok(Self::Manager),
            _ => Err(UnknownRole { raw: s.to_string() }),
        }
    }
}

/// The acting identity: a user id plus the role the identity provider
/// attached to it. The engine trusts this pair; authentication is not
/// this crate's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(id),
            role,
        }
    }
}
