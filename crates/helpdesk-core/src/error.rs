//! Typed error taxonomy for the workflow engine.
//!
//! Every expected business outcome is a [`WorkflowError`] variant returned
//! to the caller; nothing here is retried internally or raised as a panic.

use crate::model::id::{TicketId, UserId};
use crate::model::role::Role;
use crate::model::ticket::Status;
use crate::policy::TicketAction;
use std::fmt;
use thiserror::Error;

/// Machine-readable error codes for UI and agent-friendly branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TicketNotFound,
    InvalidTransition,
    PermissionDenied,
    ValidationFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TicketNotFound => "E2001",
            Self::InvalidTransition => "E2002",
            Self::PermissionDenied => "E2003",
            Self::ValidationFailed => "E2004",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TicketNotFound => "Ticket not found",
            Self::InvalidTransition => "Invalid lifecycle transition",
            Self::PermissionDenied => "Permission denied",
            Self::ValidationFailed => "Input validation failed",
        }
    }

    /// Optional remediation hint surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::TicketNotFound => None,
            Self::InvalidTransition => {
                Some("Check the ticket's current status; the lifecycle is new -> assigned -> resolved -> closed -> reopened.")
            }
            Self::PermissionDenied => {
                Some("The operation is gated by role and ticket relationship; do not retry as the same actor.")
            }
            Self::ValidationFailed => Some("Fix the rejected field and resubmit."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The four terminal outcomes a workflow call can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("ticket not found: {0}")]
    NotFound(TicketId),

    #[error("permission denied: {role} {actor} may not {action} ticket {ticket}")]
    PermissionDenied {
        ticket: TicketId,
        actor: UserId,
        role: Role,
        action: TicketAction,
    },

    #[error("invalid transition: cannot {action} ticket {ticket} in status {status}: {reason}")]
    InvalidTransition {
        ticket: TicketId,
        status: Status,
        action: TicketAction,
        reason: &'static str,
    },

    #[error("validation failed: {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },
}

impl WorkflowError {
    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::TicketNotFound,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
        }
    }
}
