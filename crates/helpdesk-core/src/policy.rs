//! Role policy: every role/identity check in the system lives here.
//!
//! The predicates are pure and total — defined for every action/role pair,
//! no storage access — so the guard table can be unit-tested on its own and
//! no caller ever re-implements a role check inline.

use crate::model::{Actor, Comment, Role, Ticket};
use std::fmt;

/// The closed set of guardable operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketAction {
    Create,
    Assign,
    Escalate,
    Resolve,
    Close,
    Reopen,
    Comment { internal: bool },
}

impl TicketAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Assign => "assign",
            Self::Escalate => "escalate",
            Self::Resolve => "resolve",
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Comment { .. } => "comment",
        }
    }
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The guard table.
///
/// | action            | permitted when                                             |
/// |-------------------|------------------------------------------------------------|
/// | create            | always (any authenticated actor)                           |
/// | assign, escalate  | role is itstaff or supervisor                              |
/// | resolve           | supervisor, or itstaff who is the assignee                 |
/// | close, reopen     | enduser who created the ticket                             |
/// | comment (public)  | always                                                     |
/// | comment (internal)| role is itstaff or supervisor                              |
///
/// State preconditions are *not* checked here; the engine reports those
/// separately as invalid transitions.
#[must_use]
pub fn can_perform(action: TicketAction, actor: &Actor, ticket: &Ticket) -> bool {
    match action {
        TicketAction::Create | TicketAction::Comment { internal: false } => true,
        TicketAction::Assign | TicketAction::Escalate | TicketAction::Comment { internal: true } => {
            matches!(actor.role, Role::ItStaff | Role::Supervisor)
        }
        TicketAction::Resolve => match actor.role {
            Role::Supervisor => true,
            Role::ItStaff => ticket.assigned_to.as_ref() == Some(&actor.id),
            Role::EndUser | Role::Manager => false,
        },
        TicketAction::Close | TicketAction::Reopen => {
            actor.role == Role::EndUser && ticket.created_by == actor.id
        }
    }
}

/// Ticket-list visibility, shared by every dashboard/list/detail surface:
/// end users see their own tickets, IT staff see their assignments plus the
/// unassigned pool, supervisors and managers see everything.
#[must_use]
pub fn can_view(actor: &Actor, ticket: &Ticket) -> bool {
    match actor.role {
        Role::EndUser => ticket.created_by == actor.id,
        Role::ItStaff => {
            ticket.assigned_to.is_none() || ticket.assigned_to.as_ref() == Some(&actor.id)
        }
        Role::Supervisor | Role::Manager => true,
    }
}

/// Whether a single comment is visible to the given role.
#[must_use]
pub fn comment_visible(role: Role, comment: &Comment) -> bool {
    !comment.is_internal || role.is_staff_tier()
}

/// Filter a comment thread down to what the given role may see.
#[must_use]
pub fn visible_comments(role: Role, comments: Vec<Comment>) -> Vec<Comment> {
    comments
        .into_iter()
        .filter(|c| comment_visible(role, c))
        .collect()
}
