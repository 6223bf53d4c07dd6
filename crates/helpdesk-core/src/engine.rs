//! The workflow engine: validated, audited ticket transitions.
//!
//! Every operation follows the same shape: find the ticket (or report
//! `NotFound`), check the role/identity guard (or report
//! `PermissionDenied`), check the state precondition (or report
//! `InvalidTransition`), then mutate the ticket and append exactly one
//! history row — all inside the ticket's store lock, stamped with a single
//! clock reading so `updated_at` and the history timestamp never skew.
//!
//! Nothing here no-ops silently: a refused operation is always a typed
//! error, and a refused operation writes no history.

use crate::clock::{Clock, SystemClock};
use crate::error::WorkflowError;
use crate::model::id::{CommentId, TicketId, UserId};
use crate::model::ticket::{Severity, Status, Ticket};
use crate::model::{Actor, Comment, HistoryAction, HistoryActor, HistoryRecord};
use crate::policy::{self, TicketAction};
use crate::store::{TicketRecord, TicketStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Input for ticket creation. The creator comes from the acting identity,
/// never from the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub campus_id: String,
    pub category: String,
}

/// Orchestrates the ticket lifecycle against a shared [`TicketStore`].
pub struct WorkflowEngine {
    store: Arc<TicketStore>,
    clock: Arc<dyn Clock>,
}

impl WorkflowEngine {
    #[must_use]
    pub fn new(store: Arc<TicketStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(store: Arc<TicketStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<TicketStore> {
        &self.store
    }

    /// Create a ticket in the `new` state. Open to any authenticated actor.
    pub fn create_ticket(
        &self,
        actor: &Actor,
        input: NewTicket,
    ) -> Result<TicketId, WorkflowError> {
        if input.title.trim().is_empty() {
            return Err(WorkflowError::Validation {
                field: "title",
                reason: "must not be empty",
            });
        }
        if input.description.trim().is_empty() {
            return Err(WorkflowError::Validation {
                field: "description",
                reason: "must not be empty",
            });
        }

        let id = self.store.allocate_ticket_id();
        let now = self.clock.now();
        let ticket = Ticket {
            id: id.clone(),
            title: input.title,
            description: input.description,
            status: Status::New,
            severity: input.severity,
            created_by: actor.id.clone(),
            assigned_to: None,
            supervisor_id: None,
            campus_id: input.campus_id,
            category: input.category,
            created_at: now,
            updated_at: now,
            closed_at: None,
            is_escalated: false,
            confirmation_required: true,
            confirmation_status: None,
        };
        let created = HistoryRecord {
            id: self.store.allocate_history_id(),
            ticket_id: id.clone(),
            actor: HistoryActor::User(actor.id.clone()),
            action: HistoryAction::Created,
            timestamp: now,
        };
        self.store.insert(TicketRecord {
            ticket,
            history: vec![created],
            comments: Vec::new(),
        })?;

        info!(ticket = %id, actor = %actor.id, "ticket created");
        Ok(id)
    }

    /// Assign the ticket to a staff member. Staff-tier guard; any
    /// non-closed state.
    pub fn assign_ticket(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        assignee: UserId,
    ) -> Result<(), WorkflowError> {
        self.store.mutate(ticket_id, |rec| {
            guard(TicketAction::Assign, actor, &rec.ticket)?;
            if rec.ticket.status.is_closed() {
                return Err(invalid(&rec.ticket, TicketAction::Assign, "ticket is closed"));
            }

            let now = self.stamp(&rec.ticket);
            let from = rec.ticket.status;
            rec.ticket.assigned_to = Some(assignee.clone());
            rec.ticket.status = Status::Assigned;
            rec.ticket.updated_at = now;
            self.append(rec, actor, HistoryAction::Assigned { assignee: assignee.clone(), from }, now);

            info!(ticket = %rec.ticket.id, actor = %actor.id, assignee = %assignee, "ticket assigned");
            Ok(())
        })
    }

    /// Escalate: attach a supervisor and flip the one-way escalation flag.
    /// Status is unchanged. Re-escalation is refused, not ignored.
    pub fn escalate_ticket(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        supervisor: UserId,
    ) -> Result<(), WorkflowError> {
        self.store.mutate(ticket_id, |rec| {
            guard(TicketAction::Escalate, actor, &rec.ticket)?;
            if rec.ticket.status.is_closed() {
                return Err(invalid(&rec.ticket, TicketAction::Escalate, "ticket is closed"));
            }
            if rec.ticket.is_escalated {
                return Err(invalid(&rec.ticket, TicketAction::Escalate, "already escalated"));
            }

            let now = self.stamp(&rec.ticket);
            rec.ticket.supervisor_id = Some(supervisor.clone());
            rec.ticket.is_escalated = true;
            rec.ticket.updated_at = now;
            self.append(rec, actor, HistoryAction::Escalated { supervisor: supervisor.clone() }, now);

            info!(ticket = %rec.ticket.id, actor = %actor.id, supervisor = %supervisor, "ticket escalated");
            Ok(())
        })
    }

    /// Mark an assigned ticket resolved. Assignee or supervisor only.
    pub fn resolve_ticket(&self, ticket_id: &TicketId, actor: &Actor) -> Result<(), WorkflowError> {
        self.store.mutate(ticket_id, |rec| {
            guard(TicketAction::Resolve, actor, &rec.ticket)?;
            match rec.ticket.status {
                Status::Resolved => {
                    return Err(invalid(&rec.ticket, TicketAction::Resolve, "already resolved"));
                }
                Status::Closed => {
                    return Err(invalid(&rec.ticket, TicketAction::Resolve, "ticket is closed"));
                }
                _ => {}
            }
            if rec.ticket.assigned_to.is_none() {
                return Err(invalid(&rec.ticket, TicketAction::Resolve, "ticket has no assignee"));
            }

            let now = self.stamp(&rec.ticket);
            let from = rec.ticket.status;
            rec.ticket.status = Status::Resolved;
            rec.ticket.updated_at = now;
            self.append(rec, actor, HistoryAction::StatusChange { from, to: Status::Resolved }, now);

            info!(ticket = %rec.ticket.id, actor = %actor.id, "ticket resolved");
            Ok(())
        })
    }

    /// Close a resolved ticket, recording whether the creator confirmed the
    /// fix. Creator-enduser only.
    pub fn close_ticket(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        confirmed: bool,
    ) -> Result<(), WorkflowError> {
        self.store.mutate(ticket_id, |rec| {
            guard(TicketAction::Close, actor, &rec.ticket)?;
            if rec.ticket.status != Status::Resolved {
                return Err(invalid(&rec.ticket, TicketAction::Close, "only resolved tickets close"));
            }

            let now = self.stamp(&rec.ticket);
            let from = rec.ticket.status;
            rec.ticket.status = Status::Closed;
            rec.ticket.closed_at = Some(now);
            rec.ticket.confirmation_status = Some(confirmed);
            rec.ticket.updated_at = now;
            self.append(rec, actor, HistoryAction::Closed { from, confirmed }, now);

            info!(ticket = %rec.ticket.id, actor = %actor.id, confirmed, "ticket closed");
            Ok(())
        })
    }

    /// Reopen a closed ticket. Creator-enduser only. The ticket re-enters
    /// the active set as `reopened`, never `new`.
    pub fn reopen_ticket(&self, ticket_id: &TicketId, actor: &Actor) -> Result<(), WorkflowError> {
        self.store.mutate(ticket_id, |rec| {
            guard(TicketAction::Reopen, actor, &rec.ticket)?;
            if !rec.ticket.status.is_closed() {
                return Err(invalid(&rec.ticket, TicketAction::Reopen, "ticket is not closed"));
            }

            let now = self.stamp(&rec.ticket);
            let from = rec.ticket.status;
            rec.ticket.status = Status::Reopened;
            rec.ticket.closed_at = None;
            rec.ticket.confirmation_status = None;
            rec.ticket.updated_at = now;
            self.append(rec, actor, HistoryAction::Reopened { from }, now);

            info!(ticket = %rec.ticket.id, actor = %actor.id, "ticket reopened");
            Ok(())
        })
    }

    /// Append a comment. Internal comments are staff-authored only. Bumps
    /// `updated_at` but deliberately writes no history row — comments are
    /// tracked in the comment store alone.
    pub fn add_comment(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
        content: &str,
        is_internal: bool,
        attachments: Vec<String>,
    ) -> Result<CommentId, WorkflowError> {
        self.store.mutate(ticket_id, |rec| {
            guard(TicketAction::Comment { internal: is_internal }, actor, &rec.ticket)?;
            if content.trim().is_empty() {
                return Err(WorkflowError::Validation {
                    field: "content",
                    reason: "must not be empty",
                });
            }

            let now = self.stamp(&rec.ticket);
            let id = self.store.allocate_comment_id();
            rec.ticket.updated_at = now;
            rec.comments.push(Comment {
                id: id.clone(),
                ticket_id: rec.ticket.id.clone(),
                user_id: actor.id.clone(),
                content: content.to_string(),
                created_at: now,
                is_internal,
                attachments,
            });

            debug!(ticket = %rec.ticket.id, actor = %actor.id, internal = is_internal, "comment added");
            Ok(id)
        })
    }

    /// Tickets the actor may see, per the shared visibility rule.
    #[must_use]
    pub fn list_tickets_visible_to(&self, actor: &Actor) -> Vec<Ticket> {
        self.store
            .list()
            .into_iter()
            .filter(|t| policy::can_view(actor, t))
            .collect()
    }

    pub fn ticket(&self, ticket_id: &TicketId) -> Result<Ticket, WorkflowError> {
        self.store
            .get(ticket_id)
            .ok_or_else(|| WorkflowError::NotFound(ticket_id.clone()))
    }

    /// Full audit trail for a ticket, oldest first.
    pub fn history(&self, ticket_id: &TicketId) -> Result<Vec<HistoryRecord>, WorkflowError> {
        self.store
            .history_for(ticket_id)
            .ok_or_else(|| WorkflowError::NotFound(ticket_id.clone()))
    }

    /// Comment thread for a ticket, pre-filtered for the actor's role.
    pub fn comments(
        &self,
        ticket_id: &TicketId,
        actor: &Actor,
    ) -> Result<Vec<Comment>, WorkflowError> {
        let thread = self
            .store
            .comments_for(ticket_id)
            .ok_or_else(|| WorkflowError::NotFound(ticket_id.clone()))?;
        Ok(policy::visible_comments(actor.role, thread))
    }

    /// One clock reading per mutation, clamped so `updated_at` never moves
    /// backwards even if the wall clock does.
    fn stamp(&self, ticket: &Ticket) -> DateTime<Utc> {
        self.clock.now().max(ticket.updated_at)
    }

    fn append(
        &self,
        rec: &mut TicketRecord,
        actor: &Actor,
        action: HistoryAction,
        timestamp: DateTime<Utc>,
    ) {
        rec.history.push(HistoryRecord {
            id: self.store.allocate_history_id(),
            ticket_id: rec.ticket.id.clone(),
            actor: HistoryActor::User(actor.id.clone()),
            action,
            timestamp,
        });
    }
}

fn guard(action: TicketAction, actor: &Actor, ticket: &Ticket) -> Result<(), WorkflowError> {
    if policy::can_perform(action, actor, ticket) {
        Ok(())
    } else {
        debug!(ticket = %ticket.id, actor = %actor.id, role = %actor.role, %action, "guard refused");
        Err(WorkflowError::PermissionDenied {
            ticket: ticket.id.clone(),
            actor: actor.id.clone(),
            role: actor.role,
            action,
        })
    }
}

fn invalid(ticket: &Ticket, action: TicketAction, reason: &'static str) -> WorkflowError {
    WorkflowError::InvalidTransition {
        ticket: ticket.id.clone(),
        status: ticket.status,
        action,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTicket, WorkflowEngine};
    use crate::clock::SteppingClock;
    use crate::error::{ErrorCode, WorkflowError};
    use crate::model::id::UserId;
    use crate::model::role::{Actor, Role};
    use crate::model::ticket::Severity;
    use crate::store::TicketStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn engine() -> WorkflowEngine {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        WorkflowEngine::with_clock(
            Arc::new(TicketStore::new()),
            Arc::new(SteppingClock::new(base, 1_000)),
        )
    }

    fn input() -> NewTicket {
        NewTicket {
            title: "Cannot access email".into(),
            description: "Server not found since this morning".into(),
            severity: Severity::Normal,
            campus_id: "campus-1".into(),
            category: "Email".into(),
        }
    }

    #[test]
    fn create_rejects_blank_title_and_stores_nothing() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let err = engine
            .create_ticket(&creator, NewTicket { title: "  ".into(), ..input() })
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn create_stamps_ticket_and_created_row_identically() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let id = engine.create_ticket(&creator, input()).unwrap();

        let ticket = engine.ticket(&id).unwrap();
        let history = engine.history(&id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, ticket.created_at);
        assert_eq!(ticket.updated_at, ticket.created_at);
        assert!(ticket.confirmation_required);
    }

    #[test]
    fn every_mutation_shares_its_timestamp_with_the_history_row() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let staff = Actor::new("s1", Role::ItStaff);
        let id = engine.create_ticket(&creator, input()).unwrap();

        engine.assign_ticket(&id, &staff, UserId::new("s1")).unwrap();

        let ticket = engine.ticket(&id).unwrap();
        let history = engine.history(&id).unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.timestamp, ticket.updated_at);
        assert!(ticket.updated_at > ticket.created_at);
    }

    #[test]
    fn failed_operations_write_no_history() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let id = engine.create_ticket(&creator, input()).unwrap();
        let before = engine.history(&id).unwrap().len();

        // Enduser may not assign.
        let err = engine
            .assign_ticket(&id, &creator, UserId::new("s1"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PermissionDenied);
        assert_eq!(engine.history(&id).unwrap().len(), before);
    }

    #[test]
    fn comment_bumps_updated_at_without_history() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let id = engine.create_ticket(&creator, input()).unwrap();
        let created_at = engine.ticket(&id).unwrap().created_at;

        let comment_id = engine
            .add_comment(&id, &creator, "any update on this?", false, Vec::new())
            .unwrap();

        let ticket = engine.ticket(&id).unwrap();
        assert!(ticket.updated_at > created_at);
        assert_eq!(engine.history(&id).unwrap().len(), 1, "CREATED row only");
        let thread = engine.comments(&id, &creator).unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, comment_id);
        assert_eq!(thread[0].created_at, ticket.updated_at);
    }

    #[test]
    fn blank_comment_is_rejected_and_not_stored() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let id = engine.create_ticket(&creator, input()).unwrap();

        let err = engine
            .add_comment(&id, &creator, "   ", false, Vec::new())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation { field: "content", .. }));
        assert!(engine.comments(&id, &creator).unwrap().is_empty());
    }

    #[test]
    fn operations_on_unknown_tickets_are_not_found() {
        let engine = engine();
        let staff = Actor::new("s1", Role::ItStaff);
        let missing = crate::model::id::TicketId::new("t-404");

        assert_eq!(
            engine.resolve_ticket(&missing, &staff).unwrap_err().code(),
            ErrorCode::TicketNotFound
        );
        assert_eq!(engine.history(&missing).unwrap_err().code(), ErrorCode::TicketNotFound);
    }

    #[test]
    fn resolve_requires_an_assignee_even_for_supervisors() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let supervisor = Actor::new("sup1", Role::Supervisor);
        let id = engine.create_ticket(&creator, input()).unwrap();

        let err = engine.resolve_ticket(&id, &supervisor).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
    }

    #[test]
    fn assign_on_closed_ticket_is_an_invalid_transition() {
        let engine = engine();
        let creator = Actor::new("u1", Role::EndUser);
        let staff = Actor::new("s1", Role::ItStaff);
        let id = engine.create_ticket(&creator, input()).unwrap();
        engine.assign_ticket(&id, &staff, UserId::new("s1")).unwrap();
        engine.resolve_ticket(&id, &staff).unwrap();
        engine.close_ticket(&id, &creator, true).unwrap();

        let err = engine
            .assign_ticket(&id, &staff, UserId::new("s2"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidTransition);
    }
}
