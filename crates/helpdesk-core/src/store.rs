//! In-memory ticket store with per-ticket locking.
//!
//! Each ticket lives in its own record cell together with its history
//! ledger and comment thread, behind its own mutex. The outer map is only
//! locked long enough to find (or insert) a cell, so writers on different
//! tickets never contend while a single ticket's read-modify-append
//! sequence stays serialized.
//!
//! The store enforces structural invariants only (non-empty required
//! fields, store-assigned ids); business rules are the engine's job.

use crate::error::WorkflowError;
use crate::model::id::{CommentId, TicketId, UserId};
use crate::model::ticket::Status;
use crate::model::{Comment, HistoryRecord, Ticket};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One ticket plus everything keyed to it for life: the append-only audit
/// ledger and the comment thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket: Ticket,
    pub history: Vec<HistoryRecord>,
    pub comments: Vec<Comment>,
}

/// Serializable dump of the whole store, used by presentation shells to
/// carry state between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub records: Vec<TicketRecord>,
    pub next_ticket: u64,
    pub next_comment: u64,
    pub next_history: u64,
}

type RecordCell = Arc<Mutex<TicketRecord>>;

/// Owner of all ticket state. Create once at process start, share via
/// [`Arc`].
#[derive(Debug, Default)]
pub struct TicketStore {
    records: RwLock<HashMap<TicketId, RecordCell>>,
    next_ticket: AtomicU64,
    next_comment: AtomicU64,
    next_history: AtomicU64,
}

impl TicketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot, restoring id counters.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let records = snapshot
            .records
            .into_iter()
            .map(|r| (r.ticket.id.clone(), Arc::new(Mutex::new(r))))
            .collect();
        Self {
            records: RwLock::new(records),
            next_ticket: AtomicU64::new(snapshot.next_ticket),
            next_comment: AtomicU64::new(snapshot.next_comment),
            next_history: AtomicU64::new(snapshot.next_history),
        }
    }

    /// Dump the full store. Takes each ticket's lock in turn; records are
    /// sorted by creation time for stable output.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut records: Vec<TicketRecord> = self
            .map_read()
            .values()
            .map(|cell| lock_record(cell).clone())
            .collect();
        records.sort_by(|a, b| {
            (a.ticket.created_at, &a.ticket.id).cmp(&(b.ticket.created_at, &b.ticket.id))
        });
        Snapshot {
            records,
            next_ticket: self.next_ticket.load(Ordering::Relaxed),
            next_comment: self.next_comment.load(Ordering::Relaxed),
            next_history: self.next_history.load(Ordering::Relaxed),
        }
    }

    /// Mint the next ticket id.
    pub fn allocate_ticket_id(&self) -> TicketId {
        TicketId::from_seq(self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Mint the next comment id.
    pub fn allocate_comment_id(&self) -> CommentId {
        CommentId::from_seq(self.next_comment.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Mint the next history row id.
    pub fn allocate_history_id(&self) -> u64 {
        self.next_history.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Insert a freshly created record after structural validation.
    pub fn insert(&self, record: TicketRecord) -> Result<(), WorkflowError> {
        record
            .ticket
            .validate()
            .map_err(|violation| WorkflowError::Validation {
                field: violation.field,
                reason: violation.reason,
            })?;

        let id = record.ticket.id.clone();
        let mut map = self.map_write();
        if map.contains_key(&id) {
            // Ids are store-assigned, so this only fires on a corrupt snapshot.
            return Err(WorkflowError::Validation {
                field: "id",
                reason: "duplicate ticket id",
            });
        }
        map.insert(id, Arc::new(Mutex::new(record)));
        Ok(())
    }

    /// Run a mutation against one ticket record under its lock.
    ///
    /// The closure sees the record exclusively; guard checks, field
    /// mutation, and the history append all happen inside it, which is what
    /// makes each operation atomic per ticket.
    pub fn mutate<T>(
        &self,
        id: &TicketId,
        f: impl FnOnce(&mut TicketRecord) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let cell = self
            .map_read()
            .get(id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))?;
        let mut record = lock_record(&cell);
        f(&mut record)
    }

    /// Run a read-only closure against one ticket record.
    pub fn with_record<T>(&self, id: &TicketId, f: impl FnOnce(&TicketRecord) -> T) -> Option<T> {
        let cell = self.map_read().get(id).cloned()?;
        let record = lock_record(&cell);
        Some(f(&record))
    }

    #[must_use]
    pub fn get(&self, id: &TicketId) -> Option<Ticket> {
        self.with_record(id, |r| r.ticket.clone())
    }

    /// All tickets, sorted by creation time (ties broken by id).
    #[must_use]
    pub fn list(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .map_read()
            .values()
            .map(|cell| lock_record(cell).ticket.clone())
            .collect();
        tickets.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        tickets
    }

    /// Tickets the given user appears on as creator, assignee, or
    /// supervisor.
    #[must_use]
    pub fn tickets_for_user(&self, user: &UserId) -> Vec<Ticket> {
        self.list()
            .into_iter()
            .filter(|t| {
                t.created_by == *user
                    || t.assigned_to.as_ref() == Some(user)
                    || t.supervisor_id.as_ref() == Some(user)
            })
            .collect()
    }

    #[must_use]
    pub fn tickets_for_campus(&self, campus_id: &str) -> Vec<Ticket> {
        self.list()
            .into_iter()
            .filter(|t| t.campus_id == campus_id)
            .collect()
    }

    #[must_use]
    pub fn tickets_with_status(&self, status: Status) -> Vec<Ticket> {
        self.list()
            .into_iter()
            .filter(|t| t.status == status)
            .collect()
    }

    /// The ticket's audit ledger in insertion order, or `None` for an
    /// unknown id.
    #[must_use]
    pub fn history_for(&self, id: &TicketId) -> Option<Vec<HistoryRecord>> {
        self.with_record(id, |r| r.history.clone())
    }

    /// The ticket's full (unfiltered) comment thread in insertion order.
    #[must_use]
    pub fn comments_for(&self, id: &TicketId) -> Option<Vec<Comment>> {
        self.with_record(id, |r| r.comments.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map_read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map_read().is_empty()
    }

    fn map_read(&self) -> RwLockReadGuard<'_, HashMap<TicketId, RecordCell>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn map_write(&self) -> RwLockWriteGuard<'_, HashMap<TicketId, RecordCell>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// A panicked writer leaves the record as-is; poisoning carries no extra
// meaning for us, so recover the guard.
fn lock_record(cell: &Mutex<TicketRecord>) -> MutexGuard<'_, TicketRecord> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}
