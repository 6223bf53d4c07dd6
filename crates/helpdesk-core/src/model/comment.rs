//! Ticket-scoped discussion comments.

use super::id::{CommentId, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single comment. Immutable once created; there is no edit or delete.
///
/// `is_internal` comments are staff-tier only: the policy layer strips them
/// from any view assembled for an end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_internal: bool,
    /// Opaque attachment references (storage is someone else's problem).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}
