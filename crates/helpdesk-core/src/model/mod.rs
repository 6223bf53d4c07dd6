//! Data model: tickets, roles, audit history, and comments.

pub mod comment;
pub mod history;
pub mod id;
pub mod role;
pub mod ticket;

pub use comment::Comment;
pub use history::{HistoryAction, HistoryActor, HistoryRecord};
pub use id::{CommentId, TicketId, UserId};
pub use role::{Actor, Role};
pub use ticket::{Severity, Status, Ticket};
