//! helpdesk-core: the ticket workflow engine.
//!
//! Everything here is in-memory and synchronous. The [`engine::WorkflowEngine`]
//! orchestrates the pieces: it loads a ticket from the [`store::TicketStore`],
//! asks [`policy`] whether the acting user may perform the requested action,
//! applies the state transition, and appends an audit row to the ticket's
//! history ledger. Mutation and audit append happen under a single per-ticket
//! lock, so they are atomic with respect to other writers.
//!
//! # Conventions
//!
//! - **Errors**: business outcomes are typed ([`error::WorkflowError`]) and
//!   returned, never panicked. Each variant maps to a stable
//!   [`error::ErrorCode`].
//! - **Logging**: `tracing` macros (`info!` on transitions, `debug!` on
//!   refusals). Subscriber setup belongs to the binary, not this crate.

#![forbid(unsafe_code)]

pub mod clock;
pub mod engine;
pub mod error;
pub mod model;
pub mod policy;
pub mod store;

pub use engine::{NewTicket, WorkflowEngine};
pub use error::{ErrorCode, WorkflowError};
