//! Mutating commands: create, assign, escalate, resolve, close, reopen,
//! and comment.

use crate::output::{OutputMode, Renderable, pretty_kv, render_item};
use clap::Args;
use helpdesk_core::engine::{NewTicket, WorkflowEngine};
use helpdesk_core::model::id::{TicketId, UserId};
use helpdesk_core::model::ticket::{Severity, Status};
use helpdesk_core::model::Actor;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short summary of the problem.
    #[arg(long)]
    pub title: String,

    /// Full description of the problem.
    #[arg(long)]
    pub description: String,

    /// Severity: low, normal, urgent, or mission_critical.
    #[arg(long, default_value = "normal", value_parser = super::parse_severity)]
    pub severity: Severity,

    /// Campus the request originates from.
    #[arg(long = "campus", default_value = "main")]
    pub campus_id: String,

    /// Request category.
    #[arg(long, default_value = "General")]
    pub category: String,
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Ticket id.
    pub ticket: String,

    /// Staff member to assign the ticket to.
    pub assignee: String,
}

#[derive(Args, Debug)]
pub struct EscalateArgs {
    /// Ticket id.
    pub ticket: String,

    /// Supervisor to attach to the ticket.
    pub supervisor: String,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Ticket id.
    pub ticket: String,
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Ticket id.
    pub ticket: String,

    /// Record that the resolution did not actually fix the issue.
    #[arg(long)]
    pub unconfirmed: bool,
}

#[derive(Args, Debug)]
pub struct ReopenArgs {
    /// Ticket id.
    pub ticket: String,
}

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Ticket id.
    pub ticket: String,

    /// Comment body.
    pub content: String,

    /// Staff-only note, hidden from the end user.
    #[arg(long)]
    pub internal: bool,

    /// Attachment reference (repeatable).
    #[arg(long = "attach")]
    pub attachments: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TransitionOutput {
    ok: bool,
    ticket_id: String,
    status: Status,
}

impl Renderable for TransitionOutput {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_kv(w, "ticket", &self.ticket_id)?;
        pretty_kv(w, "status", self.status.as_str())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.ticket_id, self.status)
    }
}

#[derive(Debug, Serialize)]
struct CommentOutput {
    ok: bool,
    ticket_id: String,
    comment_id: String,
    internal: bool,
}

impl Renderable for CommentOutput {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_kv(w, "ticket", &self.ticket_id)?;
        pretty_kv(w, "comment", &self.comment_id)?;
        pretty_kv(w, "internal", if self.internal { "yes" } else { "no" })
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.ticket_id, self.comment_id)
    }
}

fn transition_output(
    engine: &WorkflowEngine,
    id: &TicketId,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let ticket = engine.ticket(id)?;
    render_item(
        &TransitionOutput {
            ok: true,
            ticket_id: id.to_string(),
            status: ticket.status,
        },
        mode,
    )
}

pub fn create(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: CreateArgs,
) -> anyhow::Result<()> {
    let id = engine.create_ticket(
        actor,
        NewTicket {
            title: args.title,
            description: args.description,
            severity: args.severity,
            campus_id: args.campus_id,
            category: args.category,
        },
    )?;
    transition_output(engine, &id, mode)
}

pub fn assign(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: AssignArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    engine.assign_ticket(&id, actor, UserId::new(args.assignee))?;
    transition_output(engine, &id, mode)
}

pub fn escalate(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: EscalateArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    engine.escalate_ticket(&id, actor, UserId::new(args.supervisor))?;
    transition_output(engine, &id, mode)
}

pub fn resolve(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: ResolveArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    engine.resolve_ticket(&id, actor)?;
    transition_output(engine, &id, mode)
}

pub fn close(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: CloseArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    engine.close_ticket(&id, actor, !args.unconfirmed)?;
    transition_output(engine, &id, mode)
}

pub fn reopen(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: ReopenArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    engine.reopen_ticket(&id, actor)?;
    transition_output(engine, &id, mode)
}

pub fn comment(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: CommentArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    let comment_id = engine.add_comment(&id, actor, &args.content, args.internal, args.attachments)?;
    render_item(
        &CommentOutput {
            ok: true,
            ticket_id: id.to_string(),
            comment_id: comment_id.to_string(),
            internal: args.internal,
        },
        mode,
    )
}
