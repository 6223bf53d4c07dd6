//! Read commands: list, show, and history. All views go through the
//! engine so role visibility is applied once, centrally.

use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_item, render_list};
use chrono::{DateTime, Utc};
use clap::Args;
use helpdesk_core::engine::WorkflowEngine;
use helpdesk_core::model::id::TicketId;
use helpdesk_core::model::ticket::{Severity, Status, Ticket};
use helpdesk_core::model::{Actor, Comment};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tickets in this status.
    #[arg(long, value_parser = super::parse_status)]
    pub status: Option<Status>,

    /// Only tickets from this campus.
    #[arg(long)]
    pub campus: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket id.
    pub ticket: String,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Ticket id.
    pub ticket: String,
}

#[derive(Debug, Serialize)]
struct TicketRow {
    id: String,
    status: Status,
    severity: Severity,
    assigned_to: Option<String>,
    escalated: bool,
    updated_at: DateTime<Utc>,
    title: String,
}

impl From<&Ticket> for TicketRow {
    fn from(t: &Ticket) -> Self {
        Self {
            id: t.id.to_string(),
            status: t.status,
            severity: t.severity,
            assigned_to: t.assigned_to.as_ref().map(ToString::to_string),
            escalated: t.is_escalated,
            updated_at: t.updated_at,
            title: t.title.clone(),
        }
    }
}

impl Renderable for TicketRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let escalated = if self.escalated { " [escalated]" } else { "" };
        writeln!(
            w,
            "{:<8} {:<12} {:<17} {}{}",
            self.id, self.status, self.severity, self.title, escalated
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id,
            self.status,
            self.severity,
            self.assigned_to.as_deref().unwrap_or("-"),
            self.title
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "STATUS", "SEVERITY", "ASSIGNEE", "TITLE"]
    }
}

#[derive(Debug, Serialize)]
struct TicketDetail {
    #[serde(flatten)]
    ticket: Ticket,
    comments: Vec<Comment>,
}

impl Renderable for TicketDetail {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = &self.ticket;
        writeln!(w, "{}  {}", t.id, t.title)?;
        pretty_rule(w)?;
        pretty_kv(w, "status", t.status.as_str())?;
        pretty_kv(w, "severity", t.severity.as_str())?;
        pretty_kv(w, "created by", t.created_by.as_str())?;
        pretty_kv(
            w,
            "assigned to",
            t.assigned_to.as_ref().map_or("-", |u| u.as_str()),
        )?;
        if t.is_escalated {
            pretty_kv(
                w,
                "supervisor",
                t.supervisor_id.as_ref().map_or("-", |u| u.as_str()),
            )?;
        }
        pretty_kv(w, "campus", &t.campus_id)?;
        pretty_kv(w, "category", &t.category)?;
        pretty_kv(w, "created", t.created_at.to_rfc3339())?;
        pretty_kv(w, "updated", t.updated_at.to_rfc3339())?;
        if let Some(closed_at) = t.closed_at {
            pretty_kv(w, "closed", closed_at.to_rfc3339())?;
            let confirmed = match t.confirmation_status {
                Some(true) => "confirmed fixed",
                Some(false) => "not confirmed",
                None => "-",
            };
            pretty_kv(w, "confirmation", confirmed)?;
        }
        writeln!(w)?;
        writeln!(w, "{}", t.description)?;
        if !self.comments.is_empty() {
            writeln!(w)?;
            writeln!(w, "comments")?;
            pretty_rule(w)?;
            for c in &self.comments {
                let marker = if c.is_internal { " (internal)" } else { "" };
                writeln!(
                    w,
                    "[{}] {}{}: {}",
                    c.created_at.to_rfc3339(),
                    c.user_id,
                    marker,
                    c.content
                )?;
            }
        }
        Ok(())
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        TicketRow::from(&self.ticket).render_table(w)
    }
}

#[derive(Debug, Serialize)]
struct HistoryRow {
    id: u64,
    actor: String,
    action: &'static str,
    previous_value: Option<String>,
    new_value: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Renderable for HistoryRow {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let change = match (&self.previous_value, &self.new_value) {
            (Some(prev), Some(new)) => format!("  {prev} -> {new}"),
            (None, Some(new)) => format!("  -> {new}"),
            _ => String::new(),
        };
        writeln!(
            w,
            "[{}] {:<13} {}{}",
            self.timestamp.to_rfc3339(),
            self.action,
            self.actor,
            change
        )
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id,
            self.action,
            self.actor,
            self.previous_value.as_deref().unwrap_or("-"),
            self.new_value.as_deref().unwrap_or("-")
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "ACTION", "ACTOR", "FROM", "TO"]
    }
}

pub fn list(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: ListArgs,
) -> anyhow::Result<()> {
    let rows: Vec<TicketRow> = engine
        .list_tickets_visible_to(actor)
        .iter()
        .filter(|t| args.status.is_none_or(|s| t.status == s))
        .filter(|t| args.campus.as_ref().is_none_or(|c| t.campus_id == *c))
        .map(TicketRow::from)
        .collect();
    render_list(&rows, mode)
}

pub fn show(
    engine: &WorkflowEngine,
    actor: &Actor,
    mode: OutputMode,
    args: ShowArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    let ticket = engine.ticket(&id)?;
    let comments = engine.comments(&id, actor)?;
    render_item(&TicketDetail { ticket, comments }, mode)
}

pub fn history(
    engine: &WorkflowEngine,
    _actor: &Actor,
    mode: OutputMode,
    args: HistoryArgs,
) -> anyhow::Result<()> {
    let id = TicketId::new(args.ticket);
    let rows: Vec<HistoryRow> = engine
        .history(&id)?
        .into_iter()
        .map(|row| HistoryRow {
            id: row.id,
            actor: row.actor.to_string(),
            action: row.action.tag(),
            previous_value: row.action.previous_value(),
            new_value: row.action.new_value(),
            timestamp: row.timestamp,
        })
        .collect();
    render_list(&rows, mode)
}
