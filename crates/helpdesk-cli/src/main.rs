#![forbid(unsafe_code)]

//! `hd` — command-line front end for the helpdesk workflow engine.
//!
//! The acting identity comes from `--actor`/`--role` (or the
//! `HELPDESK_ACTOR`/`HELPDESK_ROLE` env vars); authentication is an
//! external concern. State is carried between invocations as a JSON
//! snapshot file.

mod cmd;
mod output;
mod state;

use anyhow::Context;
use clap::Parser;
use helpdesk_core::engine::WorkflowEngine;
use helpdesk_core::error::WorkflowError;
use helpdesk_core::model::{Actor, Role};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hd: role-gated IT helpdesk ticket tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (default: pretty on a TTY, text when piped).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Acting user id (or set HELPDESK_ACTOR).
    #[arg(long, global = true)]
    actor: Option<String>,

    /// Acting role: enduser, itstaff, supervisor, or manager
    /// (or set HELPDESK_ROLE; default enduser).
    #[arg(long, global = true, value_parser = parse_role)]
    role: Option<Role>,

    /// Snapshot file carrying state between invocations.
    #[arg(long, global = true, default_value = ".helpdesk.json")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse().map_err(|e: helpdesk_core::model::role::UnknownRole| e.to_string())
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a new ticket",
        after_help = "EXAMPLES:\n    hd --actor u1 create --title \"Cannot access email\" --description \"server not found\"\n    hd --actor u1 create --title \"DB down\" --description \"...\" --severity mission_critical --json"
    )]
    Create(cmd::lifecycle::CreateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Assign a ticket to a staff member",
        after_help = "EXAMPLES:\n    hd --actor s1 --role itstaff assign t-1 s1"
    )]
    Assign(cmd::lifecycle::AssignArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Escalate a ticket to a supervisor",
        after_help = "EXAMPLES:\n    hd --actor s1 --role itstaff escalate t-1 sup1"
    )]
    Escalate(cmd::lifecycle::EscalateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Mark an assigned ticket resolved",
        after_help = "EXAMPLES:\n    hd --actor s1 --role itstaff resolve t-1"
    )]
    Resolve(cmd::lifecycle::ResolveArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Close a resolved ticket (creator only)",
        after_help = "EXAMPLES:\n    hd --actor u1 close t-1\n    hd --actor u1 close t-1 --unconfirmed"
    )]
    Close(cmd::lifecycle::CloseArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Reopen a closed ticket (creator only)",
        after_help = "EXAMPLES:\n    hd --actor u1 reopen t-1"
    )]
    Reopen(cmd::lifecycle::ReopenArgs),

    #[command(
        next_help_heading = "Discussion",
        about = "Add a comment to a ticket",
        after_help = "EXAMPLES:\n    hd --actor u1 comment t-1 \"any update?\"\n    hd --actor s1 --role itstaff comment t-1 \"suspect disk failure\" --internal"
    )]
    Comment(cmd::lifecycle::CommentArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets visible to the acting user",
        after_help = "EXAMPLES:\n    hd --actor sup1 --role supervisor list\n    hd --actor s1 --role itstaff list --status new --json"
    )]
    List(cmd::read::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket with its visible comments",
        after_help = "EXAMPLES:\n    hd --actor u1 show t-1"
    )]
    Show(cmd::read::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show a ticket's audit history",
        after_help = "EXAMPLES:\n    hd --actor sup1 --role supervisor history t-1"
    )]
    History(cmd::read::HistoryArgs),
}

impl Commands {
    /// Whether this command mutates the store (and the snapshot must be
    /// rewritten on success).
    const fn mutates(&self) -> bool {
        matches!(
            self,
            Self::Create(_)
                | Self::Assign(_)
                | Self::Escalate(_)
                | Self::Resolve(_)
                | Self::Close(_)
                | Self::Reopen(_)
                | Self::Comment(_)
        )
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HELPDESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "helpdesk=debug,info"
        } else {
            "helpdesk=info,warn"
        })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn resolve_actor(cli: &Cli) -> anyhow::Result<Actor> {
    let id = match &cli.actor {
        Some(flag) => flag.clone(),
        None => env::var("HELPDESK_ACTOR")
            .context("no acting user: pass --actor or set HELPDESK_ACTOR")?,
    };
    let role = match cli.role {
        Some(role) => role,
        None => match env::var("HELPDESK_ROLE") {
            Ok(raw) => parse_role(&raw).map_err(anyhow::Error::msg)?,
            Err(_) => Role::EndUser,
        },
    };
    Ok(Actor::new(id, role))
}

fn run(cli: Cli, mode: OutputMode) -> anyhow::Result<()> {
    let actor = resolve_actor(&cli)?;
    let store = Arc::new(state::load(&cli.data)?);
    let engine = WorkflowEngine::new(Arc::clone(&store));

    let mutates = cli.command.mutates();
    match cli.command {
        Commands::Create(args) => cmd::lifecycle::create(&engine, &actor, mode, args)?,
        Commands::Assign(args) => cmd::lifecycle::assign(&engine, &actor, mode, args)?,
        Commands::Escalate(args) => cmd::lifecycle::escalate(&engine, &actor, mode, args)?,
        Commands::Resolve(args) => cmd::lifecycle::resolve(&engine, &actor, mode, args)?,
        Commands::Close(args) => cmd::lifecycle::close(&engine, &actor, mode, args)?,
        Commands::Reopen(args) => cmd::lifecycle::reopen(&engine, &actor, mode, args)?,
        Commands::Comment(args) => cmd::lifecycle::comment(&engine, &actor, mode, args)?,
        Commands::List(args) => cmd::read::list(&engine, &actor, mode, args)?,
        Commands::Show(args) => cmd::read::show(&engine, &actor, mode, args)?,
        Commands::History(args) => cmd::read::history(&engine, &actor, mode, args)?,
    }

    if mutates {
        state::save(&cli.data, &store)?;
        tracing::debug!(data = %cli.data.display(), "snapshot saved");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mode = resolve_output_mode(cli.format, cli.json);
    init_tracing(cli.verbose);

    match run(cli, mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cli_error = err
                .downcast_ref::<WorkflowError>()
                .map_or_else(|| CliError::new(format!("{err:#}")), CliError::from);
            if render_error(mode, &cli_error).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
