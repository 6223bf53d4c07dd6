//! Shared output layer for pretty/text/JSON parity across commands.
//!
//! Every command handler receives an [`OutputMode`] and renders through
//! [`render_item`] / [`render_list`]: pretty output for humans, compact
//! rows for pipes, or stable JSON.
//!
//! Mode resolution precedence (highest wins): `--format`, the hidden
//! `--json` alias, the `HELPDESK_FORMAT` env var, then TTY detection.

use clap::ValueEnum;
use helpdesk_core::error::WorkflowError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, visual framing).
    Pretty,
    /// Token-efficient plain rows for pipes and scripts.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

fn resolve_inner(
    format_flag: Option<OutputMode>,
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }
    if json_flag {
        return OutputMode::Json;
    }
    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value, fall through to TTY detection
        }
    }
    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from CLI flags, environment, and TTY defaults.
pub fn resolve_output_mode(format_flag: Option<OutputMode>, json_flag: bool) -> OutputMode {
    let env_val = std::env::var("HELPDESK_FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_inner(format_flag, json_flag, env_val.as_deref(), is_tty)
}

/// Trait implemented by any CLI result type renderable in all modes.
pub trait Renderable: Serialize {
    /// Render for human consumption: labels, sections, framing.
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single plain-text row (no header).
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Column headers for text mode, in [`render_table`] field order.
    ///
    /// [`render_table`]: Renderable::render_table
    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Render a single item to stdout using the given output mode.
pub fn render_item<R: Renderable>(item: &R, mode: OutputMode) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Pretty => item.render_human(&mut out)?,
        OutputMode::Text => item.render_table(&mut out)?,
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, item)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Render a list of items: a JSON array, or sequential rows with a text
/// header.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Pretty => {
            for item in items {
                item.render_human(&mut out)?;
            }
        }
        OutputMode::Text => {
            let headers = R::table_headers();
            if !headers.is_empty() && !items.is_empty() {
                writeln!(out, "{}", headers.join("  "))?;
            }
            for item in items {
                item.render_table(&mut out)?;
            }
        }
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, items)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Stable error object rendered to stderr in every mode.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CliError {
    pub error: String,
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: None,
            hint: None,
        }
    }
}

impl From<&WorkflowError> for CliError {
    fn from(err: &WorkflowError) -> Self {
        let code = err.code();
        Self {
            error: err.to_string(),
            code: Some(code.code()),
            hint: code.hint(),
        }
    }
}

/// Render an error to stderr: JSON object in JSON mode, message + hint
/// otherwise.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, error)?;
        writeln!(out)?;
    } else {
        match error.code {
            Some(code) => writeln!(out, "error[{code}]: {}", error.error)?,
            None => writeln!(out, "error: {}", error.error)?,
        }
        if let Some(hint) = error.hint {
            writeln!(out, "hint: {hint}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CliError, OutputMode, resolve_inner};
    use helpdesk_core::error::WorkflowError;
    use helpdesk_core::model::id::TicketId;

    #[test]
    fn format_flag_wins_over_everything() {
        let mode = resolve_inner(Some(OutputMode::Json), false, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn json_flag_beats_env_and_tty() {
        let mode = resolve_inner(None, true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn env_var_is_honored_when_valid() {
        assert_eq!(resolve_inner(None, false, Some("text"), true), OutputMode::Text);
        // Unknown values fall through to TTY detection.
        assert_eq!(resolve_inner(None, false, Some("xml"), true), OutputMode::Pretty);
        assert_eq!(resolve_inner(None, false, Some("xml"), false), OutputMode::Text);
    }

    #[test]
    fn workflow_errors_carry_code_and_hint() {
        let err = WorkflowError::NotFound(TicketId::new("t-9"));
        let cli: CliError = (&err).into();
        assert_eq!(cli.code, Some("E2001"));
        assert!(cli.error.contains("t-9"));
        assert!(cli.hint.is_none());

        let generic = CliError::new("something went wrong");
        assert_eq!(generic.code, None);
    }
}
