//! The synthesized `help` subcommand and usage rendering.
//!
//! Usage text has the shape:
//!
//! ```text
//! tool - Example tool
//!
//! Commands
//!   help  Print the help message for tool or a subcommand
//!   serve Start the server
//!
//! Flags
//!   --port <PORT>
//!         Port to listen on (default: 8080)
//! ```

use std::io::Write;

use thiserror::Error;

use crate::Cmd;

/// Failures of the `help` subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelpError {
    /// `help <name>` named a subcommand that is not registered.
    #[error("no such command: {0:?}")]
    NoSuchCommand(String),
}

/// Builds the `help` child that [`Cmd::new`] attaches to `parent`.
pub(crate) fn help_cmd(parent: &str) -> Cmd {
    Cmd::bare("help")
        .with_description(format!(
            "Print the help message for {parent} or a subcommand"
        ))
        .with_help_action()
}

/// Runs `help` on behalf of `parent`.
///
/// Only `args[0]` is consulted.
pub(crate) fn run_help(parent: &Cmd, args: &[String], out: &mut dyn Write) -> anyhow::Result<()> {
    let target = match args.first() {
        Some(name) if parent.has_commands() => parent
            .find_cmd(name)
            .ok_or_else(|| HelpError::NoSuchCommand(name.clone()))?,
        _ => parent,
    };

    out.write_all(target.usage().as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Renders the usage text of `cmd`: header, sorted commands, flags.
///
/// Creates the command's flag scope if it does not exist yet.
///
/// # Examples
///
/// ```
/// use cmdtree_core::{Cmd, render_usage};
///
/// let cmd = Cmd::bare("leaf").with_description("A leaf");
/// assert_eq!(render_usage(&cmd), "leaf - A leaf\n\nFlags\n");
/// ```
pub fn render_usage(cmd: &Cmd) -> String {
    let mut out = format!("{} - {}\n", cmd.name(), cmd.description());
    out.push_str(&render_commands(cmd));
    out.push_str("\nFlags\n");
    out.push_str(&cmd.flags().render_defaults());
    out
}

fn render_commands(cmd: &Cmd) -> String {
    if !cmd.has_commands() {
        return String::new();
    }

    let width = cmd
        .commands()
        .map(|sub| sub.name().chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::from("\nCommands\n");
    for sub in cmd.commands() {
        let row = format!("  {:<width$} {}", sub.name(), sub.description());
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}
