//! Dispatch outcomes and the exit-on-error adapter.
//!
//! [`Cmd::try_exec_args`](crate::Cmd::try_exec_args) returns a
//! [`DispatchError`] instead of terminating the process. The default entry
//! points ([`Cmd::exec`](crate::Cmd::exec),
//! [`Cmd::exec_args`](crate::Cmd::exec_args)) hand it to
//! [`DispatchError::exit`], which prints the diagnostic and exits with
//! [`DispatchError::exit_code`].

use std::io::{self, Write};

use thiserror::Error;

use crate::flags::FlagError;

/// Why dispatching a command line did not complete normally.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A command's flag scope rejected its arguments.
    #[error("error parsing arguments: {0}")]
    Parse(FlagError),

    /// No subcommand matched and the command has no action. Carries the
    /// command's rendered usage text.
    #[error("{0}")]
    Usage(String),

    /// `-h`/`--help` was passed. Carries the command's rendered usage text.
    #[error("{0}")]
    Help(String),

    /// The command's action failed.
    #[error("error: {0:#}")]
    Action(anyhow::Error),
}

impl DispatchError {
    /// Process exit status for this outcome.
    ///
    /// `2` for parse errors, `1` for routing misses and action errors, `0`
    /// for explicit help requests.
    pub fn exit_code(&self) -> i32 {
        match self {
            DispatchError::Parse(_) => 2,
            DispatchError::Usage(_) | DispatchError::Action(_) => 1,
            DispatchError::Help(_) => 0,
        }
    }

    /// Writes the diagnostic for this outcome.
    ///
    /// Usage text is written as-is; other outcomes get one line.
    pub fn report(&self, out: &mut dyn Write) -> io::Result<()> {
        match self {
            DispatchError::Usage(usage) | DispatchError::Help(usage) => {
                out.write_all(usage.as_bytes())?
            }
            other => writeln!(out, "{other}")?,
        }
        out.flush()
    }

    /// Reports to stderr and terminates the process.
    pub fn exit(self) -> ! {
        let _ = self.report(&mut io::stderr());
        std::process::exit(self.exit_code())
    }
}

/// What [`Cmd::exec_args_with`](crate::Cmd::exec_args_with) does when
/// dispatch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorHandling {
    /// Print the diagnostic and exit the process (the default).
    #[default]
    Exit,
    /// Return the error to the caller.
    Return,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn reported(err: &DispatchError) -> String {
        let mut out: Vec<u8> = Vec::new();
        err.report(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_exit_codes() {
        let parse = DispatchError::Parse(FlagError::Invalid {
            kind: ErrorKind::UnknownArgument,
            message: "unexpected argument '--x' found".into(),
        });
        assert_eq!(parse.exit_code(), 2);
        assert_eq!(DispatchError::Usage(String::new()).exit_code(), 1);
        assert_eq!(DispatchError::Action(anyhow::anyhow!("boom")).exit_code(), 1);
        assert_eq!(DispatchError::Help(String::new()).exit_code(), 0);
    }

    #[test]
    fn test_report_parse_error() {
        let err = DispatchError::Parse(FlagError::Invalid {
            kind: ErrorKind::UnknownArgument,
            message: "unexpected argument '--x' found".into(),
        });
        assert_eq!(
            reported(&err),
            "error parsing arguments: unexpected argument '--x' found\n"
        );
    }

    #[test]
    fn test_report_action_error_includes_context() {
        let err = anyhow::anyhow!("disk full").context("writing report");
        assert_eq!(
            reported(&DispatchError::Action(err)),
            "error: writing report: disk full\n"
        );
    }

    #[test]
    fn test_report_usage_verbatim() {
        let usage = "tool - Example\n\nFlags\n".to_string();
        assert_eq!(reported(&DispatchError::Usage(usage.clone())), usage);
    }

    #[test]
    fn test_default_handling_exits() {
        assert_eq!(ErrorHandling::default(), ErrorHandling::Exit);
    }
}
