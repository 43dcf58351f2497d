//! Lightweight command trees for command-line programs.
//!
//! This crate lets a program define a tree of named commands, each with its
//! own flags and action, and dispatch the process arguments to the right
//! command:
//!
//! - [`Cmd`] — a node in the tree. [`Cmd::new`] also attaches a `help`
//!   subcommand and the standard usage renderer.
//! - [`FlagScope`] — the per-command flag parser; [`Flags`] implements it on
//!   top of clap.
//! - [`Matches`] — what an action receives: its flag values and the
//!   positionals left after routing.
//! - [`DispatchError`] — structured dispatch outcome for callers that do not
//!   want the process to exit.
//!
//! Dispatch parses the command's own flags, then, if the first positional
//! names a subcommand, recurses into it with the remaining arguments.
//! Otherwise it runs the command's action. Flags are not inherited.
//!
//! # Example
//!
//! ```
//! use clap::{Arg, ArgAction};
//! use cmdtree_core::*;
//!
//! let root = Cmd::new("tool")
//!     .with_description("Example tool")
//!     .with_cmd(
//!         Cmd::new("greet")
//!             .with_description("Print a greeting")
//!             .with_flags(
//!                 Flags::new("greet")
//!                     .arg(Arg::new("loud").long("loud").action(ArgAction::SetTrue)),
//!             )
//!             .with_run(|_cmd, matches| {
//!                 assert!(matches.get_flag("loud"));
//!                 assert_eq!(matches.args(), ["world"]);
//!                 Ok(())
//!             }),
//!     );
//!
//! root.try_exec_args(["greet", "--loud", "world"]).unwrap();
//!
//! // Unknown flags are parse errors (exit status 2 under `exec`).
//! let err = root.try_exec_args(["greet", "--quiet"]).unwrap_err();
//! assert_eq!(err.exit_code(), 2);
//!
//! // `help <command>` renders that command's usage.
//! let mut out: Vec<u8> = Vec::new();
//! root.try_exec_args_to(["help", "greet"], &mut out).unwrap();
//! assert!(String::from_utf8(out).unwrap().starts_with("greet - Print a greeting\n"));
//! ```
//!
//! In `main`, call [`Cmd::exec`], which prints diagnostics and exits with
//! status 2 on parse errors and status 1 on routing misses or action errors.

mod cmd;
mod describe;
mod error;
mod flags;
mod help;

pub use cmd::{Cmd, RunFn, UsageFn};
pub use describe::{CommandInfo, FlagInfo};
pub use error::{DispatchError, ErrorHandling};
pub use flags::{FlagError, FlagScope, Flags, Matches};
pub use help::{HelpError, render_usage};
