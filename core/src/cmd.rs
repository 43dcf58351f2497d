//! The command tree and its dispatch algorithm.

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};

use clap::error::ErrorKind;
use tracing::{debug, trace};

use crate::describe::CommandInfo;
use crate::error::{DispatchError, ErrorHandling};
use crate::flags::{FlagError, FlagScope, Flags, Matches};
use crate::help;

/// Action run when dispatch stops at a command.
///
/// Receives the command itself and the parsed flags plus leftover
/// positionals.
pub type RunFn = Box<dyn Fn(&Cmd, &Matches) -> anyhow::Result<()>>;

/// Renders a command's usage text.
pub type UsageFn = fn(&Cmd) -> String;

enum Action {
    Run(RunFn),
    /// The synthesized `help` subcommand; runs against the parent command.
    Help,
}

/// A node in a command tree.
///
/// A command owns its subcommands, its own flag scope and an optional
/// action. Flags are never inherited: each level of the tree parses only the
/// flags it declares.
///
/// # Examples
///
/// ```
/// use cmdtree_core::Cmd;
///
/// let root = Cmd::new("tool")
///     .with_description("Example tool")
///     .with_cmd(Cmd::new("serve").with_run(|_cmd, matches| {
///         assert_eq!(matches.args(), ["now"]);
///         Ok(())
///     }));
///
/// root.try_exec_args(["serve", "now"]).unwrap();
/// assert!(root.try_exec_args(Vec::<String>::new()).is_err());
/// ```
pub struct Cmd {
    name: String,
    description: String,
    flags: OnceCell<Box<dyn FlagScope>>,
    commands: BTreeMap<String, Cmd>,
    run: Option<Action>,
    usage: Option<UsageFn>,
}

impl Cmd {
    /// Creates a command with a flag scope, the standard usage renderer and
    /// a `help` subcommand.
    ///
    /// `help` prints the usage of this command, or with an argument, of the
    /// named subcommand. `tool help serve` and `tool serve help` therefore
    /// print the same text.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let help = help::help_cmd(&name);
        let mut cmd = Self::bare(name.clone())
            .with_flags(Flags::new(name))
            .with_usage(help::render_usage);
        cmd.add_cmd(help);
        cmd
    }

    /// Creates a command with no `help` subcommand and no flag scope.
    ///
    /// A default scope named after the command is created the first time one
    /// is needed.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            flags: OnceCell::new(),
            commands: BTreeMap::new(),
            run: None,
            usage: None,
        }
    }

    /// Sets the one-line description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replaces the flag scope.
    pub fn with_flags(mut self, flags: impl FlagScope + 'static) -> Self {
        self.flags = OnceCell::from(Box::new(flags) as Box<dyn FlagScope>);
        self
    }

    /// Sets the action.
    pub fn with_run<F>(mut self, run: F) -> Self
    where
        F: Fn(&Cmd, &Matches) -> anyhow::Result<()> + 'static,
    {
        self.run = Some(Action::Run(Box::new(run)));
        self
    }

    /// Overrides the usage renderer.
    pub fn with_usage(mut self, usage: UsageFn) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Adds a subcommand.
    pub fn with_cmd(mut self, cmd: Cmd) -> Self {
        self.add_cmd(cmd);
        self
    }

    pub(crate) fn with_help_action(mut self) -> Self {
        self.run = Some(Action::Help);
        self
    }

    /// Registers a subcommand.
    ///
    /// A subcommand already registered under the same name is replaced.
    ///
    /// # Panics
    ///
    /// Panics if `cmd` has an empty name.
    pub fn add_cmd(&mut self, cmd: Cmd) {
        assert!(!cmd.name.is_empty(), "cannot add nameless subcommand");
        trace!(parent = %self.name, command = %cmd.name, "registering subcommand");
        if self.commands.insert(cmd.name.clone(), cmd).is_some() {
            trace!(parent = %self.name, "replaced existing subcommand");
        }
    }

    /// Command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description; may be empty.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The command's flag scope, created on first use if none was set.
    pub fn flags(&self) -> &dyn FlagScope {
        self.flags
            .get_or_init(|| Box::new(Flags::new(self.name.clone())) as Box<dyn FlagScope>)
            .as_ref()
    }

    /// Subcommands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Cmd> {
        self.commands.values()
    }

    /// Whether any subcommand is registered.
    pub fn has_commands(&self) -> bool {
        !self.commands.is_empty()
    }

    /// Finds a direct subcommand by name.
    pub fn find_cmd(&self, name: &str) -> Option<&Cmd> {
        self.commands.get(name)
    }

    /// Whether the command has an action.
    pub fn is_runnable(&self) -> bool {
        self.run.is_some()
    }

    /// Renders the usage text with the command's usage hook, falling back to
    /// [`render_usage`](crate::render_usage).
    pub fn usage(&self) -> String {
        self.usage.unwrap_or(help::render_usage)(self)
    }

    /// Snapshots this command and its subcommands.
    pub fn describe(&self) -> CommandInfo {
        CommandInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            runnable: self.is_runnable(),
            flags: self.flags().describe_flags(),
            subcommands: self.commands().map(Cmd::describe).collect(),
        }
    }

    /// Dispatches the process arguments (without the program name), exiting
    /// the process on failure.
    ///
    /// An argument that is not valid UTF-8 is a parse error (exit status 2).
    pub fn exec(&self) {
        match utf8_args(std::env::args_os().skip(1)) {
            Ok(args) => self.exec_args(args),
            Err(err) => err.exit(),
        }
    }

    /// Dispatches `args`, exiting the process on failure.
    ///
    /// Parse errors exit with status 2, routing misses and action errors with
    /// status 1, `-h`/`--help` with status 0 after printing usage.
    pub fn exec_args<I, S>(&self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Err(err) = self.try_exec_args(args) {
            err.exit();
        }
    }

    /// Dispatches `args`, handling failure according to `handling`.
    pub fn exec_args_with<I, S>(&self, args: I, handling: ErrorHandling) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.try_exec_args(args) {
            Err(err) if handling == ErrorHandling::Exit => err.exit(),
            result => result,
        }
    }

    /// Dispatches `args` and returns the outcome. Output of the `help`
    /// subcommand goes to stderr.
    pub fn try_exec_args<I, S>(&self, args: I) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.try_exec_args_to(args, &mut io::stderr())
    }

    /// Dispatches `args` and returns the outcome, writing `help` output to
    /// `out`.
    pub fn try_exec_args_to<I, S>(&self, args: I, out: &mut dyn Write) -> Result<(), DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.dispatch(None, &args, out)
    }

    fn dispatch(&self, parent: Option<&Cmd>, args: &[String], out: &mut dyn Write) -> Result<(), DispatchError> {
        let matches = self.flags().parse(args).map_err(|err| match err {
            FlagError::HelpRequested => DispatchError::Help(self.usage()),
            err => {
                debug!(command = %self.name, error = %err, "flag parsing failed");
                DispatchError::Parse(err)
            }
        })?;

        if let Some(tok) = matches.args().first().filter(|tok| !tok.is_empty()) {
            if let Some(sub) = self.commands.get(tok.as_str()) {
                debug!(command = %self.name, subcommand = %sub.name, "dispatching to subcommand");
                // With no further positionals the child still parses an empty slice.
                return sub.dispatch(Some(self), &matches.args()[1..], out);
            }
        }

        match &self.run {
            None => {
                debug!(command = %self.name, "no action and no matching subcommand");
                Err(DispatchError::Usage(self.usage()))
            }
            Some(Action::Run(run)) => {
                debug!(command = %self.name, args = ?matches.args(), "running command");
                run(self, &matches).map_err(DispatchError::Action)
            }
            Some(Action::Help) => {
                help::run_help(parent.unwrap_or(self), matches.args(), out).map_err(DispatchError::Action)
            }
        }
    }
}

fn utf8_args<I>(args: I) -> Result<Vec<String>, DispatchError>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            arg.into_string().map_err(|arg| {
                DispatchError::Parse(FlagError::Invalid {
                    kind: ErrorKind::InvalidUtf8,
                    message: format!("invalid UTF-8 in argument {arg:?}"),
                })
            })
        })
        .collect()
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("runnable", &self.is_runnable())
            .finish()
    }
}
