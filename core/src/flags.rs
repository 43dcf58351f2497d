//! Per-command flag scopes.
//!
//! A [`FlagScope`] is the capability a [`Cmd`](crate::Cmd) uses to split its
//! raw arguments into recognized flags and positionals. [`Flags`] is the
//! implementation backed by clap's builder API; any other parser can be
//! plugged in by implementing the trait.
//!
//! Flag parsing stops at the first positional argument. Everything after it
//! is handed back untouched (including tokens that look like flags), so the
//! next command down the tree can parse its own flags.
//!
//! # Examples
//!
//! ```
//! use clap::{Arg, ArgAction};
//! use cmdtree_core::{FlagScope, Flags};
//!
//! let flags = Flags::new("serve")
//!     .arg(Arg::new("port").long("port").default_value("8080"))
//!     .arg(Arg::new("quiet").short('q').action(ArgAction::SetTrue));
//!
//! let args: Vec<String> = ["-q", "start", "--now"].iter().map(|s| s.to_string()).collect();
//! let matches = flags.parse(&args).unwrap();
//! assert!(matches.get_flag("quiet"));
//! assert_eq!(matches.get_one::<String>("port").map(String::as_str), Some("8080"));
//! assert_eq!(matches.args(), ["start", "--now"]);
//! ```

use std::any::Any;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use thiserror::Error;

use crate::describe::FlagInfo;

const POSITIONALS: &str = "__positionals";
const HELP: &str = "__help";

/// Errors reported by a [`FlagScope`] while parsing.
#[derive(Debug, Error)]
pub enum FlagError {
    /// Unknown flag, missing value, or a value the flag's parser rejected.
    #[error("{message}")]
    Invalid {
        /// Category reported by the underlying parser.
        kind: ErrorKind,
        /// Single-line description of the problem.
        message: String,
    },
    /// `-h` or `--help` was passed.
    #[error("help requested")]
    HelpRequested,
}

impl From<clap::Error> for FlagError {
    fn from(err: clap::Error) -> Self {
        let rendered = err.to_string();
        let message = rendered
            .lines()
            .next()
            .unwrap_or_default()
            .trim_start_matches("error:")
            .trim()
            .to_string();
        FlagError::Invalid {
            kind: err.kind(),
            message,
        }
    }
}

/// Result of parsing one command's arguments.
///
/// Holds the positionals left over after flag parsing and the values of the
/// command's own flags.
#[derive(Debug, Clone, Default)]
pub struct Matches {
    args: Vec<String>,
    flags: ArgMatches,
}

impl Matches {
    /// Creates a result from leftover positionals and parsed flag values.
    pub fn new(args: Vec<String>, flags: ArgMatches) -> Self {
        Self { args, flags }
    }

    /// Positional arguments remaining after flag parsing.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Raw clap matches for the command's flags.
    pub fn flags(&self) -> &ArgMatches {
        &self.flags
    }

    /// Returns the value of flag `id`, or `None` if it is unset or unknown.
    pub fn get_one<T>(&self, id: &str) -> Option<&T>
    where
        T: Any + Clone + Send + Sync + 'static,
    {
        self.flags.try_get_one::<T>(id).ok().flatten()
    }

    /// Returns whether boolean flag `id` was set.
    pub fn get_flag(&self, id: &str) -> bool {
        self.get_one::<bool>(id).copied().unwrap_or(false)
    }
}

/// A command's own flag-parsing context.
pub trait FlagScope {
    /// Name of the scope, normally the owning command's name.
    fn name(&self) -> &str;

    /// Splits `args` into flag values and positionals.
    fn parse(&self, args: &[String]) -> Result<Matches, FlagError>;

    /// Renders one entry per visible flag: name, value hint, help, default.
    fn render_defaults(&self) -> String;

    /// Describes the visible flags for [`Cmd::describe`](crate::Cmd::describe).
    fn describe_flags(&self) -> Vec<FlagInfo> {
        Vec::new()
    }
}

/// Clap-backed [`FlagScope`].
///
/// `-h` and `--help` make [`parse`](FlagScope::parse) return
/// [`FlagError::HelpRequested`] unless a registered flag claims them. A flag
/// given more than once keeps its last value. Only flags belong here;
/// positionals are collected by the scope itself and must not be added as
/// args.
#[derive(Debug, Clone)]
pub struct Flags {
    command: Command,
}

impl Flags {
    /// Creates an empty scope named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let command = Command::new(name.into())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .disable_help_subcommand(true)
            .args_override_self(true)
            .arg(
                Arg::new(POSITIONALS)
                    .num_args(1..)
                    .trailing_var_arg(true)
                    .value_parser(clap::value_parser!(String))
                    .hide(true),
            );
        Self { command }
    }

    /// Registers a flag.
    pub fn arg(mut self, arg: Arg) -> Self {
        self.command = self.command.arg(arg);
        self
    }

    /// The command used for one parse: the registered flags plus a hidden
    /// help flag on whichever of `-h`/`--help` no registered flag uses.
    fn parser(&self) -> Command {
        let args = || self.command.get_arguments();
        let short = (!args().any(|arg| arg.get_short() == Some('h'))).then_some('h');
        let long = (!args().any(|arg| arg.get_long() == Some("help"))).then_some("help");
        if short.is_none() && long.is_none() {
            return self.command.clone();
        }

        self.command.clone().arg(
            Arg::new(HELP)
                .short(short)
                .long(long)
                .action(ArgAction::SetTrue)
                .hide(true),
        )
    }

    fn visible_args(&self) -> impl Iterator<Item = &Arg> {
        self.command
            .get_arguments()
            .filter(|arg| !arg.is_hide_set() && !arg.is_positional())
    }
}

impl FlagScope for Flags {
    fn name(&self) -> &str {
        self.command.get_name()
    }

    fn parse(&self, args: &[String]) -> Result<Matches, FlagError> {
        let flags = self.parser().try_get_matches_from(args.iter())?;
        if flags.try_get_one::<bool>(HELP).ok().flatten() == Some(&true) {
            return Err(FlagError::HelpRequested);
        }

        let positionals = flags
            .get_many::<String>(POSITIONALS)
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        Ok(Matches::new(positionals, flags))
    }

    fn render_defaults(&self) -> String {
        let mut out = String::new();
        for info in self.describe_flags() {
            out.push_str("  ");
            out.push_str(&info.display_name());
            if let Some(value_name) = &info.value_name {
                out.push_str(&format!(" <{value_name}>"));
            }
            out.push('\n');

            let mut detail = info.help.clone().unwrap_or_default();
            if let Some(default) = &info.default {
                if !detail.is_empty() {
                    detail.push(' ');
                }
                detail.push_str(&format!("(default: {default})"));
            }
            if !detail.is_empty() {
                out.push_str("        ");
                out.push_str(&detail);
                out.push('\n');
            }
        }
        out
    }

    fn describe_flags(&self) -> Vec<FlagInfo> {
        self.visible_args().map(flag_info).collect()
    }
}

fn flag_info(arg: &Arg) -> FlagInfo {
    let takes_value = arg.get_action().takes_values();
    let value_name = takes_value.then(|| match arg.get_value_names() {
        Some(names) if !names.is_empty() => names
            .iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        _ => arg.get_id().as_str().to_uppercase(),
    });
    let defaults = arg
        .get_default_values()
        .iter()
        .map(|value| value.to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    // Boolean actions carry an implicit "false" default once clap builds them.
    let default = (takes_value && !defaults.is_empty()).then(|| defaults.join(", "));

    FlagInfo {
        id: arg.get_id().as_str().to_string(),
        short: arg.get_short(),
        long: arg.get_long().map(String::from),
        value_name,
        takes_value,
        default,
        help: arg.get_help().map(|help| help.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Flags {
        Flags::new("serve")
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .value_name("PORT")
                    .default_value("8080")
                    .help("Port to listen on"),
            )
            .arg(
                Arg::new("verbose")
                    .long("verbose")
                    .action(ArgAction::SetTrue)
                    .help("Enable verbose output"),
            )
            .arg(Arg::new("tag").long("tag"))
    }

    #[test]
    fn test_parse_stops_at_first_positional() {
        let matches = sample()
            .parse(&strings(&["--verbose", "run", "--port", "1"]))
            .unwrap();

        assert!(matches.get_flag("verbose"));
        assert_eq!(matches.args(), strings(&["run", "--port", "1"]));
        assert_eq!(
            matches.get_one::<String>("port").map(String::as_str),
            Some("8080")
        );
    }

    #[test]
    fn test_parse_empty_args() {
        let matches = sample().parse(&[]).unwrap();
        assert!(matches.args().is_empty());
        assert!(!matches.get_flag("verbose"));
    }

    #[test]
    fn test_parse_double_dash_is_dropped() {
        let matches = sample().parse(&strings(&["--", "-3", "x"])).unwrap();
        assert_eq!(matches.args(), strings(&["-3", "x"]));
    }

    #[test]
    fn test_parse_unknown_flag() {
        let err = sample().parse(&strings(&["--bogus"])).unwrap_err();
        match err {
            FlagError::Invalid { kind, message } => {
                assert_eq!(kind, ErrorKind::UnknownArgument);
                assert!(message.contains("--bogus"), "message: {message}");
                assert!(!message.starts_with("error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_help_flag() {
        let err = sample().parse(&strings(&["-h"])).unwrap_err();
        assert!(matches!(err, FlagError::HelpRequested));
    }

    #[test]
    fn test_registered_short_h_takes_precedence() {
        let flags = Flags::new("connect").arg(Arg::new("host").short('h').long("host"));

        let matches = flags.parse(&strings(&["-h", "example"])).unwrap();
        assert_eq!(
            matches.get_one::<String>("host").map(String::as_str),
            Some("example")
        );
        assert!(matches.args().is_empty());

        let err = flags.parse(&strings(&["--help"])).unwrap_err();
        assert!(matches!(err, FlagError::HelpRequested));
    }

    #[test]
    fn test_registered_long_help_takes_precedence() {
        let flags = Flags::new("docs").arg(
            Arg::new("topic")
                .short('t')
                .long("help")
                .action(ArgAction::SetTrue),
        );

        let matches = flags.parse(&strings(&["--help"])).unwrap();
        assert!(matches.get_flag("topic"));

        let err = flags.parse(&strings(&["-h"])).unwrap_err();
        assert!(matches!(err, FlagError::HelpRequested));
    }

    #[test]
    fn test_both_help_forms_claimed() {
        let flags = Flags::new("both")
            .arg(Arg::new("host").short('h'))
            .arg(Arg::new("helper").long("help").action(ArgAction::SetTrue));

        let matches = flags.parse(&strings(&["-h", "x", "--help", "rest"])).unwrap();
        assert_eq!(matches.get_one::<String>("host").map(String::as_str), Some("x"));
        assert!(matches.get_flag("helper"));
        assert_eq!(matches.args(), strings(&["rest"]));
    }

    #[test]
    fn test_repeated_flag_keeps_last_value() {
        let matches = sample()
            .parse(&strings(&["--verbose", "--verbose", "--port", "1", "--port", "2"]))
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(matches.get_one::<String>("port").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_unknown_ids_read_as_unset() {
        let matches = sample().parse(&[]).unwrap();
        assert!(matches.get_one::<String>("missing").is_none());
        assert!(!matches.get_flag("missing"));
    }

    #[test]
    fn test_render_defaults() {
        let rendered = sample().render_defaults();
        assert_eq!(
            rendered,
            "  -p, --port <PORT>\n        Port to listen on (default: 8080)\n  --verbose\n        Enable verbose output\n  --tag <TAG>\n"
        );
    }

    #[test]
    fn test_render_defaults_without_flags() {
        assert_eq!(Flags::new("empty").render_defaults(), "");
    }

    #[test]
    fn test_describe_flags_skips_reserved_args() {
        let infos = sample().describe_flags();
        let ids: Vec<&str> = infos.iter().map(|info| info.id.as_str()).collect();
        assert_eq!(ids, vec!["port", "verbose", "tag"]);
        assert_eq!(infos[0].short, Some('p'));
        assert_eq!(infos[0].default.as_deref(), Some("8080"));
        assert!(!infos[1].takes_value);
    }
}
