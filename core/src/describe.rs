//! Serializable snapshots of a command tree.
//!
//! [`Cmd::describe`](crate::Cmd::describe) walks a tree and produces a
//! [`CommandInfo`] that can be written as JSON, e.g. for documentation
//! generators or shell tooling that wants to know the available commands.

use serde::{Deserialize, Serialize};

/// Description of one flag in a command's scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagInfo {
    /// Identifier used to read the flag's value.
    pub id: String,
    /// Short form without the dash (e.g. `'p'`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    /// Long form without the dashes (e.g. `"port"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    /// Placeholder shown for the value, if the flag takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,
    /// Whether the flag consumes a value.
    pub takes_value: bool,
    /// Default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FlagInfo {
    /// Returns the flag as typed on a command line: `-p, --port`, `--port`,
    /// `-p`, or the bare id when neither form exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use cmdtree_core::FlagInfo;
    ///
    /// let info = FlagInfo {
    ///     id: "port".into(),
    ///     short: Some('p'),
    ///     long: Some("port".into()),
    ///     value_name: Some("PORT".into()),
    ///     takes_value: true,
    ///     default: None,
    ///     help: None,
    /// };
    /// assert_eq!(info.display_name(), "-p, --port");
    /// ```
    pub fn display_name(&self) -> String {
        match (self.short, self.long.as_deref()) {
            (Some(short), Some(long)) => format!("-{short}, --{long}"),
            (Some(short), None) => format!("-{short}"),
            (None, Some(long)) => format!("--{long}"),
            (None, None) => self.id.clone(),
        }
    }
}

/// Description of a command and, recursively, its subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Command name.
    pub name: String,
    /// One-line description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Whether running the command itself does something.
    pub runnable: bool,
    /// Flags of this command only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagInfo>,
    /// Subcommands in name order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcommands: Vec<CommandInfo>,
}

impl CommandInfo {
    /// Finds a direct subcommand by name.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandInfo> {
        self.subcommands.iter().find(|sub| sub.name == name)
    }

    /// Gets all subcommand names.
    pub fn subcommand_names(&self) -> Vec<&str> {
        self.subcommands.iter().map(|sub| sub.name.as_str()).collect()
    }

    /// Serializes as compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use clap::{Arg, ArgAction};

    use crate::{Cmd, Flags};

    use super::*;

    fn tree() -> Cmd {
        Cmd::new("tool")
            .with_description("Example tool")
            .with_cmd(
                Cmd::new("serve")
                    .with_description("Start the server")
                    .with_flags(
                        Flags::new("serve").arg(
                            Arg::new("port")
                                .long("port")
                                .default_value("8080")
                                .help("Port to listen on"),
                        ),
                    )
                    .with_run(|_, _| Ok(())),
            )
            .with_cmd(
                Cmd::new("check").with_flags(
                    Flags::new("check").arg(Arg::new("strict").short('s').action(ArgAction::SetTrue)),
                ),
            )
    }

    #[test]
    fn test_describe_lists_subcommands_in_name_order() {
        let info = tree().describe();
        assert_eq!(info.name, "tool");
        assert!(!info.runnable);
        assert_eq!(info.subcommand_names(), vec!["check", "help", "serve"]);
    }

    #[test]
    fn test_describe_includes_flags() {
        let info = tree().describe();
        let serve = info.find_subcommand("serve").unwrap();
        assert!(serve.runnable);
        assert_eq!(serve.flags.len(), 1);
        assert_eq!(serve.flags[0].long.as_deref(), Some("port"));
        assert_eq!(serve.flags[0].default.as_deref(), Some("8080"));

        let check = info.find_subcommand("check").unwrap();
        assert_eq!(check.flags[0].display_name(), "-s");
    }

    #[test]
    fn test_describe_help_subcommand_is_runnable() {
        let info = tree().describe();
        let help = info.find_subcommand("help").unwrap();
        assert!(help.runnable);
        assert_eq!(help.description, "Print the help message for tool or a subcommand");
        assert!(help.subcommands.is_empty());
    }

    #[test]
    fn test_json_omits_empty_fields() {
        let info = Cmd::bare("leaf").describe();
        let json = info.to_json().unwrap();
        assert_eq!(json, r#"{"name":"leaf","runnable":false}"#);

        let parsed: CommandInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, info);
    }
}
