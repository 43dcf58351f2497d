use std::io::{self, Write};

use anyhow::{Context, bail};
use clap::{Arg, ArgAction};
use cmdtree_core::{Cmd, Flags, Matches};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PROGRAM: &str = "cmdtree-demo";

fn main() {
    init_logging();
    build_root().exec();
}

/// Logs go to stderr. `CMDTREE_LOG` takes precedence over `RUST_LOG`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("CMDTREE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();

    if let Err(err) = result {
        eprintln!("log system initialization failed: {err}");
    }
}

fn build_root() -> Cmd {
    Cmd::new(PROGRAM)
        .with_description("Route arguments through a small command tree")
        .with_cmd(greet_cmd())
        .with_cmd(math_cmd())
        .with_cmd(describe_cmd())
}

fn greet_cmd() -> Cmd {
    Cmd::new("greet")
        .with_description("Print a greeting")
        .with_flags(
            Flags::new("greet")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .value_name("NAME")
                        .default_value("world")
                        .help("Who to greet"),
                )
                .arg(
                    Arg::new("shout")
                        .long("shout")
                        .action(ArgAction::SetTrue)
                        .help("Print the greeting in upper case"),
                ),
        )
        .with_run(run_greet)
}

fn run_greet(_cmd: &Cmd, matches: &Matches) -> anyhow::Result<()> {
    let name = matches
        .get_one::<String>("name")
        .map(String::as_str)
        .unwrap_or("world");

    let mut greeting = format!("hello, {name}");
    if !matches.args().is_empty() {
        greeting.push(' ');
        greeting.push_str(&matches.args().join(" "));
    }
    if matches.get_flag("shout") {
        greeting = greeting.to_uppercase();
    }

    writeln!(io::stdout(), "{greeting}")?;
    Ok(())
}

fn math_cmd() -> Cmd {
    Cmd::new("math")
        .with_description("Integer arithmetic")
        .with_cmd(
            Cmd::new("add")
                .with_description("Print the sum of the arguments")
                .with_run(|_, matches| {
                    let total = parse_numbers(matches.args())?
                        .into_iter()
                        .try_fold(0i64, |acc, n| acc.checked_add(n))
                        .context("sum overflows a 64-bit integer")?;
                    writeln!(io::stdout(), "{total}")?;
                    Ok(())
                }),
        )
        .with_cmd(
            Cmd::new("mul")
                .with_description("Print the product of the arguments")
                .with_run(|_, matches| {
                    let product = parse_numbers(matches.args())?
                        .into_iter()
                        .try_fold(1i64, |acc, n| acc.checked_mul(n))
                        .context("product overflows a 64-bit integer")?;
                    writeln!(io::stdout(), "{product}")?;
                    Ok(())
                }),
        )
}

fn parse_numbers(args: &[String]) -> anyhow::Result<Vec<i64>> {
    if args.is_empty() {
        bail!("expected at least one number");
    }
    args.iter()
        .map(|arg| {
            arg.parse::<i64>()
                .with_context(|| format!("invalid number {arg:?}"))
        })
        .collect()
}

fn describe_cmd() -> Cmd {
    Cmd::new("describe")
        .with_description("Print the command tree as JSON")
        .with_flags(
            Flags::new("describe").arg(
                Arg::new("compact")
                    .long("compact")
                    .action(ArgAction::SetTrue)
                    .help("Print the JSON on a single line"),
            ),
        )
        .with_run(|_, matches| {
            let info = build_root().describe();
            debug!(commands = info.subcommands.len(), "describing command tree");
            let json = if matches.get_flag("compact") {
                info.to_json()?
            } else {
                info.to_json_pretty()?
            };
            writeln!(io::stdout(), "{json}")?;
            Ok(())
        })
}
