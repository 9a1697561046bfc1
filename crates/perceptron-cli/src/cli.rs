use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Perceptron CLI - Recognise known job situations by matching text patterns across log files, output files, and the environment.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one perception cycle and report which situation occurs.
    ///
    /// Exit status: 0 when exactly one situation is perceived, 2 when none is,
    /// 3 when several are.
    Perceive(PerceiveArgs),
    /// Load and validate a knowledge base, then list its situations.
    Check(CheckArgs),
}

/// Arguments for the `perceive` subcommand.
#[derive(Args, Debug)]
pub struct PerceiveArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Knowledge base: a TOML file or a directory of TOML files.
    /// Overrides `knowledge-base` from the config file.
    #[arg(short, long, value_name = "PATH")]
    pub knowledge_base: Option<PathBuf>,

    /// Directory against which relative channel paths and patterns are resolved.
    /// Overrides `workdir` from the config file.
    #[arg(short, long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Add a file channel. Can be used multiple times. Example: --channel LOGFEED=job.log
    #[arg(long = "channel", value_name = "TYPE=PATH")]
    pub channels: Vec<String>,

    /// Add every file of the working directory whose name matches REGEX.
    /// Example: --channel-pattern OUTPUTFILE='.*\.out'
    #[arg(long = "channel-pattern", value_name = "TYPE=REGEX")]
    pub channel_patterns: Vec<String>,

    /// Add the environment of this process as an ENVIRONMENT channel.
    #[arg(long)]
    pub environment: bool,

    /// Set a loop counter value. Can be used multiple times. Example: --counter attempts=2
    #[arg(long = "counter", value_name = "ID=VALUE")]
    pub counters: Vec<String>,

    /// Print the satisfaction score of every (situation, circumstance) pair.
    #[arg(long)]
    pub scores: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    pub no_progress: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S counters.attempts=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Knowledge base: a TOML file or a directory of TOML files.
    #[arg(required = true, value_name = "PATH")]
    pub knowledge_base: PathBuf,

    /// A TOML file of `[[channel]]` definitions to validate alongside the knowledge base.
    #[arg(long, value_name = "PATH")]
    pub channels: Option<PathBuf>,

    /// Also print the circumstances of every situation.
    #[arg(long)]
    pub details: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perceive_arguments_are_parsed() {
        let cli = Cli::parse_from([
            "perceptron",
            "-vv",
            "perceive",
            "-k",
            "kb.toml",
            "--channel",
            "LOGFEED=job.log",
            "--channel",
            "OUTPUTFILE=job.out",
            "--counter",
            "attempts=2",
            "--scores",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Perceive(args) = cli.command else {
            panic!("Expected 'perceive' subcommand");
        };
        assert_eq!(args.knowledge_base, Some(PathBuf::from("kb.toml")));
        assert_eq!(args.channels, vec!["LOGFEED=job.log", "OUTPUTFILE=job.out"]);
        assert_eq!(args.counters, vec!["attempts=2"]);
        assert!(args.scores);
        assert!(!args.environment);
    }

    #[test]
    fn check_requires_a_knowledge_base() {
        assert!(Cli::try_parse_from(["perceptron", "check"]).is_err());
        let cli = Cli::try_parse_from(["perceptron", "check", "kb/", "--details"]).unwrap();
        assert!(matches!(cli.command, Commands::Check(CheckArgs { details: true, .. })));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["perceptron", "-q", "-v", "check", "kb.toml"]).is_err());
    }
}
