//! Flags accepted by every subcommand.
//!
//! Flattened into [`super::Cli`]. Status and log output always goes to
//! stderr because `render` may be writing a tar stream to stdout.

use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Log verbosity: `-v` info, `-vv` debug, `-vvv` trace.
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv, -vvv)",
        long_help = "Increase logging verbosity (RUST_LOG overrides):
    (none)  - Warnings and errors
    -v      - Info level (per-run summary)
    -vv     - Debug level (per-entry decisions)
    -vvv    - Trace level (validator and template internals)"
    )]
    pub verbose: u8,

    /// Only errors reach stderr.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose",
        help = "Suppress non-error output"
    )]
    pub quiet: bool,

    /// Honours `NO_COLOR` (<https://no-color.org>); any value but a falsey
    /// literal disables color.
    #[arg(
        long = "no-color",
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new(),
        help = "Disable colored output"
    )]
    pub no_color: bool,

    /// Explicit configuration file; must exist when given.
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "output-format",
        global = true,
        value_enum,
        default_value = "auto",
        help = "Format of status lines and results"
    )]
    pub output_format: OutputFormat,
}

/// How status lines and `check`/`config` results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored status when stderr is a terminal.
    #[default]
    Auto,
    /// No colors.
    Plain,
    /// No colors; results as compact JSON.
    Json,
}
