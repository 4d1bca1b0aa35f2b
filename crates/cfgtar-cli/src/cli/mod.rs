//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "cfgtar",
    bin_name = "cfgtar",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Render tar archive templates against validated configuration",
    long_about = "cfgtar reads a tar stream, renders every file as a template against a \
                  JSON configuration and writes the result as a new tar stream. Schema \
                  files embedded in the archive validate the configuration for their \
                  directory before anything below it is rendered.",
    after_help = "EXAMPLES:\n\
        \x20 cat template.tar | cfgtar render config.json | tar -x -C /\n\
        \x20 cfgtar render schema.json config.json -i template.tar -o out.tar\n\
        \x20 cfgtar render config.json -i template.tar -s hosts -t out/\n\
        \x20 cfgtar check schema.json config.json",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Render a template archive.
    #[command(
        visible_alias = "r",
        about = "Render a template archive",
        after_help = "EXAMPLES:\n\
            \x20 cfgtar render config.json < in.tar > out.tar\n\
            \x20 cfgtar render schema.json config.json -i in.tar -o out.tar\n\
            \x20 cfgtar render config.json -i in.tar --dry-run\n\
            \x20 cfgtar render config.json -i in.tar -D '<%.%>'"
    )]
    Render(RenderArgs),

    /// Validate a configuration against a schema.
    #[command(
        about = "Validate configuration against a schema",
        after_help = "EXAMPLES:\n\
            \x20 cfgtar check schema.json config.json\n\
            \x20 cfgtar check schema.json config.json --output-format json"
    )]
    Check(CheckArgs),

    /// Initialise a cfgtar configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 cfgtar init           # default location\n\
            \x20 cfgtar init --local   # .cfgtar.toml in CWD"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 cfgtar completions bash > ~/.local/share/bash-completion/completions/cfgtar\n\
            \x20 cfgtar completions zsh  > ~/.zfunc/_cfgtar\n\
            \x20 cfgtar completions fish > ~/.config/fish/completions/cfgtar.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the cfgtar configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 cfgtar config get render.delimiters\n\
            \x20 cfgtar config list\n\
            \x20 cfgtar config path"
    )]
    Config(ConfigCommands),
}

// ── render ────────────────────────────────────────────────────────────────────

/// Arguments for `cfgtar render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// `[SCHEMA] CONFIG`: with two paths the first is a schema the
    /// configuration is validated against before rendering.
    #[arg(
        value_name = "FILE",
        num_args = 1..=2,
        required = true,
        help = "[SCHEMA] CONFIG: JSON configuration, optionally preceded by a schema"
    )]
    pub files: Vec<PathBuf>,

    /// Input archive (stdin when omitted).
    #[arg(short = 'i', long = "input", value_name = "FILE", help = "Input tar archive")]
    pub input: Option<PathBuf>,

    /// Output archive (stdout when omitted).
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        conflicts_with = "selector",
        help = "Output tar archive"
    )]
    pub output: Option<PathBuf>,

    /// Validate and render without writing anything.
    #[arg(short = 'n', long = "dry-run", help = "Validate and render, write nothing")]
    pub dry_run: bool,

    /// Run a dry pass over the whole archive before producing output.
    #[arg(
        long = "validate-first",
        requires = "input",
        help = "Dry pass before the real one (requires --input)"
    )]
    pub validate_first: bool,

    /// Template delimiters as `LEFT.RIGHT`.
    #[arg(
        short = 'D',
        long = "delimiters",
        value_name = "L.R",
        help = "Template delimiters, e.g. '{{.}}' or '<%.%>'"
    )]
    pub delimiters: Option<String>,

    /// Name of schema marker entries.
    #[arg(
        short = 'S',
        long = "schema-name",
        value_name = "NAME",
        help = "Name of embedded schema files"
    )]
    pub schema_name: Option<String>,

    /// Render once per value of a list-valued configuration key.
    #[arg(
        short = 's',
        long = "selector",
        value_name = "KEY",
        requires_all = ["input", "target"],
        help = "Iterate config[KEY] and write one archive per value"
    )]
    pub selector: Option<String>,

    /// Directory receiving `<value>.tar` for selector runs.
    #[arg(
        short = 't',
        long = "target",
        value_name = "DIR",
        requires = "selector",
        help = "Target directory for selector runs"
    )]
    pub target: Option<PathBuf>,
}

impl RenderArgs {
    /// `(schema, config)` from the positional paths.
    pub fn schema_and_config(&self) -> (Option<&Path>, &Path) {
        match self.files.as_slice() {
            [schema, config] => (Some(schema), config),
            [config] => (None, config),
            _ => (None, Path::new("")),
        }
    }
}

// ── check ─────────────────────────────────────────────────────────────────────

/// Arguments for `cfgtar check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Schema file (JSON).
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Configuration file (JSON).
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `cfgtar init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Write to `.cfgtar.toml` in the current directory.
    #[arg(
        long = "local",
        help = "Create local configuration in current directory"
    )]
    pub local: bool,

    /// Overwrite an existing config file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `cfgtar completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `cfgtar config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `render.delimiters`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the active configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_with_config_only() {
        let cli = Cli::parse_from(["cfgtar", "render", "config.json"]);
        let Commands::Render(args) = cli.command else {
            panic!("expected Render command");
        };
        assert_eq!(args.schema_and_config(), (None, Path::new("config.json")));
        assert!(args.input.is_none());
    }

    #[test]
    fn render_with_schema_and_config() {
        let cli = Cli::parse_from([
            "cfgtar", "render", "schema.json", "config.json", "-i", "in.tar", "-D", "<%.%>",
        ]);
        let Commands::Render(args) = cli.command else {
            panic!("expected Render command");
        };
        assert_eq!(
            args.schema_and_config(),
            (Some(Path::new("schema.json")), Path::new("config.json"))
        );
        assert_eq!(args.delimiters.as_deref(), Some("<%.%>"));
    }

    #[test]
    fn render_rejects_three_files() {
        assert!(Cli::try_parse_from(["cfgtar", "render", "a", "b", "c"]).is_err());
    }

    #[test]
    fn validate_first_requires_input() {
        assert!(Cli::try_parse_from(["cfgtar", "render", "c.json", "--validate-first"]).is_err());
        assert!(
            Cli::try_parse_from(["cfgtar", "render", "c.json", "--validate-first", "-i", "x.tar"])
                .is_ok()
        );
    }

    #[test]
    fn selector_requires_input_and_target() {
        assert!(Cli::try_parse_from(["cfgtar", "render", "c.json", "-s", "hosts"]).is_err());
        assert!(
            Cli::try_parse_from(["cfgtar", "render", "c.json", "-s", "hosts", "-i", "x.tar"])
                .is_err()
        );
        assert!(Cli::try_parse_from([
            "cfgtar", "render", "c.json", "-s", "hosts", "-i", "x.tar", "-t", "out"
        ])
        .is_ok());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["cfgtar", "--quiet", "--verbose", "config", "list"]);
        assert!(result.is_err());
    }
}
