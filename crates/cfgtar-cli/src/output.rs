//! Output management and formatting.
//!
//! Status lines go to stderr so that `render` can stream a tar archive on
//! stdout. Command results (`check`, `config`) go to stdout via
//! [`OutputManager::data`].

use std::io::{self, IsTerminal};

use cfgtar_core::domain::Value;
use console::Term;
use owo_colors::OwoColorize;

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

pub struct OutputManager {
    quiet: bool,
    no_color: bool,
    compact_json: bool,
    status: Term,
    data: Term,
}

impl OutputManager {
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let no_color = args.no_color
            || config.output.no_color
            || match args.output_format {
                OutputFormat::Auto => !io::stderr().is_terminal(),
                OutputFormat::Plain | OutputFormat::Json => true,
            };

        Self {
            quiet: args.quiet,
            no_color,
            compact_json: args.output_format == OutputFormat::Json || !config.output.pretty_json,
            status: Term::stderr(),
            data: Term::stdout(),
        }
    }

    // ── Status (stderr) ───────────────────────────────────────────────────

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}")
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.status.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}")
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.status.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}")
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.status.write_line(&line)
    }

    // ── Results (stdout) ──────────────────────────────────────────────────

    /// Command result; printed even in quiet mode.
    pub fn data(&self, text: &str) -> io::Result<()> {
        self.data.write_line(text)
    }

    /// A value tree as JSON: compact for `--output-format json`, otherwise
    /// indented unless the config turns that off.
    pub fn json(&self, value: &Value) -> io::Result<()> {
        self.data(&self.render_json(value))
    }

    fn render_json(&self, value: &Value) -> String {
        if self.compact_json {
            value.to_json_string()
        } else {
            value.to_json_pretty()
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
