//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `CFGTAR_*` environment variables, e.g. `CFGTAR_RENDER__DELIMITERS`
//! 3. `.cfgtar.toml` in the current directory
//! 4. The config file (`--config`, or the platform config directory)
//! 5. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use cfgtar_core::{application::SCHEMA_MARKER, domain::Delimiters};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// File name of the per-directory configuration.
pub const LOCAL_CONFIG: &str = ".cfgtar.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Defaults for `render`.
    pub render: RenderConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Entry name that marks an embedded schema.
    pub schema_marker: String,
    /// Template delimiters as `LEFT.RIGHT`.
    pub delimiters: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    /// Indent JSON printed by `check`.
    pub pretty_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig {
                schema_marker: SCHEMA_MARKER.into(),
                delimiters: Delimiters::default().to_string(),
            },
            output: OutputConfig {
                no_color: false,
                pretty_json: true,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, starting from defaults.
    ///
    /// An explicit `config_file` must exist; the default locations are
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let main = match config_file {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::from(Self::config_path().as_path()).required(false),
        };

        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(main)
            .add_source(File::from(Path::new(LOCAL_CONFIG)).required(false))
            .add_source(
                Environment::with_prefix("CFGTAR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.cfgtar.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "cfgtar", "cfgtar")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
    }

    /// Look up a dotted key for `config get`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "render.schema_marker" => Some(self.render.schema_marker.clone()),
            "render.delimiters" => Some(self.render.delimiters.clone()),
            "output.no_color" => Some(self.output.no_color.to_string()),
            "output.pretty_json" => Some(self.output.pretty_json.to_string()),
            _ => None,
        }
    }

    /// Every key understood by [`AppConfig::get`].
    pub const KEYS: &'static [&'static str] = &[
        "render.schema_marker",
        "render.delimiters",
        "output.no_color",
        "output.pretty_json",
    ];
}
