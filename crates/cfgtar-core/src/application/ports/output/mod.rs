//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the pipeline needs from archive formats and the
//! template engine. The `cfgtar-adapters` crate provides implementations.

use thiserror::Error;

use crate::domain::{ArchiveEntry, Delimiters, Value};
use crate::error::CfgtarResult;

/// Port for reading archive entries in stream order.
///
/// Implemented by:
/// - `cfgtar_adapters::archive::TarEntrySource` (production)
/// - `cfgtar_adapters::archive::MemoryArchive` (testing)
pub trait EntrySource {
    /// Next entry, or `None` at the end of the archive.
    fn next_entry(&mut self) -> CfgtarResult<Option<ArchiveEntry>>;
}

/// Port for writing archive entries.
///
/// Implemented by:
/// - `cfgtar_adapters::archive::TarEntrySink` (production)
/// - `cfgtar_adapters::archive::MemorySink` (testing)
pub trait EntrySink {
    /// Append one entry; its size is taken from `entry.content`.
    fn write_entry(&mut self, entry: &ArchiveEntry) -> CfgtarResult<()>;

    /// Terminate the archive. Called exactly once, even with no entries.
    fn finish(&mut self) -> CfgtarResult<()>;
}

/// A template failed to parse or execute.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}{message}", .line.map(|l| format!("line {l}: ")).unwrap_or_default())]
pub struct RenderError {
    pub message: String,
    pub line: Option<usize>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }
}

/// Named functions a template may call.
///
/// The set is closed per run; renderers ask [`TemplateFunctions::has`]
/// while parsing so unknown names fail before anything executes.
pub trait TemplateFunctions: Send + Sync {
    fn has(&self, name: &str) -> bool;

    /// Invoke `name`; the error text becomes a render failure.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, String>;
}

/// Function set with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFunctions;

impl TemplateFunctions for NoFunctions {
    fn has(&self, _name: &str) -> bool {
        false
    }

    fn call(&self, name: &str, _args: &[Value]) -> Result<Value, String> {
        Err(format!("function \"{name}\" not defined"))
    }
}

/// Port for template rendering.
///
/// Implemented by:
/// - `cfgtar_adapters::renderer::TextTemplateRenderer` (Go text/template subset)
pub trait TemplateRenderer: Send + Sync {
    /// Render `source` against `data`.
    ///
    /// # Arguments
    ///
    /// * `source` - Template text
    /// * `data` - Value bound to `.` and `$`
    /// * `delimiters` - Action delimiters
    /// * `functions` - Callable function set
    fn render(
        &self,
        source: &str,
        data: &Value,
        delimiters: &Delimiters,
        functions: &dyn TemplateFunctions,
    ) -> Result<String, RenderError>;
}
