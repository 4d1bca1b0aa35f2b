//! Application layer for cfgtar.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ArchivePipeline)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! validation logic itself. All schema rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{ArchivePipeline, CancellationToken, PipelineOptions, RunSummary, SCHEMA_MARKER};

// Re-export port traits (for adapter implementation)
pub use ports::{
    EntrySink, EntrySource, HostEnvironment, NoFunctions, RenderError, TemplateFunctions,
    TemplateRenderer,
};

pub use error::ApplicationError;
