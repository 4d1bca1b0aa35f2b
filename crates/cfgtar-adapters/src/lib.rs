//! Infrastructure adapters for cfgtar.
//!
//! This crate implements the ports defined in `cfgtar-core::application::ports`.
//! It contains all external dependencies and I/O operations: tar streams,
//! the text template engine, the standard function set and host queries.

pub mod archive;
pub mod environment;
pub mod functions;
pub mod renderer;

// Re-export commonly used adapters
pub use archive::{MemoryArchive, MemorySink, TarEntrySink, TarEntrySource};
pub use environment::{FixedEnvironment, SystemEnvironment};
pub use functions::StandardFunctions;
pub use renderer::TextTemplateRenderer;
