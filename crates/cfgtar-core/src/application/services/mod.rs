//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "render an archive against a configuration".

pub mod cancel;
pub mod pipeline_service;

pub use cancel::CancellationToken;
pub use pipeline_service::{ArchivePipeline, PipelineOptions, RunSummary, SCHEMA_MARKER};
