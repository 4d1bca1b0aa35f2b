//! cfgtar Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for cfgtar, a tool
//! that validates configuration trees against schemas and renders a tar
//! archive of text templates against them, following hexagonal (ports and
//! adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           cfgtar-cli (CLI)              │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │            (ArchivePipeline)            │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (EntrySource/Sink, Renderer, Functions) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    cfgtar-adapters (Infrastructure)     │
//! │ (Tar streams, TextTemplate, System env) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (Value, SchemaValidator, Overrides)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cfgtar_core::prelude::*;
//!
//! // 1. Validate a configuration
//! let validator = SchemaValidator::with_builtins(env);
//! let config = validator.validate(&schema, &data)?;
//!
//! // 2. Render an archive against it (with injected adapters)
//! let pipeline = ArchivePipeline::new(validator, renderer, functions);
//! pipeline.run(&mut source, Some(&mut sink), config, &PipelineOptions::default())?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ArchivePipeline, CancellationToken, PipelineOptions, RunSummary,
        ports::{EntrySink, EntrySource, TemplateFunctions, TemplateRenderer},
    };
    pub use crate::domain::{
        ArchiveEntry, Delimiters, ErrorKind, ErrorPath, HostEnvironment, OverrideRegistry,
        SchemaValidator, ValidatorCatalogue, Value,
    };
    pub use crate::error::{CfgtarError, CfgtarResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
