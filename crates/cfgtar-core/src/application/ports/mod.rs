//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `cfgtar-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `EntrySource` / `EntrySink`: Archive streams
//!   - `TemplateRenderer`: Text template execution
//!   - `TemplateFunctions`: Named functions callable from templates
//!   - `HostEnvironment`: Host state queries (defined in the domain)
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use crate::domain::HostEnvironment;
pub use output::{
    EntrySink, EntrySource, NoFunctions, RenderError, TemplateFunctions, TemplateRenderer,
};
