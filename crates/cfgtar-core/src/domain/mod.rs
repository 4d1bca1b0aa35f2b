// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for cfgtar.
//!
//! Pure logic: the value tree, schema validation, the override registry and
//! the archive entry model. Host state is only reachable through the
//! [`HostEnvironment`] port; archives and templates live behind the ports of
//! the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No direct I/O**: host queries go through `HostEnvironment`
//! - **Values, not globals**: catalogues and registries are built per run

pub mod entry;
pub mod environment;
pub mod error;
pub mod net;
pub mod overrides;
pub mod path;
pub mod schema;
pub mod value;
pub mod value_objects;

// Re-exports for convenience
pub use entry::{ArchiveEntry, EntryKind, EntryMetadata};
pub use environment::{HostEnvironment, PathKind};
pub use error::{DomainError, ErrorCategory, ErrorKind, ValidationFailure};
pub use net::{Cidr, CidrError, IpVersion};
pub use overrides::{OverrideNode, OverrideRegistry};
pub use path::{ErrorPath, PathSegment};
pub use schema::{LeafValidator, ParamMap, SchemaValidator, TypeExpr, ValidatorCatalogue};
pub use value::{Mapping, Value};
pub use value_objects::{DelimiterError, Delimiters};
