//! Template function sets.

pub mod standard;

pub use standard::StandardFunctions;
