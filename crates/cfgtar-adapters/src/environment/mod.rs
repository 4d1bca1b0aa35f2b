//! Host environment adapters.

pub mod fixed;
pub mod system;

pub use fixed::FixedEnvironment;
pub use system::SystemEnvironment;
