//! Archive stream adapters.

pub mod memory;
pub mod tar;

pub use memory::{MemoryArchive, MemorySink};
pub use self::tar::{TarEntrySink, TarEntrySource};
