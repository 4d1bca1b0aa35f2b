//! Questions the domain asks about the machine it runs on.
//!
//! The `hostname`, `nic*`, `lookup*`, `dir` and `file` validators (and the
//! matching template functions) depend on live host state. They reach it
//! only through [`HostEnvironment`], so tests can substitute a fixed answer
//! sheet while production uses `cfgtar_adapters::SystemEnvironment`.

use std::io;
use std::net::IpAddr;
use std::path::Path;

use crate::domain::net::Cidr;

/// What a filesystem path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Directory,
    File,
    Other,
}

/// Port for host state queries.
///
/// Implemented by:
/// - `cfgtar_adapters::SystemEnvironment` (production: OS + resolver)
/// - `cfgtar_adapters::FixedEnvironment` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait HostEnvironment: Send + Sync {
    /// Host name of the running machine.
    fn hostname(&self) -> io::Result<String>;

    /// Addresses bound to interface `name`, or `None` if no such interface.
    fn interface_addresses(&self, name: &str) -> io::Result<Option<Vec<Cidr>>>;

    /// Resolve a host name to its addresses.
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;

    /// TXT records of `name`, one string per record.
    fn resolve_txt(&self, name: &str) -> io::Result<Vec<String>>;

    /// Kind of the object at `path`, `None` if it does not exist.
    fn path_kind(&self, path: &Path) -> Option<PathKind>;

    /// Read a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}
