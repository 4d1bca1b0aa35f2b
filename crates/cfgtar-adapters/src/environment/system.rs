//! The real machine: OS calls through `nix`, address lookups through the
//! std resolver and TXT lookups through `hickory-resolver`.

use std::fs;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};
use std::path::Path;

use cfgtar_core::domain::{Cidr, HostEnvironment, PathKind};
use hickory_resolver::Resolver;
use tracing::trace;

/// Production [`HostEnvironment`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl SystemEnvironment {
    pub fn new() -> Self {
        Self
    }
}

impl HostEnvironment for SystemEnvironment {
    fn hostname(&self) -> io::Result<String> {
        platform::hostname()
    }

    fn interface_addresses(&self, name: &str) -> io::Result<Option<Vec<Cidr>>> {
        let addrs = platform::interface_addresses(name)?;
        trace!(interface = name, found = addrs.is_some(), "Queried interface");
        Ok(addrs)
    }

    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs: Vec<IpAddr> = (host, 0).to_socket_addrs()?.map(|sa| sa.ip()).collect();
        trace!(host, count = addrs.len(), "Resolved host");
        Ok(addrs)
    }

    /// Character strings of one record are concatenated.
    fn resolve_txt(&self, name: &str) -> io::Result<Vec<String>> {
        let resolver = Resolver::from_system_conf().map_err(io::Error::other)?;
        let lookup = resolver.txt_lookup(name).map_err(io::Error::other)?;
        let records: Vec<String> = lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|part| String::from_utf8_lossy(part))
                    .collect()
            })
            .collect();
        trace!(name, count = records.len(), "Resolved TXT records");
        Ok(records)
    }

    fn path_kind(&self, path: &Path) -> Option<PathKind> {
        let meta = fs::metadata(path).ok()?;
        Some(if meta.is_dir() {
            PathKind::Directory
        } else if meta.is_file() {
            PathKind::File
        } else {
            PathKind::Other
        })
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

#[cfg(unix)]
mod platform {
    use std::io;
    use std::net::{IpAddr, SocketAddrV4, SocketAddrV6};

    use cfgtar_core::domain::Cidr;
    use nix::ifaddrs::getifaddrs;
    use nix::sys::socket::{SockaddrLike, SockaddrStorage};

    pub fn hostname() -> io::Result<String> {
        nix::unistd::gethostname()
            .map_err(io::Error::from)?
            .into_string()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "host name is not UTF-8"))
    }

    pub fn interface_addresses(name: &str) -> io::Result<Option<Vec<Cidr>>> {
        let mut found = false;
        let mut addrs = Vec::new();
        for ifaddr in getifaddrs().map_err(io::Error::from)? {
            if ifaddr.interface_name != name {
                continue;
            }
            found = true;
            let (Some(addr), Some(mask)) = (
                ifaddr.address.as_ref().and_then(ip_of),
                ifaddr.netmask.as_ref().and_then(ip_of),
            ) else {
                continue;
            };
            let prefix = match mask {
                IpAddr::V4(m) => u32::from(m).count_ones(),
                IpAddr::V6(m) => u128::from(m).count_ones(),
            };
            if let Ok(cidr) = Cidr::new(addr, prefix as u8) {
                addrs.push(cidr);
            }
        }
        Ok(found.then_some(addrs))
    }

    fn ip_of(storage: &SockaddrStorage) -> Option<IpAddr> {
        if storage.family().is_none() {
            return None;
        }
        if let Some(sin) = storage.as_sockaddr_in() {
            return Some(IpAddr::V4(*SocketAddrV4::from(*sin).ip()));
        }
        storage
            .as_sockaddr_in6()
            .map(|sin6| IpAddr::V6(*SocketAddrV6::from(*sin6).ip()))
    }
}

#[cfg(not(unix))]
mod platform {
    use std::io;

    use cfgtar_core::domain::Cidr;

    fn unsupported() -> io::Error {
        io::Error::new(io::ErrorKind::Unsupported, "not supported on this platform")
    }

    pub fn hostname() -> io::Result<String> {
        std::env::var("COMPUTERNAME").map_err(|_| unsupported())
    }

    pub fn interface_addresses(_name: &str) -> io::Result<Option<Vec<Cidr>>> {
        Err(unsupported())
    }
}
