//! Deterministic host environment for tests and reproducible renders.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use cfgtar_core::domain::{Cidr, HostEnvironment, PathKind};

/// A [`HostEnvironment`] answering from tables filled in up front.
///
/// Unknown interfaces, hosts and paths behave as absent.
#[derive(Debug, Clone, Default)]
pub struct FixedEnvironment {
    hostname: String,
    interfaces: HashMap<String, Vec<Cidr>>,
    hosts: HashMap<String, Vec<IpAddr>>,
    txt: HashMap<String, Vec<String>>,
    files: HashMap<PathBuf, String>,
    directories: Vec<PathBuf>,
}

impl FixedEnvironment {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    pub fn with_interface(mut self, name: impl Into<String>, addrs: Vec<Cidr>) -> Self {
        self.interfaces.insert(name.into(), addrs);
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        self.hosts.insert(host.into(), addrs);
        self
    }

    pub fn with_txt(mut self, name: impl Into<String>, records: Vec<String>) -> Self {
        self.txt.insert(name.into(), records);
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn with_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directories.push(path.into());
        self
    }
}

impl HostEnvironment for FixedEnvironment {
    fn hostname(&self) -> io::Result<String> {
        Ok(self.hostname.clone())
    }

    fn interface_addresses(&self, name: &str) -> io::Result<Option<Vec<Cidr>>> {
        Ok(self.interfaces.get(name).cloned())
    }

    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts.get(host).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such host: {host}"))
        })
    }

    fn resolve_txt(&self, name: &str) -> io::Result<Vec<String>> {
        self.txt.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no TXT records for {name}"))
        })
    }

    fn path_kind(&self, path: &Path) -> Option<PathKind> {
        if self.files.contains_key(path) {
            Some(PathKind::File)
        } else if self.directories.iter().any(|d| d == path) {
            Some(PathKind::Directory)
        } else {
            None
        }
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{}: not found", path.display()))
        })
    }
}
