//! Archive entries as the pipeline sees them.
//!
//! Adapters translate their native archive records into [`ArchiveEntry`]
//! and back. Everything except `content` and `size` passes through the
//! pipeline untouched.

use std::fmt;

/// What kind of filesystem object an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntryKind {
    #[default]
    Regular,
    Directory,
    Symlink,
    HardLink,
    /// Devices, FIFOs and anything else; passed through.
    Other,
}

impl EntryKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "file",
            Self::Directory => "dir",
            Self::Symlink => "symlink",
            Self::HardLink => "hardlink",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header fields carried over verbatim from input to output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryMetadata {
    pub mode: u32,
    pub uid: u64,
    pub gid: u64,
    /// Seconds since the Unix epoch.
    pub mtime: u64,
    pub link_name: Option<String>,
    pub username: Option<String>,
    pub groupname: Option<String>,
    /// Raw archive type flag for kinds the model does not distinguish.
    pub type_flag: Option<u8>,
}

/// One record of an archive stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub kind: EntryKind,
    pub content: Vec<u8>,
    pub metadata: EntryMetadata,
}

impl ArchiveEntry {
    /// Regular file with mode `0644`.
    pub fn file(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Regular,
            content: content.into(),
            metadata: EntryMetadata {
                mode: 0o644,
                ..EntryMetadata::default()
            },
        }
    }

    /// Directory with mode `0755`.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            content: Vec::new(),
            metadata: EntryMetadata {
                mode: 0o755,
                ..EntryMetadata::default()
            },
        }
    }

    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_regular(&self) -> bool {
        self.kind == EntryKind::Regular
    }

    /// Path components of the containing directory.
    ///
    /// Empty and `.` components are skipped, so `./a//b/c.txt` yields
    /// `["a", "b"]` and a top-level entry yields `[]`.
    pub fn directory_segments(&self) -> Vec<&str> {
        let trimmed = self.path.trim_end_matches('/');
        let parent = match trimmed.rfind('/') {
            Some(i) => &trimmed[..i],
            None => "",
        };
        parent
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect()
    }

    /// Last path component.
    pub fn base_name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}
