//! In-memory archive adapters for testing.

use std::collections::VecDeque;

use cfgtar_core::{
    application::ports::{EntrySink, EntrySource},
    domain::ArchiveEntry,
    error::CfgtarResult,
};

/// Entry source over a fixed list.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: VecDeque<ArchiveEntry>,
}

impl MemoryArchive {
    pub fn new(entries: impl IntoIterator<Item = ArchiveEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Entries not yet read.
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<ArchiveEntry> for MemoryArchive {
    fn from_iter<I: IntoIterator<Item = ArchiveEntry>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl EntrySource for MemoryArchive {
    fn next_entry(&mut self) -> CfgtarResult<Option<ArchiveEntry>> {
        Ok(self.entries.pop_front())
    }
}

/// Sink that keeps everything written to it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Vec<ArchiveEntry>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Find a written entry by path (testing helper).
    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Content of a written entry as text.
    pub fn read_file(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|e| String::from_utf8_lossy(&e.content).into_owned())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_entries(self) -> Vec<ArchiveEntry> {
        self.entries
    }
}

impl EntrySink for MemorySink {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> CfgtarResult<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn finish(&mut self) -> CfgtarResult<()> {
        self.finished = true;
        Ok(())
    }
}
