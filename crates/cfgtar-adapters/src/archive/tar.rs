//! Tar streams on top of the `tar` crate.

use std::borrow::Cow;
use std::io::{Read, Write};

use cfgtar_core::{
    application::{
        ApplicationError,
        ports::{EntrySink, EntrySource},
    },
    domain::{ArchiveEntry, EntryKind, EntryMetadata},
    error::{CfgtarResult, Context},
};
use ::tar::{Archive, Builder, Entries, EntryType, Header};
use tracing::trace;

// ── Source ───────────────────────────────────────────────────────────────────

/// Reads entries one at a time from a tar stream.
///
/// Borrows the [`Archive`] because `tar` ties its entry iterator to it:
///
/// ```rust,no_run
/// # use cfgtar_adapters::archive::TarEntrySource;
/// let mut archive = tar::Archive::new(std::io::stdin());
/// let mut source = TarEntrySource::new(&mut archive)?;
/// # Ok::<(), cfgtar_core::error::CfgtarError>(())
/// ```
pub struct TarEntrySource<'a, R: 'a + Read> {
    entries: Entries<'a, R>,
}

impl<'a, R: 'a + Read> TarEntrySource<'a, R> {
    pub fn new(archive: &'a mut Archive<R>) -> CfgtarResult<Self> {
        let entries = archive.entries().context("opening tar stream")?;
        Ok(Self { entries })
    }
}

impl<'a, R: 'a + Read> EntrySource for TarEntrySource<'a, R> {
    fn next_entry(&mut self) -> CfgtarResult<Option<ArchiveEntry>> {
        let Some(entry) = self.entries.next() else {
            return Ok(None);
        };
        let mut entry = entry.context("reading tar header")?;

        let path = lossy(entry.path_bytes());
        let link_name = entry.link_name_bytes().map(lossy);
        let header = entry.header();
        let entry_type = header.entry_type();
        let kind = kind_of(entry_type);
        let metadata = EntryMetadata {
            mode: header.mode().context("reading tar header")?,
            uid: header.uid().context("reading tar header")?,
            gid: header.gid().context("reading tar header")?,
            mtime: header.mtime().context("reading tar header")?,
            link_name,
            username: header.username().ok().flatten().map(str::to_owned),
            groupname: header.groupname().ok().flatten().map(str::to_owned),
            type_flag: (kind == EntryKind::Other).then(|| entry_type.as_byte()),
        };

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .with_path_context(&path, "reading")?;

        trace!(entry = %path, %kind, size = content.len(), "Read tar entry");
        Ok(Some(ArchiveEntry {
            path,
            kind,
            content,
            metadata,
        }))
    }
}

fn kind_of(entry_type: EntryType) -> EntryKind {
    if entry_type.is_file() {
        EntryKind::Regular
    } else if entry_type.is_dir() {
        EntryKind::Directory
    } else if entry_type.is_symlink() {
        EntryKind::Symlink
    } else if entry_type.is_hard_link() {
        EntryKind::HardLink
    } else {
        EntryKind::Other
    }
}

fn lossy(bytes: Cow<'_, [u8]>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}

// ── Sink ─────────────────────────────────────────────────────────────────────

/// Writes entries as a GNU tar stream.
///
/// Header fields come from the entry metadata; the size always matches the
/// entry content.
pub struct TarEntrySink<W: Write> {
    builder: Builder<W>,
    finished: bool,
}

impl<W: Write> TarEntrySink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            builder: Builder::new(writer),
            finished: false,
        }
    }

    /// Finish the archive if needed and return the writer.
    pub fn into_inner(mut self) -> CfgtarResult<W> {
        if !self.finished {
            self.finish()?;
        }
        self.builder.into_inner().context("closing tar stream")
    }

    fn header_for(entry: &ArchiveEntry) -> CfgtarResult<Header> {
        let meta = &entry.metadata;
        let mut header = Header::new_gnu();
        header.set_entry_type(match entry.kind {
            EntryKind::Regular => EntryType::Regular,
            EntryKind::Directory => EntryType::Directory,
            EntryKind::Symlink => EntryType::Symlink,
            EntryKind::HardLink => EntryType::Link,
            EntryKind::Other => meta.type_flag.map_or(EntryType::Regular, EntryType::new),
        });
        header.set_mode(meta.mode);
        header.set_uid(meta.uid);
        header.set_gid(meta.gid);
        header.set_mtime(meta.mtime);
        header.set_size(entry.size());
        if let Some(name) = &meta.username {
            header.set_username(name).with_path_context(&entry.path, "writing owner of")?;
        }
        if let Some(name) = &meta.groupname {
            header.set_groupname(name).with_path_context(&entry.path, "writing group of")?;
        }
        Ok(header)
    }
}

impl<W: Write> EntrySink for TarEntrySink<W> {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> CfgtarResult<()> {
        let mut header = Self::header_for(entry)?;
        let link = match (entry.kind, &entry.metadata.link_name) {
            (EntryKind::Symlink | EntryKind::HardLink, Some(target)) => Some(target),
            (EntryKind::Symlink | EntryKind::HardLink, None) => {
                return Err(ApplicationError::Io {
                    context: format!("writing {}", entry.path),
                    reason: "link entry has no target".into(),
                }
                .into());
            }
            _ => None,
        };

        if let Some(target) = link {
            let field = &mut header.as_old_mut().linkname;
            write_name(&mut self.builder, field, target.as_bytes(), EntryType::GNULongLink)
                .with_path_context(&entry.path, "writing link target of")?;
        }
        let field = &mut header.as_old_mut().name;
        write_name(&mut self.builder, field, entry.path.as_bytes(), EntryType::GNULongName)
            .with_path_context(&entry.path, "writing name of")?;

        header.set_cksum();
        self.builder
            .append(&header, entry.content.as_slice())
            .with_path_context(&entry.path, "writing")?;
        trace!(entry = %entry.path, size = entry.size(), "Wrote tar entry");
        Ok(())
    }

    fn finish(&mut self) -> CfgtarResult<()> {
        self.builder.finish().context("writing tar trailer")?;
        self.builder.get_mut().flush().context("flushing tar stream")?;
        self.finished = true;
        Ok(())
    }
}

/// Name of the GNU records carrying an overlong name.
const LONG_LINK: &[u8] = b"././@LongLink";

/// Copy `name` into a header field byte for byte. Names that do not fit
/// are preceded by a GNU long-name record of kind `long`; the field then
/// holds the truncated prefix.
fn write_name<W: Write>(
    builder: &mut Builder<W>,
    field: &mut [u8; 100],
    name: &[u8],
    long: EntryType,
) -> std::io::Result<()> {
    if name.len() > field.len() {
        let mut record = Header::new_gnu();
        record.as_old_mut().name[..LONG_LINK.len()].copy_from_slice(LONG_LINK);
        record.set_entry_type(long);
        record.set_mode(0o644);
        record.set_uid(0);
        record.set_gid(0);
        record.set_mtime(0);
        record.set_size(name.len() as u64 + 1);
        record.set_cksum();
        builder.append(&record, name.chain(&[0u8][..]))?;
    }
    let len = name.len().min(field.len());
    field.fill(0);
    field[..len].copy_from_slice(&name[..len]);
    Ok(())
}

trait PathContext<T> {
    fn with_path_context(self, path: &str, action: &str) -> CfgtarResult<T>;
}

impl<T> PathContext<T> for std::io::Result<T> {
    fn with_path_context(self, path: &str, action: &str) -> CfgtarResult<T> {
        self.context(format!("{action} {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(entries: &[ArchiveEntry]) -> Vec<u8> {
        let mut sink = TarEntrySink::new(Vec::new());
        for entry in entries {
            sink.write_entry(entry).unwrap();
        }
        sink.into_inner().unwrap()
    }

    fn read(bytes: &[u8]) -> Vec<ArchiveEntry> {
        let mut archive = Archive::new(bytes);
        let mut source = TarEntrySource::new(&mut archive).unwrap();
        let mut out = Vec::new();
        while let Some(entry) = source.next_entry().unwrap() {
            out.push(entry);
        }
        out
    }

    #[test]
    fn metadata_survives_a_round_trip() {
        let mut file = ArchiveEntry::file("etc/app.conf", "port = 80\n");
        file.metadata = EntryMetadata {
            mode: 0o640,
            uid: 1000,
            gid: 100,
            mtime: 1_700_000_000,
            username: Some("svc".into()),
            groupname: Some("users".into()),
            ..EntryMetadata::default()
        };

        let back = read(&write(&[file.clone()]));
        assert_eq!(back, vec![file]);
    }

    #[test]
    fn directories_and_symlinks() {
        let dir = ArchiveEntry::directory("etc/");
        let mut link = ArchiveEntry::file("etc/current", "");
        link.kind = EntryKind::Symlink;
        link.metadata.link_name = Some("app.conf".into());

        let back = read(&write(&[dir, link]));
        assert_eq!(back[0].kind, EntryKind::Directory);
        assert_eq!(back[1].kind, EntryKind::Symlink);
        assert_eq!(back[1].metadata.link_name.as_deref(), Some("app.conf"));
    }

    #[test]
    fn long_paths_are_preserved() {
        let path = format!("{}/file.txt", "d".repeat(150));
        let back = read(&write(&[ArchiveEntry::file(path.clone(), "x")]));
        assert_eq!(back[0].path, path);
    }

    #[test]
    fn names_are_written_verbatim() {
        let names = ["./etc/app.conf", "/etc/hosts", "../up.txt", "etc//x"];
        let entries: Vec<ArchiveEntry> =
            names.iter().map(|n| ArchiveEntry::file(*n, "x")).collect();
        let back: Vec<String> = read(&write(&entries)).into_iter().map(|e| e.path).collect();
        assert_eq!(back, names);
    }

    #[test]
    fn long_link_targets_are_preserved() {
        let target = format!("/opt/{}/current", "v".repeat(120));
        let mut link = ArchiveEntry::file("./current", "");
        link.kind = EntryKind::Symlink;
        link.metadata.link_name = Some(target.clone());

        let back = read(&write(&[link]));
        assert_eq!(back[0].path, "./current");
        assert_eq!(back[0].metadata.link_name.as_deref(), Some(target.as_str()));
    }

    #[test]
    fn empty_archive_has_a_trailer() {
        let bytes = write(&[]);
        assert_eq!(bytes.len(), 1024);
        assert!(read(&bytes).is_empty());
    }

    #[test]
    fn symlink_without_target_is_rejected() {
        let mut link = ArchiveEntry::file("l", "");
        link.kind = EntryKind::Symlink;
        let mut sink = TarEntrySink::new(Vec::new());
        assert!(sink.write_entry(&link).is_err());
    }
}
