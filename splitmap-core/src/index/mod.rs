//! The split map: header, summary counters and every record of one archive.
//!
//! Records live in a single discovery-ordered sequence. On disk they are
//! grouped: all directories, then all files, then all symlinks.

pub mod record;
pub mod summary;

pub use record::{ChunkRecord, DirRecord, Entry, EntryKind, FileRecord, SymlinkRecord};
pub use summary::{LargestFile, Summary};

use crate::codec::{BinReader, BinWriter};
use crate::error::{Result, SplitError};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const MAGIC: &str = "BIN_WRITR_MGK";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Header {
    pub capacity: u64,
    pub prefix: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitMap {
    pub header: Header,
    pub summary: Summary,
    pub entries: Vec<Entry>,
}

impl SplitMap {
    pub fn new(capacity: u64, prefix: &str) -> Self {
        Self {
            header: Header {
                capacity,
                prefix: prefix.to_string(),
            },
            summary: Summary::default(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: Entry) {
        self.summary.observe(&entry);
        self.entries.push(entry);
    }

    pub fn dirs(&self) -> impl Iterator<Item = &DirRecord> + '_ {
        self.entries.iter().filter_map(|e| match e {
            Entry::Directory(d) => Some(d),
            _ => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.entries.iter().filter_map(|e| match e {
            Entry::File(f) => Some(f),
            _ => None,
        })
    }

    pub fn symlinks(&self) -> impl Iterator<Item = &SymlinkRecord> + '_ {
        self.entries.iter().filter_map(|e| match e {
            Entry::Symlink(s) => Some(s),
            _ => None,
        })
    }

    /// (sum of declared file sizes, sum of chunk lengths)
    pub fn byte_totals(&self) -> (u64, u64) {
        self.files()
            .fold((0u64, 0u64), |(f, c), r| {
                (
                    f.saturating_add(r.size),
                    c.saturating_add(r.chunk_bytes().unwrap_or(u64::MAX)),
                )
            })
    }

    pub fn write_to<W: Write>(&self, w: W) -> Result<()> {
        let mut w = BinWriter::new(w);
        let s = &self.summary;
        w.write_str(MAGIC)?;
        w.write_u64(self.header.capacity)?;
        w.write_str(&self.header.prefix)?;
        w.write_u64(s.dir_count)?;
        w.write_u64(s.file_count)?;
        w.write_u64(s.total_chunk_count)?;
        w.write_u64(s.max_file_chunk_count)?;
        w.write_u64(s.last_container_index)?;
        w.write_str(&s.largest.path)?;
        w.write_str(&s.largest.perms)?;
        w.write_u64(s.largest.size)?;
        w.write_u64(s.largest.chunk_count)?;
        w.write_u64(s.symlink_count)?;

        for d in self.dirs() {
            w.write_str(&d.path)?;
            w.write_str(&d.perms)?;
            w.write_u64(d.mtime)?;
        }
        for f in self.files() {
            w.write_str(&f.path)?;
            w.write_str(&f.perms)?;
            w.write_u64(f.mtime)?;
            w.write_u64(f.size)?;
            w.write_u64(f.chunks.len() as u64)?;
            for c in &f.chunks {
                w.write_u64(c.container)?;
                w.write_u64(c.offset)?;
                w.write_u64(c.length)?;
            }
        }
        for l in self.symlinks() {
            w.write_str(&l.path)?;
            w.write_str(&l.target)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: R) -> Result<Self> {
        let mut r = BinReader::new(r);
        let magic = r.read_str()?;
        if magic != MAGIC {
            return Err(SplitError::BadMagic(magic));
        }
        let header = Header {
            capacity: r.read_u64()?,
            prefix: r.read_str()?,
        };
        if header.prefix.contains(['/', '\\']) {
            return Err(SplitError::Format(format!(
                "container prefix {:?} is not a plain file name",
                header.prefix
            )));
        }
        let dir_count = r.read_u64()?;
        let file_count = r.read_u64()?;
        let total_chunk_count = r.read_u64()?;
        let max_file_chunk_count = r.read_u64()?;
        let last_container_index = r.read_u64()?;
        let largest = LargestFile {
            path: r.read_str()?,
            perms: r.read_str()?,
            size: r.read_u64()?,
            chunk_count: r.read_u64()?,
        };
        let symlink_count = r.read_u64()?;

        let mut entries = Vec::new();
        for _ in 0..dir_count {
            entries.push(Entry::Directory(DirRecord {
                path: r.read_str()?,
                perms: r.read_str()?,
                mtime: r.read_u64()?,
            }));
        }
        let mut seen_chunks = 0u64;
        let mut seen_bytes = 0u64;
        for _ in 0..file_count {
            let path = r.read_str()?;
            let perms = r.read_str()?;
            let mtime = r.read_u64()?;
            let size = r.read_u64()?;
            let n = r.read_u64()?;
            let mut chunks = Vec::new();
            for _ in 0..n {
                chunks.push(ChunkRecord {
                    container: r.read_u64()?,
                    offset: r.read_u64()?,
                    length: r.read_u64()?,
                });
            }
            seen_chunks += n;
            let file = FileRecord {
                path,
                perms,
                mtime,
                size,
                chunks,
            };
            check_chunks(&file, &header, last_container_index)?;
            seen_bytes = seen_bytes.checked_add(file.size).ok_or_else(|| {
                SplitError::Format("total file size overflows".into())
            })?;
            entries.push(Entry::File(file));
        }
        for _ in 0..symlink_count {
            entries.push(Entry::Symlink(SymlinkRecord {
                path: r.read_str()?,
                target: r.read_str()?,
            }));
        }
        if seen_chunks != total_chunk_count {
            return Err(SplitError::Format(format!(
                "split map lists {seen_chunks} chunks but its summary says {total_chunk_count}"
            )));
        }

        Ok(Self {
            header,
            summary: Summary {
                dir_count,
                file_count,
                total_chunk_count,
                max_file_chunk_count,
                last_container_index,
                largest,
                symlink_count,
            },
            entries,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path)?;
        Self::read_from(BufReader::new(f))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let f = File::create(path)?;
        let mut w = BufWriter::new(f);
        self.write_to(&mut w)?;
        w.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(())
    }
}

fn check_chunks(file: &FileRecord, header: &Header, last_container: u64) -> Result<()> {
    for c in &file.chunks {
        let end = c.offset.checked_add(c.length);
        if end.is_none_or(|end| end > header.capacity) || c.container > last_container {
            return Err(SplitError::Format(format!(
                "chunk {}@{}+{} of {} lies outside the split containers",
                c.container, c.offset, c.length, file.path
            )));
        }
    }
    match file.chunk_bytes() {
        Some(n) if n == file.size => {}
        Some(n) => {
            return Err(SplitError::Format(format!(
                "chunks of {} cover {} bytes, expected {}",
                file.path, n, file.size
            )));
        }
        None => {
            return Err(SplitError::Format(format!(
                "chunk lengths of {} overflow",
                file.path
            )));
        }
    }
    Ok(())
}
