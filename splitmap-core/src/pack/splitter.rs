//! Distributes file bytes across fixed-capacity split containers.
//!
//! Exactly one container is open for writing at a time. A container is
//! closed only when it is full (or at the end of the run) and is never
//! reopened, so consecutive files share containers back to back.

use crate::error::Result;
use crate::index::ChunkRecord;
use crate::naming::{DEFAULT_CAPACITY, container_file_name};
use crate::util::io::{COPY_BUF_LEN, alloc_buffer, copy_exact};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Splitter {
    dir: PathBuf,
    prefix: String,
    capacity: u64,
    dry_run: bool,
    current: u64,
    offset: u64,
    opened_any: bool,
    open: bool,
    out: Option<File>,
    buf: Vec<u8>,
}

impl Splitter {
    /// `capacity == 0` selects [`DEFAULT_CAPACITY`].
    pub fn new(dir: &Path, prefix: &str, capacity: u64, dry_run: bool) -> Result<Self> {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        let buf = if dry_run {
            Vec::new()
        } else {
            alloc_buffer(COPY_BUF_LEN.min(capacity as usize))?
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            capacity,
            dry_run,
            current: 0,
            offset: 0,
            opened_any: false,
            open: false,
            out: None,
            buf,
        })
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Index of the most recently opened container (0 before any).
    pub fn last_container_index(&self) -> u64 {
        self.current
    }

    pub fn container_path(&self, n: u64) -> PathBuf {
        self.dir.join(container_file_name(&self.prefix, n))
    }

    fn open(&mut self) -> Result<()> {
        if self.open {
            return Ok(());
        }
        if self.opened_any {
            self.current += 1;
        } else {
            self.opened_any = true;
        }
        let path = self.container_path(self.current);
        if self.dry_run {
            debug!("open {}", path.display());
        } else {
            debug!(container = self.current, "creating {}", path.display());
            self.out = Some(File::create(&path)?);
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        if let Some(mut f) = self.out.take() {
            f.flush()?;
        }
        debug!("close {}", self.container_path(self.current).display());
        self.open = false;
        Ok(())
    }

    /// Chunk the file at `path`. The file is not opened in dry-run mode.
    pub fn split_path(&mut self, path: &Path, size: u64) -> Result<Vec<ChunkRecord>> {
        if self.dry_run {
            return self.split(None, size);
        }
        let mut src = File::open(path)?;
        self.split(Some(&mut src), size)
    }

    pub fn split_reader(&mut self, src: &mut dyn Read, size: u64) -> Result<Vec<ChunkRecord>> {
        self.split(Some(src), size)
    }

    fn split(&mut self, mut src: Option<&mut dyn Read>, size: u64) -> Result<Vec<ChunkRecord>> {
        // Even an empty file makes sure a container exists.
        self.open()?;
        let mut chunks = Vec::new();
        let mut left = size;
        while left > 0 {
            let mut avail = self.capacity - self.offset;
            if avail == 0 {
                self.close()?;
                self.open()?;
                self.offset = 0;
                avail = self.capacity;
            }
            let take = left.min(avail);
            if let (Some(src), Some(out)) = (src.as_deref_mut(), self.out.as_mut()) {
                copy_exact(src, out, take, &mut self.buf)?;
            } else {
                debug!(
                    "write {take} bytes to {} ({} bytes left)",
                    self.container_path(self.current).display(),
                    left - take
                );
            }
            chunks.push(ChunkRecord {
                container: self.current,
                offset: self.offset,
                length: take,
            });
            self.offset += take;
            left -= take;
        }
        Ok(chunks)
    }

    /// Close the open container; returns the last container index used.
    pub fn finish(mut self) -> Result<u64> {
        self.close()?;
        Ok(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rec(container: u64, offset: u64, length: u64) -> ChunkRecord {
        ChunkRecord {
            container,
            offset,
            length,
        }
    }

    #[test]
    fn file_larger_than_capacity_spans_containers() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = Splitter::new(tmp.path(), "", 10, false).unwrap();
        let data: Vec<u8> = (0..25u8).collect();
        let chunks = s.split_reader(&mut &data[..], 25).unwrap();
        assert_eq!(chunks, [rec(0, 0, 10), rec(1, 0, 10), rec(2, 0, 5)]);
        assert_eq!(s.finish().unwrap(), 2);

        assert_eq!(fs::read(tmp.path().join("split.0")).unwrap(), &data[..10]);
        assert_eq!(fs::read(tmp.path().join("split.1")).unwrap(), &data[10..20]);
        assert_eq!(fs::read(tmp.path().join("split.2")).unwrap(), &data[20..]);
    }

    #[test]
    fn exact_multiple_ends_on_boundary_and_next_file_moves_on() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = Splitter::new(tmp.path(), "p.", 10, false).unwrap();
        let a = [1u8; 20];
        let b = [2u8; 3];
        let ca = s.split_reader(&mut &a[..], 20).unwrap();
        assert_eq!(ca, [rec(0, 0, 10), rec(1, 0, 10)]);
        let cb = s.split_reader(&mut &b[..], 3).unwrap();
        assert_eq!(cb, [rec(2, 0, 3)]);
        s.finish().unwrap();
        assert!(tmp.path().join("p.split.2").exists());
    }

    #[test]
    fn small_files_share_a_container() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = Splitter::new(tmp.path(), "", 10, false).unwrap();
        let c1 = s.split_reader(&mut &b"abcd"[..], 4).unwrap();
        let c2 = s.split_reader(&mut &b"efghij"[..], 6).unwrap();
        let c3 = s.split_reader(&mut &b"k"[..], 1).unwrap();
        assert_eq!(c1, [rec(0, 0, 4)]);
        assert_eq!(c2, [rec(0, 4, 6)]);
        assert_eq!(c3, [rec(1, 0, 1)]);
        s.finish().unwrap();
        assert_eq!(fs::read(tmp.path().join("split.0")).unwrap(), b"abcdefghij");
    }

    #[test]
    fn empty_file_has_no_chunks_but_a_container() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = Splitter::new(tmp.path(), "", 10, false).unwrap();
        assert!(s.split_reader(&mut &b""[..], 0).unwrap().is_empty());
        assert_eq!(s.finish().unwrap(), 0);
        assert_eq!(fs::metadata(tmp.path().join("split.0")).unwrap().len(), 0);
    }

    #[test]
    fn dry_run_plans_without_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.bin");
        fs::write(&src, [9u8; 25]).unwrap();
        let mut s = Splitter::new(tmp.path(), "", 10, true).unwrap();
        let chunks = s.split_path(&src, 25).unwrap();
        assert_eq!(chunks, [rec(0, 0, 10), rec(1, 0, 10), rec(2, 0, 5)]);
        s.finish().unwrap();
        assert!(!tmp.path().join("split.0").exists());
    }

    #[test]
    fn zero_capacity_means_default() {
        let tmp = tempfile::tempdir().unwrap();
        let s = Splitter::new(tmp.path(), "", 0, true).unwrap();
        assert_eq!(s.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn truncated_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut s = Splitter::new(tmp.path(), "", 10, false).unwrap();
        assert!(s.split_reader(&mut &b"abc"[..], 5).is_err());
    }
}
