use super::record::Entry;
use crate::meta::perms_to_string;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LargestFile {
    pub path: String,
    pub perms: String,
    pub size: u64,
    pub chunk_count: u64,
}

impl Default for LargestFile {
    fn default() -> Self {
        Self {
            path: String::new(),
            perms: perms_to_string(0),
            size: 0,
            chunk_count: 0,
        }
    }
}

/// Counters stored in the split map between the header and the records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub dir_count: u64,
    pub file_count: u64,
    pub total_chunk_count: u64,
    pub max_file_chunk_count: u64,
    pub last_container_index: u64,
    pub largest: LargestFile,
    pub symlink_count: u64,
}

impl Summary {
    /// Fold one record in discovery order. A file at least as large as the
    /// current maximum replaces it, so the last file of the maximum size wins.
    pub fn observe(&mut self, entry: &Entry) {
        match entry {
            Entry::Directory(_) => self.dir_count += 1,
            Entry::Symlink(_) => self.symlink_count += 1,
            Entry::File(f) => {
                let n = f.chunks.len() as u64;
                self.file_count += 1;
                self.total_chunk_count += n;
                self.max_file_chunk_count = self.max_file_chunk_count.max(n);
                if f.size >= self.largest.size {
                    self.largest = LargestFile {
                        path: f.path.clone(),
                        perms: f.perms.clone(),
                        size: f.size,
                        chunk_count: n,
                    };
                }
            }
        }
    }
}
