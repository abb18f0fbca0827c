use crate::index::{LargestFile, SplitMap};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Serialize)]
pub struct PackReport {
    pub index_path: PathBuf,
    pub capacity: u64,
    pub dirs: u64,
    pub files: u64,
    pub symlinks: u64,
    pub unknowns: u64,
    pub chunks: u64,
    pub max_file_chunks: u64,
    pub last_container_index: u64,
    pub file_bytes: u64,
    pub chunk_bytes: u64,
    pub largest: LargestFile,
}

impl PackReport {
    pub fn from_map(map: &SplitMap, index_path: PathBuf, unknowns: u64) -> Self {
        let s = &map.summary;
        let (file_bytes, chunk_bytes) = map.byte_totals();
        Self {
            index_path,
            capacity: map.header.capacity,
            dirs: s.dir_count,
            files: s.file_count,
            symlinks: s.symlink_count,
            unknowns,
            chunks: s.total_chunk_count,
            max_file_chunks: s.max_file_chunk_count,
            last_container_index: s.last_container_index,
            file_bytes,
            chunk_bytes,
            largest: s.largest.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct JoinReport {
    pub dirs: u64,
    pub files: u64,
    pub symlinks: u64,
    pub chunks: u64,
    pub file_bytes: u64,
    pub chunk_bytes: u64,
    pub containers_removed: u64,
    pub largest: LargestFile,
    /// Fetched copies kept after a remote join without removal.
    pub retained: Vec<PathBuf>,
}
