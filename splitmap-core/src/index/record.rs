use serde::Serialize;

/// One contiguous run of a file's bytes inside a split container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    pub container: u64,
    pub offset: u64,
    pub length: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirRecord {
    pub path: String,
    pub perms: String,
    pub mtime: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: String,
    pub perms: String,
    pub mtime: u64,
    pub size: u64,
    pub chunks: Vec<ChunkRecord>,
}

impl FileRecord {
    /// Sum of chunk lengths; `None` if it does not fit in a `u64`.
    pub fn chunk_bytes(&self) -> Option<u64> {
        self.chunks
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.length))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymlinkRecord {
    pub path: String,
    /// Stored verbatim; never resolved.
    pub target: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    Directory(DirRecord),
    File(FileRecord),
    Symlink(SymlinkRecord),
}

impl Entry {
    pub fn path(&self) -> &str {
        match self {
            Entry::Directory(d) => &d.path,
            Entry::File(f) => &f.path,
            Entry::Symlink(s) => &s.path,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Directory(_) => EntryKind::Directory,
            Entry::File(_) => EntryKind::File,
            Entry::Symlink(_) => EntryKind::Symlink,
        }
    }
}
