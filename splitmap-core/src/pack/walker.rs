//! Pre-order traversal of the archive source, never following symlinks.
//!
//! Paths are recorded relative to a trim prefix: the root itself when the
//! root is a directory, or the root's parent when the root is a file or a
//! symlink (so a single record with the bare file name is produced).

use crate::error::{Result, SplitError};
use crate::index::EntryKind;
use std::fs::{self, Metadata};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug)]
pub struct WalkItem {
    pub path: PathBuf,
    /// `/`-separated path below the trim prefix. Lossy for unsupported names.
    pub rel: String,
    /// `None` for devices, sockets, fifos and names that are not UTF-8.
    pub kind: Option<EntryKind>,
    pub metadata: Metadata,
}

enum Inner {
    Single(Option<(PathBuf, Metadata)>),
    Tree(walkdir::IntoIter),
}

pub struct Walk {
    trim: PathBuf,
    root_is_dir: bool,
    inner: Inner,
}

pub fn walk(root: &Path) -> Result<Walk> {
    let md = match fs::symlink_metadata(root) {
        Ok(md) => md,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SplitError::Precondition(format!(
                "item does not exist: {}",
                root.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let ft = md.file_type();
    if ft.is_dir() {
        let it = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Ok(Walk {
            trim: root.to_path_buf(),
            root_is_dir: true,
            inner: Inner::Tree(it),
        })
    } else if ft.is_file() || ft.is_symlink() {
        let trim = root.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Walk {
            trim,
            root_is_dir: false,
            inner: Inner::Single(Some((root.to_path_buf(), md))),
        })
    } else {
        Err(SplitError::Precondition(format!(
            "unsupported type: {}",
            root.display()
        )))
    }
}

impl Walk {
    pub fn trim(&self) -> &Path {
        &self.trim
    }

    pub fn root_is_dir(&self) -> bool {
        self.root_is_dir
    }

    fn item(&self, path: PathBuf, metadata: Metadata) -> WalkItem {
        let ft = metadata.file_type();
        let kind = if ft.is_dir() {
            Some(EntryKind::Directory)
        } else if ft.is_file() {
            Some(EntryKind::File)
        } else if ft.is_symlink() {
            Some(EntryKind::Symlink)
        } else {
            None
        };
        match relative_path(&self.trim, &path) {
            Some(rel) => WalkItem {
                path,
                rel,
                kind,
                metadata,
            },
            None => WalkItem {
                rel: lossy_relative(&self.trim, &path),
                path,
                kind: None,
                metadata,
            },
        }
    }
}

impl Iterator for Walk {
    type Item = Result<WalkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let (path, md) = match &mut self.inner {
            Inner::Single(slot) => slot.take()?,
            Inner::Tree(it) => {
                let entry = match it.next()? {
                    Ok(e) => e,
                    Err(e) => return Some(Err(std::io::Error::from(e).into())),
                };
                match entry.metadata() {
                    Ok(md) => (entry.into_path(), md),
                    Err(e) => return Some(Err(std::io::Error::from(e).into())),
                }
            }
        };
        Some(Ok(self.item(path, md)))
    }
}

/// `/`-joined components of `path` below `trim`; `None` if any component is
/// not a plain UTF-8 name. The trim prefix itself maps to the empty string.
pub fn relative_path(trim: &Path, path: &Path) -> Option<String> {
    let rest = path.strip_prefix(trim).ok()?;
    let mut parts = Vec::new();
    for c in rest.components() {
        match c {
            Component::Normal(name) => parts.push(name.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

fn lossy_relative(trim: &Path, path: &Path) -> String {
    path.strip_prefix(trim)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
