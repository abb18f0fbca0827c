use super::splitter::Splitter;
use super::walker::{WalkItem, walk};
use crate::error::{Result, SplitError};
use crate::index::{DirRecord, Entry, EntryKind, FileRecord, SplitMap, SymlinkRecord};
use crate::meta::{mode_of, mtime_ticks, perms_to_string};
use crate::naming::{DEFAULT_CAPACITY, index_file_name};
use crate::stats::PackReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct SplitOptions {
    /// Bytes per split container; 0 selects the 4 MiB default.
    pub capacity: u64,
    /// Prefix shared by the split map and its containers, already dotted (`name.`).
    pub prefix: String,
    /// Build the map in memory only; nothing on disk is created or removed.
    pub dry_run: bool,
    /// Delete each archived item once recorded; directories go last, deepest first.
    pub remove_source: bool,
    pub verbose: bool,
    /// Where the split map and containers are written.
    pub work_dir: PathBuf,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            prefix: String::new(),
            dry_run: false,
            remove_source: false,
            verbose: false,
            work_dir: PathBuf::from("."),
        }
    }
}

/// Archive `source` into `{prefix}split.map` plus `{prefix}split.{n}` containers.
pub fn pack(source: &Path, opts: &SplitOptions) -> Result<PackReport> {
    if opts.remove_source {
        check_removable(source)?;
    }
    let tree = walk(source)?;
    if tree.root_is_dir() && !opts.dry_run {
        check_output_outside(source, &opts.work_dir)?;
    }

    let mut splitter = Splitter::new(&opts.work_dir, &opts.prefix, opts.capacity, opts.dry_run)?;
    let mut map = SplitMap::new(splitter.capacity(), &opts.prefix);
    let mut dir_paths: Vec<(PathBuf, String)> = Vec::new();
    let mut unknowns = 0u64;

    info!("entering directory: {}", tree.trim().display());
    for item in tree {
        let item = item?;
        match item.kind {
            Some(EntryKind::Directory) => {
                let rec = DirRecord {
                    perms: perms_to_string(mode_of(&item.metadata)),
                    mtime: mtime_ticks(&item.metadata),
                    path: item.rel.clone(),
                };
                if opts.verbose {
                    info!("recording directory: d{} {:>8}   {}", rec.perms, 0, rec.path);
                }
                map.push(Entry::Directory(rec));
                dir_paths.push((item.path, item.rel));
            }
            Some(EntryKind::File) => {
                let size = item.metadata.len();
                let chunks = splitter.split_path(&item.path, size)?;
                let rec = FileRecord {
                    path: item.rel.clone(),
                    perms: perms_to_string(mode_of(&item.metadata)),
                    mtime: mtime_ticks(&item.metadata),
                    size,
                    chunks,
                };
                if opts.verbose {
                    info!(
                        "recording file:       {} {:>8}   ({} chunks)   {}",
                        rec.perms,
                        rec.size,
                        rec.chunks.len(),
                        rec.path
                    );
                }
                map.push(Entry::File(rec));
                remove_item(&item, opts);
            }
            Some(EntryKind::Symlink) => {
                let target = fs::read_link(&item.path)?;
                let Some(target) = target.to_str() else {
                    warn!("unknown type: {} (symlink target is not UTF-8)", item.rel);
                    unknowns += 1;
                    continue;
                };
                if opts.verbose {
                    info!("recording symlink:    {} -> {}", item.rel, target);
                }
                map.push(Entry::Symlink(SymlinkRecord {
                    path: item.rel.clone(),
                    target: target.to_string(),
                }));
                remove_item(&item, opts);
            }
            None => {
                warn!("unknown type: {}", item.rel);
                unknowns += 1;
            }
        }
    }

    map.summary.last_container_index = splitter.finish()?;

    let index_path = opts.work_dir.join(index_file_name(&opts.prefix));
    if opts.dry_run {
        debug!("write {}", index_path.display());
    } else {
        map.save(&index_path)?;
    }

    if opts.remove_source {
        for (path, rel) in dir_paths.iter().rev() {
            remove_path(path, rel, true, opts.dry_run);
        }
    }

    Ok(PackReport::from_map(&map, index_path, unknowns))
}

fn remove_item(item: &WalkItem, opts: &SplitOptions) {
    if opts.remove_source {
        remove_path(&item.path, &item.rel, false, opts.dry_run);
    }
}

/// Removal failures are logged and skipped.
fn remove_path(path: &Path, rel: &str, is_dir: bool, dry_run: bool) {
    if dry_run {
        if is_dir {
            debug!("rmdir {rel}");
        } else {
            debug!("rm -f {rel}");
        }
        return;
    }
    let res = if is_dir {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = res {
        warn!("failed to remove path: {rel}: {e}");
    }
}

/// Refuse to remove the working directory or any of its ancestors.
fn check_removable(source: &Path) -> Result<()> {
    if fs::symlink_metadata(source).is_ok_and(|md| md.file_type().is_symlink()) {
        return Ok(());
    }
    let target = match fs::canonicalize(source) {
        Ok(p) => p,
        // The walk reports a missing source.
        Err(_) => return Ok(()),
    };
    let cwd = fs::canonicalize(std::env::current_dir()?)?;
    if cwd == target {
        return Err(SplitError::Precondition(
            "cannot remove the current working directory".into(),
        ));
    }
    if cwd.starts_with(&target) {
        return Err(SplitError::Precondition(
            "cannot remove a parent directory".into(),
        ));
    }
    Ok(())
}

/// The split map and its containers must not land inside the tree being walked.
fn check_output_outside(source: &Path, work_dir: &Path) -> Result<()> {
    let src = fs::canonicalize(source)?;
    let out = fs::canonicalize(work_dir)?;
    if out.starts_with(&src) {
        return Err(SplitError::Precondition(format!(
            "output directory {} lies inside the source {}",
            out.display(),
            src.display()
        )));
    }
    Ok(())
}
