use super::containers::{ContainerStore, LocalContainers};
use super::remote::join_remote;
use crate::error::{Result, SplitError};
use crate::index::SplitMap;
use crate::meta::{apply_mode, apply_mtime, perms_from_str};
use crate::naming::{IndexSource, container_file_name};
use crate::net::{DEFAULT_MAX_REDIRECTS, HttpTransport};
use crate::stats::JoinReport;
use crate::util::io::{COPY_BUF_LEN, alloc_buffer, copy_exact};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct JoinOptions {
    /// Must be empty or absent; created when absent.
    pub out_dir: PathBuf,
    pub dry_run: bool,
    /// Delete each container once its last needed chunk is copied, and the
    /// local split map at the end.
    pub remove_containers: bool,
    pub verbose: bool,
    /// Receives fetched copies after a successful remote join without removal.
    pub retain_dir: PathBuf,
    pub max_redirects: u32,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            dry_run: false,
            remove_containers: false,
            verbose: false,
            retain_dir: PathBuf::from("."),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Rebuild the tree described by a local or remote split map.
pub fn join(source: &IndexSource, opts: &JoinOptions) -> Result<JoinReport> {
    match source {
        IndexSource::Local(path) => extract(path, opts),
        IndexSource::Remote(url) => {
            let transport = HttpTransport::new()?;
            join_remote(url, opts, &transport)
        }
    }
}

/// Rebuild from a local split map whose containers sit next to it.
pub fn extract(index: &Path, opts: &JoinOptions) -> Result<JoinReport> {
    let create_out = check_output(&opts.out_dir)?;
    if !index.exists() {
        return Err(SplitError::Precondition(format!(
            "item does not exist: {}",
            index.display()
        )));
    }
    let map = SplitMap::load(index)?;
    let dir = fs::canonicalize(index)?
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            SplitError::Precondition(format!(
                "cannot obtain parent directory of item: {}",
                index.display()
            ))
        })?;

    let mut store = LocalContainers::new(&dir, &map.header.prefix);
    let report = restore(&map, &mut store, opts, create_out)?;

    if opts.remove_containers && !opts.dry_run {
        if let Err(e) = fs::remove_file(index) {
            warn!("failed to remove path: {}: {e}", index.display());
        }
    }
    Ok(report)
}

/// Returns whether the output directory still has to be created.
pub(crate) fn check_output(out: &Path) -> Result<bool> {
    match fs::metadata(out) {
        Ok(md) => {
            if !md.is_dir() {
                return Err(SplitError::Precondition(format!(
                    "cannot output to a non-directory: {}",
                    out.display()
                )));
            }
            if fs::read_dir(out)?.next().is_some() {
                return Err(SplitError::Precondition(format!(
                    "cannot output to a non-empty directory: {}",
                    out.display()
                )));
            }
            Ok(false)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}

/// Output locations and decoded modes, validated before anything is written.
struct Plan {
    dirs: Vec<(PathBuf, u32, u64)>,
    files: Vec<(PathBuf, u32)>,
    links: Vec<PathBuf>,
    /// container -> (file ordinal, chunk ordinal) of its last use
    last_use: HashMap<u64, (usize, usize)>,
}

impl Plan {
    fn new(map: &SplitMap, out: &Path) -> Result<Self> {
        let mut dirs = Vec::new();
        for d in map.dirs() {
            dirs.push((safe_join(out, &d.path)?, perms_from_str(&d.perms)?, d.mtime));
        }
        let mut files = Vec::new();
        let mut last_use = HashMap::new();
        for (fi, f) in map.files().enumerate() {
            files.push((safe_join(out, &f.path)?, perms_from_str(&f.perms)?));
            for (ci, c) in f.chunks.iter().enumerate() {
                last_use.insert(c.container, (fi, ci));
            }
        }
        let links = map
            .symlinks()
            .map(|l| safe_join(out, &l.path))
            .collect::<Result<_>>()?;
        Ok(Self {
            dirs,
            files,
            links,
            last_use,
        })
    }
}

pub(crate) fn restore(
    map: &SplitMap,
    store: &mut dyn ContainerStore,
    opts: &JoinOptions,
    create_out: bool,
) -> Result<JoinReport> {
    let plan = Plan::new(map, &opts.out_dir)?;
    let dry = opts.dry_run;
    let prefix = &map.header.prefix;
    let mut report = JoinReport {
        largest: map.summary.largest.clone(),
        ..Default::default()
    };

    if create_out {
        if dry {
            debug!("mkdir {}", opts.out_dir.display());
        } else {
            fs::create_dir_all(&opts.out_dir)?;
        }
    }

    info!("reading {} directories", map.summary.dir_count);
    for (d, (path, _, _)) in map.dirs().zip(&plan.dirs) {
        if opts.verbose {
            info!("d{} {}", d.perms, d.path);
        }
        if dry {
            debug!("mkdir {}", path.display());
        } else {
            fs::create_dir(path)?;
        }
        report.dirs += 1;
    }

    info!(
        "reading {} files with a total of {} chunks",
        map.summary.file_count, map.summary.total_chunk_count
    );
    let mut buf = if dry {
        Vec::new()
    } else {
        alloc_buffer(COPY_BUF_LEN)?
    };
    let mut current: Option<(u64, File)> = None;
    for (fi, (f, (path, mode))) in map.files().zip(&plan.files).enumerate() {
        if opts.verbose {
            info!(" {} {:>8}   {}", f.perms, f.size, f.path);
        }
        if dry {
            debug!("fopen({}, \"wb\")", path.display());
            for c in &f.chunks {
                debug!(
                    "fread({}, @{}, {})",
                    container_file_name(prefix, c.container),
                    c.offset,
                    c.length
                );
                report.chunks += 1;
                report.chunk_bytes += c.length;
            }
            debug!("chmod {} {}", f.perms, path.display());
        } else {
            let mut dst = File::create(path)?;
            for (ci, c) in f.chunks.iter().enumerate() {
                let src = match current {
                    Some((n, ref mut file)) if n == c.container => file,
                    _ => {
                        // Close the previous container before opening the next.
                        current = None;
                        let p = store.acquire(c.container)?;
                        &mut current.insert((c.container, open_container(&p)?)).1
                    }
                };
                src.seek(SeekFrom::Start(c.offset))?;
                copy_exact(src, &mut dst, c.length, &mut buf)?;
                report.chunks += 1;
                report.chunk_bytes += c.length;
                if plan.last_use.get(&c.container) == Some(&(fi, ci)) {
                    current = None;
                    if store.retire(c.container, opts.remove_containers) {
                        report.containers_removed += 1;
                    }
                }
            }
            dst.flush()?;
            drop(dst);
            apply_mtime(path, f.mtime)?;
            apply_mode(path, *mode)?;
        }
        report.files += 1;
        report.file_bytes += f.size;
    }
    drop(current);

    if !dry {
        for n in 0..=map.summary.last_container_index {
            if !plan.last_use.contains_key(&n) && store.retire(n, opts.remove_containers) {
                report.containers_removed += 1;
            }
        }
    }

    info!("reading {} symlinks", map.summary.symlink_count);
    for (l, path) in map.symlinks().zip(&plan.links) {
        if opts.verbose {
            info!(" {} -> {}", l.path, l.target);
        }
        if dry {
            debug!("ln -s {} {}", l.target, path.display());
        } else {
            create_symlink(&l.target, path)?;
        }
        report.symlinks += 1;
    }

    // Deepest first, once nothing else will be written below them.
    for (path, mode, mtime) in plan.dirs.iter().rev() {
        if dry {
            debug!("chmod {:o} {}", mode, path.display());
        } else {
            apply_mtime(path, *mtime)?;
            apply_mode(path, *mode)?;
        }
    }

    Ok(report)
}

fn open_container(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("failed to open file: {}: {e}", path.display()),
        )
        .into()
    })
}

#[cfg(unix)]
fn create_symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &str, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Joins a recorded relative path under `root`, refusing anything that could escape it.
fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    if rel.is_empty() || !p.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(SplitError::Format(format!("unsafe path: {rel:?}")));
    }
    Ok(root.join(p))
}
