use super::containers::RemoteContainers;
use super::extract::{JoinOptions, check_output, restore};
use crate::error::{Result, SplitError};
use crate::index::SplitMap;
use crate::net::{Transport, fetch_to_file};
use crate::stats::JoinReport;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};
use url::Url;

/// Rebuild from a split map served over HTTP(S). Containers are fetched
/// lazily, next to the map's URL, into a private staging directory.
pub fn join_remote(
    url: &Url,
    opts: &JoinOptions,
    transport: &dyn Transport,
) -> Result<JoinReport> {
    let create_out = check_output(&opts.out_dir)?;
    let (staging, index_path, map) = fetch_index(url, transport, opts.max_redirects)?;

    let mut store = RemoteContainers::new(
        transport,
        url,
        &map.header.prefix,
        staging.path(),
        opts.max_redirects,
    );
    let mut report = restore(&map, &mut store, opts, create_out)?;

    if !opts.dry_run && !opts.remove_containers {
        let mut keep = vec![index_path];
        keep.extend(store.staged().map(Path::to_path_buf));
        report.retained = retain(&keep, &opts.retain_dir);
    }
    // `staging` drops here and takes anything not retained with it.
    Ok(report)
}

/// Download and parse the split map at `url` into a fresh staging directory.
pub(crate) fn fetch_index(
    url: &Url,
    transport: &dyn Transport,
    max_redirects: u32,
) -> Result<(TempDir, PathBuf, SplitMap)> {
    let name = remote_file_name(url)?;
    let staging = tempfile::Builder::new().prefix("splitmap-").tempdir()?;
    let index_path = staging.path().join(name);
    info!("fetching {url}");
    fetch_to_file(transport, url, &index_path, max_redirects)?;
    let map = SplitMap::load(&index_path)?;
    Ok((staging, index_path, map))
}

fn remote_file_name(url: &Url) -> Result<&str> {
    url.path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .ok_or_else(|| SplitError::Precondition(format!("url names no file: {url}")))
}

/// Copy staged files into `dir`. An existing destination is never replaced:
/// that copy is skipped with a warning and goes away with the staging directory.
fn retain(paths: &[PathBuf], dir: &Path) -> Vec<PathBuf> {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!("failed to create directory: {}: {e}", dir.display());
        return Vec::new();
    }
    let mut kept = Vec::new();
    for src in paths {
        let Some(name) = src.file_name() else { continue };
        let dest = dir.join(name);
        match keep_copy(src, &dest) {
            Ok(()) => kept.push(dest),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!("not overwriting existing path: {}", dest.display());
            }
            Err(e) => warn!("failed to keep {}: {e}", dest.display()),
        }
    }
    kept
}

fn keep_copy(src: &Path, dest: &Path) -> io::Result<()> {
    let mut from = File::open(src)?;
    let mut to = OpenOptions::new().write(true).create_new(true).open(dest)?;
    let res = io::copy(&mut from, &mut to).and_then(|_| to.sync_all());
    if res.is_err() {
        drop(to);
        let _ = fs::remove_file(dest);
    }
    res
}
