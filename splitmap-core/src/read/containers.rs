use crate::error::Result;
use crate::naming::container_file_name;
use crate::net::{Transport, fetch_to_file};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// Where the reconstructor finds split container `n` on local disk.
pub trait ContainerStore {
    /// Local path of container `n`, staging it first if needed.
    fn acquire(&mut self, n: u64) -> Result<PathBuf>;

    /// Container `n` holds no further needed chunks. With `remove` the
    /// container is deleted; returns whether a file was removed.
    fn retire(&mut self, n: u64, remove: bool) -> bool;
}

/// Containers sitting next to a local split map.
pub struct LocalContainers {
    dir: PathBuf,
    prefix: String,
}

impl LocalContainers {
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }
    }
}

impl ContainerStore for LocalContainers {
    fn acquire(&mut self, n: u64) -> Result<PathBuf> {
        Ok(self.dir.join(container_file_name(&self.prefix, n)))
    }

    fn retire(&mut self, n: u64, remove: bool) -> bool {
        if !remove {
            return false;
        }
        remove_quietly(&self.dir.join(container_file_name(&self.prefix, n)))
    }
}

/// Containers fetched one by one next to a remote split map and staged in a
/// local directory.
pub struct RemoteContainers<'a> {
    transport: &'a dyn Transport,
    base: Url,
    prefix: String,
    staging: PathBuf,
    max_redirects: u32,
    staged: BTreeMap<u64, PathBuf>,
}

impl<'a> RemoteContainers<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        index_url: &Url,
        prefix: &str,
        staging: &Path,
        max_redirects: u32,
    ) -> Self {
        Self {
            transport,
            base: index_url.clone(),
            prefix: prefix.to_string(),
            staging: staging.to_path_buf(),
            max_redirects,
            staged: BTreeMap::new(),
        }
    }

    /// Staged copies still on disk, in container order.
    pub fn staged(&self) -> impl Iterator<Item = &Path> + '_ {
        self.staged.values().map(PathBuf::as_path)
    }
}

impl ContainerStore for RemoteContainers<'_> {
    fn acquire(&mut self, n: u64) -> Result<PathBuf> {
        if let Some(p) = self.staged.get(&n) {
            return Ok(p.clone());
        }
        let name = container_file_name(&self.prefix, n);
        // Replaces the split map's file name against the same base URL.
        let url = self.base.join(&name)?;
        let dest = self.staging.join(&name);
        debug!("fetching {url} -> {}", dest.display());
        fetch_to_file(self.transport, &url, &dest, self.max_redirects)?;
        self.staged.insert(n, dest.clone());
        Ok(dest)
    }

    fn retire(&mut self, n: u64, remove: bool) -> bool {
        if !remove {
            return false;
        }
        match self.staged.remove(&n) {
            Some(p) => remove_quietly(&p),
            None => false,
        }
    }
}

/// Deletion failures are logged; a container that is already gone is not one.
fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("rm -f {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!("failed to remove path: {}: {e}", path.display());
            false
        }
    }
}
