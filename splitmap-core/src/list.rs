use crate::error::{Result, SplitError};
use crate::index::SplitMap;
use crate::meta::format_ticks;
use crate::naming::{IndexSource, container_file_name};
use crate::net::{DEFAULT_MAX_REDIRECTS, HttpTransport, Transport};
use crate::read::remote::fetch_index;
use std::io::Write;
use std::path::Path;
use url::Url;

#[derive(Clone, Debug)]
pub struct ListOptions {
    /// Print every chunk location under its file.
    pub show_chunks: bool,
    pub max_redirects: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            show_chunks: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Print the contents of a split map. Never opens a container.
pub fn list(source: &IndexSource, opts: &ListOptions, out: &mut dyn Write) -> Result<()> {
    let map = load_map(source, opts.max_redirects)?;
    render(&map, opts, out)
}

/// Decode a split map from disk or, for a URL, from a discarded staging copy.
pub fn load_map(source: &IndexSource, max_redirects: u32) -> Result<SplitMap> {
    match source {
        IndexSource::Local(path) => load_local(path),
        IndexSource::Remote(url) => load_remote(url, &HttpTransport::new()?, max_redirects),
    }
}

pub fn load_local(path: &Path) -> Result<SplitMap> {
    if !path.exists() {
        return Err(SplitError::Precondition(format!(
            "item does not exist: {}",
            path.display()
        )));
    }
    SplitMap::load(path)
}

pub fn load_remote(url: &Url, transport: &dyn Transport, max_redirects: u32) -> Result<SplitMap> {
    let (_staging, _, map) = fetch_index(url, transport, max_redirects)?;
    Ok(map)
}

pub fn render(map: &SplitMap, opts: &ListOptions, out: &mut dyn Write) -> Result<()> {
    let s = &map.summary;
    let width = map.header.capacity.to_string().len();

    writeln!(out, "reading {} directories", s.dir_count)?;
    for d in map.dirs() {
        writeln!(out, "d{} {} {}", d.perms, format_ticks(d.mtime), d.path)?;
    }

    writeln!(
        out,
        "reading {} files with a total of {} chunks",
        s.file_count, s.total_chunk_count
    )?;
    for f in map.files() {
        writeln!(
            out,
            " {} {:>8} {} {}",
            f.perms,
            f.size,
            format_ticks(f.mtime),
            f.path
        )?;
        if opts.show_chunks {
            for c in &f.chunks {
                writeln!(
                    out,
                    "   [chunk] {} [{:>w$}-{:>w$}]",
                    container_file_name(&map.header.prefix, c.container),
                    c.offset,
                    c.offset.saturating_add(c.length),
                    w = width
                )?;
            }
        }
    }

    writeln!(out, "reading {} symlinks", s.symlink_count)?;
    for l in map.symlinks() {
        writeln!(out, " {} -> {}", l.path, l.target)?;
    }

    let (file_bytes, chunk_bytes) = map.byte_totals();
    writeln!(out, "total size of {} files:  {} bytes", s.file_count, file_bytes)?;
    writeln!(
        out,
        "total size of {} chunks: {} bytes",
        s.total_chunk_count, chunk_bytes
    )?;
    if s.file_count > 0 {
        writeln!(
            out,
            "largest file: {} {} ({} chunks) {}",
            s.largest.perms, s.largest.size, s.largest.chunk_count, s.largest.path
        )?;
    }
    Ok(())
}
