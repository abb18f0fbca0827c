use std::io::{self, Write};
use std::path::PathBuf;

use splitmap_core::list::{ListOptions, list, load_map};
use splitmap_core::naming::prefix_from_name;
use splitmap_core::{IndexSource, JoinOptions, Result, SplitOptions, join, pack};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise dry runs show every planned action and
/// verbose runs show every item.
fn init_logging(dry_run: bool, verbose: bool) {
    let default = if dry_run {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn handle_split(
    source: PathBuf,
    dry_run: bool,
    remove: bool,
    verbose: bool,
    size: u64,
    name: String,
    out_dir: PathBuf,
) -> Result<()> {
    init_logging(dry_run, verbose);
    let opts = SplitOptions {
        capacity: size,
        prefix: prefix_from_name(&name),
        dry_run,
        remove_source: remove,
        verbose,
        work_dir: out_dir,
    };
    let r = pack(&source, &opts)?;
    eprintln!(
        "split: {} dirs, {} files, {} symlinks, {} unknown -> {} ({} chunks in {} containers of {} bytes)",
        r.dirs,
        r.files,
        r.symlinks,
        r.unknowns,
        r.index_path.display(),
        r.chunks,
        if r.files == 0 { 0 } else { r.last_container_index + 1 },
        r.capacity
    );
    eprintln!(
        "split: {} file bytes, {} chunk bytes; largest {} ({} bytes)",
        r.file_bytes, r.chunk_bytes, r.largest.path, r.largest.size
    );
    Ok(())
}

pub fn handle_join(
    source: IndexSource,
    dry_run: bool,
    remove: bool,
    verbose: bool,
    out: PathBuf,
    keep_dir: PathBuf,
    max_redirects: u32,
) -> Result<()> {
    init_logging(dry_run, verbose);
    let opts = JoinOptions {
        out_dir: out,
        dry_run,
        remove_containers: remove,
        verbose,
        retain_dir: keep_dir,
        max_redirects,
    };
    let r = join(&source, &opts)?;
    eprintln!(
        "join: {} dirs, {} files, {} symlinks ({} chunks, {} bytes) into {}",
        r.dirs,
        r.files,
        r.symlinks,
        r.chunks,
        r.chunk_bytes,
        opts.out_dir.display()
    );
    if r.containers_removed > 0 {
        eprintln!("join: removed {} containers", r.containers_removed);
    }
    for p in &r.retained {
        eprintln!("join: kept {}", p.display());
    }
    Ok(())
}

pub fn handle_ls(source: IndexSource, chunks: bool, json: bool, max_redirects: u32) -> Result<()> {
    init_logging(false, false);
    let opts = ListOptions {
        show_chunks: chunks,
        max_redirects,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let map = load_map(&source, opts.max_redirects)?;
        serde_json::to_writer_pretty(&mut out, &map).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        list(&source, &opts, &mut out)?;
    }
    out.flush()?;
    Ok(())
}
