use clap::{Parser, Subcommand};
use splitmap_core::IndexSource;
use splitmap_core::net::DEFAULT_MAX_REDIRECTS;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "splitmap: archive a tree into fixed-size split files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Archive a file or directory tree into a split map plus split containers
    Split {
        source: PathBuf,

        /// Log what would be done; write and remove nothing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Remove each archived item once recorded
        #[arg(short = 'r', long)]
        remove: bool,

        /// List every recorded item
        #[arg(short, long)]
        verbose: bool,

        /// Container capacity in bytes (0 selects 4 MiB)
        #[arg(short = 's', long, default_value_t = 0)]
        size: u64,

        /// Name shared by the split map and its containers (`NAME.split.map`)
        #[arg(long, default_value = "")]
        name: String,

        /// Directory receiving the split map and containers
        #[arg(short = 'C', long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Rebuild a tree from a local split map or an http(s) URL
    Join {
        #[arg(value_parser = parse_source)]
        source: IndexSource,

        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Delete each container after its last use, and the local split map at the end
        #[arg(short = 'r', long)]
        remove: bool,

        #[arg(short, long)]
        verbose: bool,

        /// Output directory; must be empty or absent
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Where fetched copies are kept after a remote join without --remove
        #[arg(long, default_value = ".")]
        keep_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
        max_redirects: u32,
    },

    /// Print the contents of a split map
    Ls {
        #[arg(value_parser = parse_source)]
        source: IndexSource,

        /// Show every chunk location
        #[arg(long)]
        chunks: bool,

        /// Emit the decoded split map as JSON
        #[arg(long)]
        json: bool,

        #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS)]
        max_redirects: u32,
    },
}

fn parse_source(s: &str) -> Result<IndexSource, String> {
    IndexSource::parse(s).map_err(|e| e.to_string())
}
