pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use splitmap_core::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Split {
            source,
            dry_run,
            remove,
            verbose,
            size,
            name,
            out_dir,
        } => handlers::handle_split(source, dry_run, remove, verbose, size, name, out_dir),
        Commands::Join {
            source,
            dry_run,
            remove,
            verbose,
            out,
            keep_dir,
            max_redirects,
        } => handlers::handle_join(
            source,
            dry_run,
            remove,
            verbose,
            out,
            keep_dir,
            max_redirects,
        ),
        Commands::Ls {
            source,
            chunks,
            json,
            max_redirects,
        } => handlers::handle_ls(source, chunks, json, max_redirects),
    }
}
