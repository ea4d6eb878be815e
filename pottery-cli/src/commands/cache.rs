//! `pottery cache` - inspect or wipe the local artifact cache.

use std::path::PathBuf;

use clap::Subcommand;
use pottery::cache::{cache_stats, clear_cache};
use pottery::config::{format_size, ConfigFile};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Delete every cached metadata document and artifact
    Clear {
        /// Cache directory, defaults to resolver.cache_dir
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
    /// Count cached files and their size
    Stats {
        /// Cache directory, defaults to resolver.cache_dir
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },
}

pub fn run(action: CacheAction) -> Result<(), CliError> {
    let configured = ConfigFile::load()?.resolver.cache_dir;

    match action {
        CacheAction::Clear { cache_dir } => {
            let root = cache_dir.unwrap_or(configured);
            let cleared =
                clear_cache(&root).map_err(|e| CliError::CacheClear(e.to_string()))?;
            println!(
                "Removed {} files ({}) from {}",
                cleared.files_deleted,
                format_size(cleared.bytes_freed),
                root.display()
            );
        }
        CacheAction::Stats { cache_dir } => {
            let root = cache_dir.unwrap_or(configured);
            let (files, bytes) =
                cache_stats(&root).map_err(|e| CliError::CacheStats(e.to_string()))?;
            println!("{}", root.display());
            println!("  files: {}", files);
            println!("  size:  {}", format_size(bytes));
        }
    }
    Ok(())
}
