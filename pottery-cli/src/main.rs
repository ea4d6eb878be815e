//! Pottery CLI - Command-line interface
//!
//! Resolves JVM project dependencies into the local cache and manages the
//! cache and configuration file.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;
use pottery::logging::{init_logging, LoggingOptions};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::resolve::ResolveArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "pottery", version, about = "Dependency resolution for JVM projects")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve dependencies and download them into the cache
    Resolve(ResolveArgs),

    /// Manage the local artifact cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut options = LoggingOptions::default().verbose(cli.verbose);
    if let Some(path) = &cli.log_file {
        options = options.with_log_file(path);
    }

    let guard = match init_logging(options) {
        Ok(guard) => guard,
        Err(e) => {
            report(&CliError::from(e));
            None
        }
    };

    let result = match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args),
        Commands::Cache { action } => commands::cache::run(action),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        report(&e);
        // process::exit skips destructors; flush the log file first.
        drop(guard);
        process::exit(1);
    }
}

fn report(error: &CliError) {
    eprintln!("{} {}", style("error:").red().bold(), error);
}
