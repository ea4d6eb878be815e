//! Resolve command - download a project's dependencies into the cache.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pottery::config::{format_size, ConfigFile};
use pottery::coordinate::DirectDependency;
use pottery::resolver::{DependencyResolver, Resolution, ResolverConfig};

use crate::error::CliError;

/// Arguments for `pottery resolve`.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Production dependencies as group:artifact[:version]
    #[arg(value_name = "DEP")]
    pub dependencies: Vec<String>,

    /// Test dependency as group:artifact[:version] (repeatable)
    #[arg(long = "test", value_name = "DEP")]
    pub test_dependencies: Vec<String>,

    /// Fetch test dependencies as well
    #[arg(long)]
    pub with_tests: bool,

    /// Number of concurrent resolution workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Remote repository base URL
    #[arg(long, value_name = "URL")]
    pub repository: Option<String>,

    /// Local cache directory
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let resolver_config = resolver_config(&args, &config);
    let dependencies = direct_dependencies(&args)?;

    let resolver = DependencyResolver::with_reqwest(resolver_config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Resolving {} dependencies", dependencies.len()));

    let result = resolver.resolve(&dependencies);
    spinner.finish_and_clear();
    let resolution = result?;

    if args.json {
        let json = serde_json::to_string_pretty(&resolution)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
    } else {
        print_resolution(&resolution);
    }

    Ok(())
}

/// CLI arguments take precedence over the config file.
fn resolver_config(args: &ResolveArgs, config: &ConfigFile) -> ResolverConfig {
    let mut resolved = config.to_resolver_config();

    if let Some(url) = &args.repository {
        resolved = resolved.with_repository(url.clone());
    }
    if let Some(dir) = &args.cache_dir {
        resolved.cache_dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        resolved = resolved.with_workers(workers);
    }

    resolved.with_test_dependencies(args.with_tests)
}

fn direct_dependencies(args: &ResolveArgs) -> Result<Vec<DirectDependency>, CliError> {
    let production = args.dependencies.iter().map(DirectDependency::production);
    let test = args.test_dependencies.iter().map(DirectDependency::test);

    production
        .chain(test)
        .map(|dependency| match dependency.to_coordinate() {
            Ok(_) => Ok(dependency),
            Err(_) => Err(CliError::InvalidDependency(dependency.qualified_name)),
        })
        .collect()
}

fn print_resolution(resolution: &Resolution) {
    for artifact in &resolution.artifacts {
        println!(
            "{} {}",
            style(&artifact.coordinate).green(),
            artifact.path.display()
        );
    }

    let stats = &resolution.stats;
    println!();
    println!(
        "{} artifacts ({} downloaded, {} cached, {})",
        style(resolution.artifacts.len()).bold(),
        stats.artifacts_downloaded,
        stats.artifacts_cached,
        format_size(stats.bytes_downloaded)
    );
    if stats.failures > 0 {
        println!(
            "{} {} dependencies could not be fetched, see log for details",
            style("warning:").yellow().bold(),
            stats.failures
        );
    }
}
