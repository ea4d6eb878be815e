//! `pottery config` - inspect and edit the configuration file.

use clap::Subcommand;
use console::style;
use pottery::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name as section.key, e.g. resolver.workers
        key: String,
    },

    /// Change one setting and save the file
    Set {
        /// Setting name as section.key, e.g. repository.url
        key: String,
        value: String,
    },

    /// Print every setting grouped by section
    List,

    /// Print where the configuration file lives
    Path,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            println!("{}", key.get(&ConfigFile::load()?));
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = ConfigFile::load()?;
            key.set(&mut config, &value)?;
            config.save()?;
            println!("{} = {}", key, key.get(&config));
        }
        ConfigCommands::List => print_settings(&ConfigFile::load()?),
        ConfigCommands::Path => println!("{}", config_file_path().display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        let known: Vec<String> = ConfigKey::all().iter().map(ConfigKey::name).collect();
        CliError::Config(format!(
            "unknown setting '{}' (known: {})",
            key,
            known.join(", ")
        ))
    })
}

fn print_settings(config: &ConfigFile) {
    let mut section = None;

    for key in ConfigKey::all() {
        if section != Some(key.section()) {
            if section.is_some() {
                println!();
            }
            println!("{}", style(format!("[{}]", key.section())).bold());
            section = Some(key.section());
        }
        println!("{:<10} = {}", key.key_name(), key.get(config));
    }
}
