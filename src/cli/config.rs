//! Configuration CLI commands.
//!
//! Settings come from the environment (and `.env`), so these commands only
//! show the effective values.

use clap::Subcommand;

use crate::config::Config;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// List all settings and their effective values
    List {
        /// Show only settings whose variable contains this text (e.g., "timeout")
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Get a specific setting value
    Get {
        /// Variable name (e.g., "SNIPBOX_TIMEOUT_MS")
        key: String,
    },
}

/// Run a config command.
pub fn run_config_command(cmd: ConfigCommand) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    match cmd {
        ConfigCommand::List { filter } => {
            for line in list_lines(&config, filter.as_deref()) {
                println!("{}", line);
            }
            Ok(())
        }
        ConfigCommand::Get { key } => match config.get(&key) {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => anyhow::bail!("Setting not found: {}", key),
        },
    }
}

/// Aligned `KEY  value` lines, optionally filtered.
fn list_lines(config: &Config, filter: Option<&str>) -> Vec<String> {
    let all = config.list();
    let max_key_len = all.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let filter = filter.map(|f| f.to_lowercase());

    all.into_iter()
        .filter(|(key, _)| match &filter {
            Some(f) => key.to_lowercase().contains(f.as_str()),
            None => true,
        })
        .map(|(key, value)| format!("{:width$}  {}", key, value, width = max_key_len))
        .collect()
}
