//! Command-line interface.

mod config;
mod run;

use clap::{Parser, Subcommand};

pub use config::{ConfigCommand, run_config_command};
pub use run::{RunArgs, run_snippet_command};

#[derive(Parser, Debug)]
#[command(name = "snipbox", version, about = "Run JS/TS snippets from chat messages")]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SNIPBOX_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a snippet from a message (or raw source) and print the result
    Run(RunArgs),

    /// Inspect effective configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}
