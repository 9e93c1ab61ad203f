use clap::Parser;
use tracing_subscriber::EnvFilter;

use snipbox::cli::{Cli, Command, run_config_command, run_snippet_command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Run(args) => run_snippet_command(args).await,
        Command::Config(cmd) => run_config_command(cmd),
    }
}

/// Logs go to stderr so stdout carries only the result.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("snipbox=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
