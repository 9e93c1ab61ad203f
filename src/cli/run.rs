//! `snipbox run`: execute one snippet and print the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use tokio::io::AsyncReadExt;

use crate::config::Config;
use crate::extract::Language;
use crate::pipeline;
use crate::present::{MessageLink, ResultPresenter};
use crate::sandbox::{RunRequest, SandboxRunner};

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Read the message from this file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Treat the input as raw source in this language instead of a message
    #[arg(short, long)]
    pub lang: Option<Language>,

    /// Allow import statements in the snippet
    #[arg(long)]
    pub allow_imports: bool,

    /// Wall-clock budget for this run, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Link the result to its source message (<guild|@me>/<channel>/<message>)
    #[arg(long)]
    pub message: Option<MessageLink>,

    /// Print the raw result as JSON instead of the chat rendering
    #[arg(long)]
    pub json: bool,
}

/// Run a snippet command.
pub async fn run_snippet_command(args: RunArgs) -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let input = read_input(args.file.as_deref()).await?;
    let output = execute(&args, config, &input).await?;
    println!("{}", output);
    Ok(())
}

/// Run `input` according to `args` and return the text to print.
async fn execute(args: &RunArgs, mut config: Config, input: &str) -> anyhow::Result<String> {
    if let Some(ms) = args.timeout_ms {
        anyhow::ensure!(ms > 0, "--timeout-ms must be greater than zero");
        config.sandbox.timeout = Duration::from_millis(ms);
    }
    let allow_imports = args.allow_imports || config.allow_imports;

    let runner = SandboxRunner::new(config.sandbox);
    let presenter = ResultPresenter::new(config.max_message_len);
    let link = args.message.as_ref();

    let (result, presentation) = match args.lang {
        Some(language) => {
            let request = RunRequest::new(language, input).allow_imports(allow_imports);
            let result = runner.run(&request).await;
            let presentation = presenter.format(&result, link, Utc::now());
            (result, presentation)
        }
        None => {
            let run = pipeline::run_message(&runner, &presenter, input, link, allow_imports).await?;
            (run.result, run.presentation)
        }
    };

    if args.json {
        Ok(serde_json::to_string_pretty(&result)?)
    } else {
        Ok(presentation.content)
    }
}

async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}
