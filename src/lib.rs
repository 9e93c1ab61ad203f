//! Snipbox runs JavaScript and TypeScript snippets posted in chat messages.
//!
//! A message goes through three steps:
//!
//! 1. [`extract`] finds the fenced `js`/`ts` block and its language
//! 2. [`sandbox::SandboxRunner`] executes it in a fresh interpreter process
//!    under a wall-clock budget, killing the process if the budget runs out
//! 3. [`present::ResultPresenter`] turns the [`sandbox::RunResult`] into a
//!    chat message
//!
//! [`pipeline::run_message`] chains the three for hosts that only deal in
//! message text. The `snipbox` binary wraps it in a small CLI ([`cli`]).

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod present;
pub mod safety;
pub mod sandbox;

pub use config::Config;
pub use error::{ConfigError, ExtractError};
pub use extract::{CodeBlock, Language};
pub use present::{MessageLink, Presentation, ResultPresenter};
pub use sandbox::{ExitStatus, RunRequest, RunResult, SandboxConfig, SandboxRunner};
