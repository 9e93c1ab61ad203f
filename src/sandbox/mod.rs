//! Time-boxed execution of script snippets in an interpreter subprocess.
//!
//! # Execution model
//!
//! Every run spawns a fresh interpreter with a fixed, minimal permission
//! set, feeds it the snippet on stdin and races its exit against the budget:
//!
//! - Exit first: both streams are collected, sanitized and returned
//! - Budget first: the process is killed and its output discarded
//!
//! Isolation comes from the interpreter's own capability model. There are
//! no namespaces, seccomp filters or containers here.

mod config;
mod error;
mod launcher;
mod result;
mod runner;

pub use config::{
    DEFAULT_ANOMALY_GRACE, DEFAULT_HEAP_LIMIT_MB, DEFAULT_INTERPRETER, DEFAULT_TIMEOUT,
    InterpreterCommand, SandboxConfig,
};
pub use error::SandboxError;
pub use launcher::{LaunchedProcess, ProcessHandle, ProcessLauncher, TokioLauncher};
pub use result::{ExitStatus, RunRequest, RunResult};
pub use runner::SandboxRunner;
