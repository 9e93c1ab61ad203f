//! Process launching behind a trait so the runner can be driven by fakes.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

use crate::sandbox::config::InterpreterCommand;

/// Handle to a running process.
#[async_trait]
pub trait ProcessHandle: Send {
    /// Wait for the process to exit. `None` means it ended without a code
    /// (e.g. killed by a signal).
    async fn wait(&mut self) -> std::io::Result<Option<i32>>;

    /// Forcibly terminate the process and reap it.
    async fn kill(&mut self) -> std::io::Result<()>;
}

/// A freshly spawned process with its three pipes.
pub struct LaunchedProcess {
    pub stdin: Box<dyn AsyncWrite + Send + Unpin>,
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
    pub handle: Box<dyn ProcessHandle>,
}

/// Starts interpreter processes.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, command: &InterpreterCommand) -> std::io::Result<LaunchedProcess>;
}

/// Launches real child processes through `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLauncher;

#[async_trait]
impl ProcessLauncher for TokioLauncher {
    async fn launch(&self, command: &InterpreterCommand) -> std::io::Result<LaunchedProcess> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        Ok(LaunchedProcess {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            handle: Box::new(ChildHandle { child }),
        })
    }
}

struct ChildHandle {
    child: Child,
}

#[async_trait]
impl ProcessHandle for ChildHandle {
    async fn wait(&mut self) -> std::io::Result<Option<i32>> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }

    async fn kill(&mut self) -> std::io::Result<()> {
        self.child.kill().await
    }
}

fn missing_pipe(name: &str) -> std::io::Error {
    std::io::Error::other(format!("child {} was not captured", name))
}
