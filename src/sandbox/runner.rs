//! Time-boxed interpreter execution.
//!
//! ```text
//! run(request)
//!   │
//!   ├─ policy violation? ──────────────▶ InternalError, 0 ms, nothing spawned
//!   │
//!   ▼
//! spawn ─▶ start stdout/stderr drains ─▶ write source, close stdin
//!   │
//!   ▼
//! select { status, deadline }
//!   │                    │
//!   │ status first       │ deadline first
//!   ▼                    ▼
//! join drains,       kill child, abort drains
//! bounded by grace
//! sanitize streams    ForcedKill, no output
//! Completed(code)
//! ```
//!
//! Every outcome is a [`RunResult`]; nothing is returned as `Err`.

use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::extract::Language;
use crate::safety::{Policy, Sanitizer};
use crate::sandbox::config::{InterpreterCommand, SandboxConfig};
use crate::sandbox::error::{Result, SandboxError};
use crate::sandbox::launcher::{LaunchedProcess, ProcessHandle, ProcessLauncher, TokioLauncher};
use crate::sandbox::result::{ExitStatus, RunRequest, RunResult};

/// Type-check banners emitted on stderr for TypeScript input.
static CHECK_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A(?:Check [\w .|$-]*(?:\n|\z))+").expect("banner pattern is a valid regex")
});

/// Runs snippets in a fresh interpreter process each time.
///
/// Holds no per-run state, so one runner can serve any number of concurrent
/// `run` calls; each call owns its own child and pipes.
pub struct SandboxRunner {
    config: SandboxConfig,
    launcher: Arc<dyn ProcessLauncher>,
    policy: Policy,
    sanitizer: Sanitizer,
}

impl SandboxRunner {
    /// Create a runner that spawns real processes.
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            launcher: Arc::new(TokioLauncher),
            policy: Policy::default(),
            sanitizer: Sanitizer::new(),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SandboxConfig::default())
    }

    /// Replace the process launcher.
    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Replace the pre-execution policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Execute one snippet.
    pub async fn run(&self, request: &RunRequest) -> RunResult {
        let span = tracing::info_span!(
            "run",
            run_id = %Uuid::new_v4(),
            language = %request.language(),
        );
        self.run_guarded(request).instrument(span).await
    }

    async fn run_guarded(&self, request: &RunRequest) -> RunResult {
        if !request.imports_allowed() {
            if let Some(rule) = self.policy.violation(request.source()) {
                tracing::info!(rule = %rule.id, "snippet rejected by policy");
                return RunResult::internal_error(rule.message.clone(), 0.0);
            }
        }

        let budget = request.timeout().unwrap_or(self.config.timeout);
        let command = InterpreterCommand::for_config(&self.config);
        let started = Instant::now();

        match self.execute(request, &command, budget, started).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "run failed before producing a status");
                RunResult::internal_error(e.to_string(), elapsed_ms(started))
            }
        }
    }

    async fn execute(
        &self,
        request: &RunRequest,
        command: &InterpreterCommand,
        budget: Duration,
        started: Instant,
    ) -> Result<RunResult> {
        let LaunchedProcess {
            mut stdin,
            stdout,
            stderr,
            mut handle,
        } = self
            .launcher
            .launch(command)
            .await
            .map_err(|source| SandboxError::Spawn {
                program: command.program.display().to_string(),
                source,
            })?;

        let deadline = tokio::time::Instant::now() + budget;
        tracing::debug!(program = %command.program.display(), ?budget, "interpreter spawned");

        // Drain both pipes from the start so a chatty child cannot block on a
        // full pipe while we wait for its status.
        let mut drains = OutputDrains::start(stdout, stderr);

        let feed = async {
            stdin.write_all(request.source().as_bytes()).await?;
            stdin.shutdown().await
        };
        let fed = tokio::time::timeout_at(deadline, feed).await;
        match fed {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                kill_quietly(handle.as_mut()).await;
                return Err(SandboxError::Feed(e));
            }
            Err(_) => {
                drop(stdin);
                return Ok(self.forced_kill(handle.as_mut(), budget, started).await);
            }
        }
        drop(stdin);

        // Prefer the status when both are ready in the same poll: a process
        // that has already exited is not killed.
        let outcome = tokio::select! {
            biased;
            status = handle.wait() => Some(status),
            _ = tokio::time::sleep_until(deadline) => None,
        };

        let status = match outcome {
            Some(status) => status.map_err(SandboxError::Wait)?,
            None => return Ok(self.forced_kill(handle.as_mut(), budget, started).await),
        };

        let elapsed = elapsed_ms(started);
        let anomalous = self.is_anomalous(elapsed, budget);
        let code = status.unwrap_or(-1);

        // Exit closes the child's ends of the pipes, but a descendant may
        // still hold them. Reading gets the rest of the budget plus grace.
        let exited = tokio::time::Instant::now();
        let drain_deadline = deadline.max(exited) + self.config.anomaly_grace;
        let (raw_stdout, raw_stderr) = tokio::time::timeout_at(
            drain_deadline,
            futures::future::try_join(
                collect(&mut drains.stdout, "stdout"),
                collect(&mut drains.stderr, "stderr"),
            ),
        )
        .await
        .map_err(|_| SandboxError::OutputTimeout(drain_deadline - exited))??;
        tracing::debug!(
            stdout_bytes = raw_stdout.len(),
            stderr_bytes = raw_stderr.len(),
            "output captured"
        );

        let stdout = self.sanitizer.clean_stream(&raw_stdout);
        let mut stderr = self.sanitizer.clean_stream(&raw_stderr);
        if request.language() == Language::Ts {
            stderr = strip_check_banner(&stderr);
        }

        if anomalous {
            tracing::warn!(elapsed_ms = elapsed, ?budget, "run resolved past budget and grace");
        }
        tracing::info!(code, elapsed_ms = elapsed, "run completed");

        Ok(RunResult {
            status: ExitStatus::Completed(code),
            stdout: Some(stdout),
            stderr: Some(stderr),
            elapsed_ms: elapsed,
            anomalous,
        })
    }

    /// Kill path: the decision time is the measured elapsed time, and no
    /// output is read.
    async fn forced_kill(
        &self,
        handle: &mut dyn ProcessHandle,
        budget: Duration,
        started: Instant,
    ) -> RunResult {
        let elapsed = elapsed_ms(started);
        let anomalous = self.is_anomalous(elapsed, budget);

        tracing::warn!(elapsed_ms = elapsed, ?budget, "budget exceeded, killing interpreter");
        kill_quietly(handle).await;

        RunResult {
            status: ExitStatus::ForcedKill,
            stdout: None,
            stderr: None,
            elapsed_ms: elapsed,
            anomalous,
        }
    }

    fn is_anomalous(&self, elapsed_ms: f64, budget: Duration) -> bool {
        let limit = budget + self.config.anomaly_grace;
        elapsed_ms > limit.as_secs_f64() * 1000.0
    }
}

/// Background readers for the child's output pipes. Dropping the value
/// aborts whatever is still running.
struct OutputDrains {
    stdout: JoinHandle<std::io::Result<Vec<u8>>>,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
}

impl OutputDrains {
    fn start(
        stdout: Box<dyn AsyncRead + Send + Unpin>,
        stderr: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Self {
        Self {
            stdout: tokio::spawn(read_all(stdout)),
            stderr: tokio::spawn(read_all(stderr)),
        }
    }
}

impl Drop for OutputDrains {
    fn drop(&mut self) {
        self.stdout.abort();
        self.stderr.abort();
    }
}

async fn read_all(mut reader: Box<dyn AsyncRead + Send + Unpin>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn collect(
    task: &mut JoinHandle<std::io::Result<Vec<u8>>>,
    stream: &'static str,
) -> Result<String> {
    let bytes = task
        .await
        .map_err(|e| SandboxError::Capture {
            stream,
            reason: e.to_string(),
        })?
        .map_err(|e| SandboxError::Capture {
            stream,
            reason: e.to_string(),
        })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn kill_quietly(handle: &mut dyn ProcessHandle) {
    if let Err(e) = handle.kill().await {
        tracing::warn!(error = %e, "failed to kill interpreter");
    }
}

/// Drop leading `Check <name>` lines from TypeScript stderr.
pub(crate) fn strip_check_banner(stderr: &str) -> String {
    CHECK_BANNER.replace(stderr, "").trim().to_string()
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
