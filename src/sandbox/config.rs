//! Configuration for the interpreter sandbox.

use std::path::PathBuf;
use std::time::Duration;

/// Interpreter executable used when no override is configured.
pub const DEFAULT_INTERPRETER: &str = "deno";

/// Default wall-clock budget for one run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// How far past the budget a run may resolve before it is flagged anomalous.
pub const DEFAULT_ANOMALY_GRACE: Duration = Duration::from_millis(50);

/// Default old-space heap cap handed to V8, in megabytes.
pub const DEFAULT_HEAP_LIMIT_MB: u32 = 20;

/// Configuration for the sandbox runner.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Interpreter executable (a bare name is resolved on `PATH`).
    pub interpreter: PathBuf,
    /// Default budget for a run; requests may override it.
    pub timeout: Duration,
    /// Grace margin used for the anomaly flag.
    pub anomaly_grace: Duration,
    /// Heap cap in megabytes.
    pub heap_limit_mb: u32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
            timeout: DEFAULT_TIMEOUT,
            anomaly_grace: DEFAULT_ANOMALY_GRACE,
            heap_limit_mb: DEFAULT_HEAP_LIMIT_MB,
        }
    }
}

/// Fully resolved argv for one interpreter launch.
///
/// ```text
/// <interpreter> run --no-check --allow-hrtime --v8-flags=--max-old-space-size=<mb> -
/// ```
///
/// The child gets no permission beyond the high-resolution timer and reads
/// the whole script from stdin (`-`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterCommand {
    /// Executable to spawn.
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<String>,
}

impl InterpreterCommand {
    /// Create a command with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Build the interpreter invocation for the given configuration.
    pub fn for_config(config: &SandboxConfig) -> Self {
        Self::new(config.interpreter.clone())
            .arg("run")
            .arg("--no-check")
            .arg("--allow-hrtime")
            .arg(format!(
                "--v8-flags=--max-old-space-size={}",
                config.heap_limit_mb
            ))
            .arg("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_config_default() {
        let config = SandboxConfig::default();
        assert_eq!(config.interpreter, PathBuf::from("deno"));
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.anomaly_grace, Duration::from_millis(50));
        assert_eq!(config.heap_limit_mb, 20);
    }

    #[test]
    fn test_interpreter_command_args() {
        let config = SandboxConfig {
            interpreter: PathBuf::from("/opt/deno/bin/deno"),
            heap_limit_mb: 64,
            ..Default::default()
        };

        let cmd = InterpreterCommand::for_config(&config);
        assert_eq!(cmd.program, PathBuf::from("/opt/deno/bin/deno"));
        assert_eq!(
            cmd.args,
            vec![
                "run",
                "--no-check",
                "--allow-hrtime",
                "--v8-flags=--max-old-space-size=64",
                "-",
            ]
        );
    }
}
