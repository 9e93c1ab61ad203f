//! Request and result types for a single sandboxed run.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::extract::Language;

/// One snippet to execute.
///
/// Immutable once built; a request produces exactly one [`RunResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    language: Language,
    source: String,
    allow_imports: bool,
    timeout: Option<Duration>,
}

impl RunRequest {
    /// Create a request with imports disallowed and the runner's default budget.
    pub fn new(language: Language, source: impl Into<String>) -> Self {
        Self {
            language,
            source: source.into(),
            allow_imports: false,
            timeout: None,
        }
    }

    /// Set whether the import guard is skipped.
    pub fn allow_imports(mut self, allow: bool) -> Self {
        self.allow_imports = allow;
        self
    }

    /// Override the runner's default budget for this run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Language the source is written in.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Script text fed to the interpreter.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the import policy is skipped.
    pub fn imports_allowed(&self) -> bool {
        self.allow_imports
    }

    /// Per-run budget override, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExitStatus {
    /// The process exited on its own. Any code, including nonzero, lands here.
    Completed(i32),
    /// The budget ran out and the process was killed.
    ForcedKill,
    /// The run never produced a status: policy rejection, spawn or pipe failure.
    InternalError(String),
}

impl ExitStatus {
    /// Short label for display: the numeric code, `ForceExit` or `Error`.
    pub fn label(&self) -> String {
        match self {
            ExitStatus::Completed(code) => code.to_string(),
            ExitStatus::ForcedKill => "ForceExit".to_string(),
            ExitStatus::InternalError(_) => "Error".to_string(),
        }
    }

    /// Error detail for non-completed runs.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            ExitStatus::Completed(_) => None,
            ExitStatus::ForcedKill => Some("Timeout"),
            ExitStatus::InternalError(message) => Some(message),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitStatus::Completed(code) => write!(f, "exited with code {}", code),
            ExitStatus::ForcedKill => f.write_str("killed after timeout"),
            ExitStatus::InternalError(message) => write!(f, "internal error: {}", message),
        }
    }
}

/// Structured outcome of a run.
///
/// `stdout`/`stderr` are `None` whenever nothing was captured: after a forced
/// kill, after an internal error, and for policy rejections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub status: ExitStatus,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    /// Milliseconds from spawn to status resolution or the kill decision.
    pub elapsed_ms: f64,
    /// Resolution came later than budget plus grace; the timeout race may
    /// have misfired. Diagnostic only.
    pub anomalous: bool,
}

impl RunResult {
    /// Result for a run that failed before or while talking to the process.
    pub fn internal_error(message: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            status: ExitStatus::InternalError(message.into()),
            stdout: None,
            stderr: None,
            elapsed_ms,
            anomalous: false,
        }
    }

    /// Whether the process ran to completion with exit code zero.
    pub fn is_success(&self) -> bool {
        self.status == ExitStatus::Completed(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = RunRequest::new(Language::Js, "console.log(1)");
        assert_eq!(request.language(), Language::Js);
        assert_eq!(request.source(), "console.log(1)");
        assert!(!request.imports_allowed());
        assert_eq!(request.timeout(), None);

        let request = request
            .allow_imports(true)
            .with_timeout(Duration::from_secs(2));
        assert!(request.imports_allowed());
        assert_eq!(request.timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_exit_status_labels() {
        assert_eq!(ExitStatus::Completed(0).label(), "0");
        assert_eq!(ExitStatus::Completed(-1).label(), "-1");
        assert_eq!(ExitStatus::ForcedKill.label(), "ForceExit");
        assert_eq!(ExitStatus::InternalError("x".into()).label(), "Error");

        assert_eq!(ExitStatus::Completed(1).error_detail(), None);
        assert_eq!(ExitStatus::ForcedKill.error_detail(), Some("Timeout"));
        assert_eq!(
            ExitStatus::InternalError("Imports are not allowed".into()).error_detail(),
            Some("Imports are not allowed")
        );
    }

    #[test]
    fn test_result_serializes() {
        let result = RunResult {
            status: ExitStatus::Completed(0),
            stdout: Some("hi".into()),
            stderr: Some(String::new()),
            elapsed_ms: 12.5,
            anomalous: false,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"]["kind"], "completed");
        assert_eq!(json["status"]["detail"], 0);
        assert_eq!(json["stdout"], "hi");

        let killed = RunResult {
            status: ExitStatus::ForcedKill,
            stdout: None,
            stderr: None,
            elapsed_ms: 501.0,
            anomalous: false,
        };
        let json = serde_json::to_value(&killed).unwrap();
        assert_eq!(json["status"]["kind"], "forced_kill");
        assert!(json["stdout"].is_null());
    }

    #[test]
    fn test_internal_error_result() {
        let result = RunResult::internal_error("boom", 0.0);
        assert_eq!(result.status, ExitStatus::InternalError("boom".into()));
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
        assert!(!result.anomalous);
        assert!(!result.is_success());
    }
}
