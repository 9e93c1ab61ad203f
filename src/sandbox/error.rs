//! Error types for the interpreter sandbox.
//!
//! None of these reach the caller directly: the runner folds every variant
//! into [`ExitStatus::InternalError`](crate::sandbox::ExitStatus::InternalError).

/// Errors that can occur while driving an interpreter process.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The interpreter could not be started.
    #[error("Failed to spawn interpreter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the script to the child's stdin failed.
    #[error("Failed to write source to interpreter: {0}")]
    Feed(#[source] std::io::Error),

    /// Waiting on the child's status failed.
    #[error("Failed to wait for interpreter: {0}")]
    Wait(#[source] std::io::Error),

    /// Reading one of the child's output streams failed.
    #[error("Failed to read interpreter {stream}: {reason}")]
    Capture { stream: &'static str, reason: String },

    /// The child exited but something it left behind still holds its
    /// output pipes open.
    #[error("Interpreter output still open {0:?} after exit")]
    OutputTimeout(std::time::Duration),
}

/// Result type for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;
