//! Error types for snipbox.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from pulling a code block out of message text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error(
        "Failed to match code from message content. Please make sure your code is properly \
         formatted, that is, in code blocks and has `js` or `ts` as language."
    )]
    NoMatch,
}
