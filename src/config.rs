//! Configuration for snipbox, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::present::DEFAULT_MAX_MESSAGE_LEN;
use crate::sandbox::{
    DEFAULT_ANOMALY_GRACE, DEFAULT_HEAP_LIMIT_MB, DEFAULT_INTERPRETER, DEFAULT_TIMEOUT,
    SandboxConfig,
};

/// Interpreter path override.
pub const ENV_INTERPRETER: &str = "DENO_PATH";
pub const ENV_TIMEOUT_MS: &str = "SNIPBOX_TIMEOUT_MS";
pub const ENV_ANOMALY_GRACE_MS: &str = "SNIPBOX_ANOMALY_GRACE_MS";
pub const ENV_HEAP_MB: &str = "SNIPBOX_HEAP_MB";
pub const ENV_ALLOW_IMPORTS: &str = "SNIPBOX_ALLOW_IMPORTS";
pub const ENV_MAX_MESSAGE_LEN: &str = "SNIPBOX_MAX_MESSAGE_LEN";

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub sandbox: SandboxConfig,
    /// Default for the per-run import policy flag.
    pub allow_imports: bool,
    /// Upper bound on a rendered result message, in characters.
    pub max_message_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sandbox: SandboxConfig::default(),
            allow_imports: false,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interpreter = lookup(ENV_INTERPRETER)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INTERPRETER));

        let timeout = parse_var(&lookup, ENV_TIMEOUT_MS)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let anomaly_grace = parse_var(&lookup, ENV_ANOMALY_GRACE_MS)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_ANOMALY_GRACE);

        let heap_limit_mb = parse_var(&lookup, ENV_HEAP_MB)?.unwrap_or(DEFAULT_HEAP_LIMIT_MB);
        if heap_limit_mb == 0 {
            return Err(ConfigError::InvalidValue {
                key: ENV_HEAP_MB.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let allow_imports = match lookup(ENV_ALLOW_IMPORTS) {
            Some(v) => parse_bool(ENV_ALLOW_IMPORTS, &v)?,
            None => false,
        };

        let max_message_len =
            parse_var(&lookup, ENV_MAX_MESSAGE_LEN)?.unwrap_or(DEFAULT_MAX_MESSAGE_LEN);

        Ok(Self {
            sandbox: SandboxConfig {
                interpreter,
                timeout,
                anomaly_grace,
                heap_limit_mb,
            },
            allow_imports,
            max_message_len,
        })
    }
}

impl Config {
    /// Effective settings as `(variable, value)` pairs.
    pub fn list(&self) -> Vec<(&'static str, String)> {
        vec![
            (ENV_INTERPRETER, self.sandbox.interpreter.display().to_string()),
            (ENV_TIMEOUT_MS, self.sandbox.timeout.as_millis().to_string()),
            (
                ENV_ANOMALY_GRACE_MS,
                self.sandbox.anomaly_grace.as_millis().to_string(),
            ),
            (ENV_HEAP_MB, self.sandbox.heap_limit_mb.to_string()),
            (ENV_ALLOW_IMPORTS, self.allow_imports.to_string()),
            (ENV_MAX_MESSAGE_LEN, self.max_message_len.to_string()),
        ]
    }

    /// Effective value of one setting, by variable name (case-insensitive).
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{}': {}", raw, e),
            }),
        None => Ok(None),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}' is not a boolean", raw),
        }),
    }
}
