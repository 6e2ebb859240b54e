//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use streamcord_config::{ConfigError, Secret};
use streamcord_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(streamcord::config),
        help(
            "Config file: {path}\n\
             Run: streamcord config check"
        )
    )]
    InvalidConfig { message: String, path: String },

    #[error("No {secret} configured")]
    #[diagnostic(
        code(streamcord::no_credentials),
        help(
            "Set {secret} in the config file or name a variable in {secret}_env.\n\
             To use the system keyring instead:\n  \
             streamcord config set-secret {command_arg}"
        )
    )]
    NoCredentials { secret: String, command_arg: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach {target}: {reason}")]
    #[diagnostic(
        code(streamcord::connection_failed),
        help("Check that {target} is reachable and the credentials are valid.")
    )]
    ConnectionFailed { target: String, reason: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("{succeeded} operations applied, {failed} failed")]
    #[diagnostic(
        code(streamcord::partial_failure),
        help("Rerun with -v for per-resource details.")
    )]
    PartialFailure { succeeded: usize, failed: usize },

    #[error("{0}")]
    #[diagnostic(code(streamcord::runtime))]
    Runtime(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(streamcord::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(streamcord::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig { .. } | Self::NoCredentials { .. } => exit_code::CONFIG,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the config file path to a configuration failure.
    pub fn config(err: ConfigError, path: &std::path::Path) -> Self {
        match err {
            ConfigError::NoCredentials { secret } => Self::NoCredentials {
                command_arg: match secret {
                    Secret::ApiKey => "api-key".into(),
                    Secret::BotToken => "bot-token".into(),
                },
                secret: secret.field().into(),
            },
            ConfigError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::InvalidConfig {
                    message: "config file not found".into(),
                    path: path.display().to_string(),
                }
            }
            other => Self::InvalidConfig {
                message: other.to_string(),
                path: path.display().to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UpstreamUnavailable { reason } => Self::ConnectionFailed {
                target: "the media server".into(),
                reason,
            },
            CoreError::DirectoryUnavailable { reason } => Self::ConnectionFailed {
                target: "Discord".into(),
                reason,
            },
            CoreError::ConfigurationInvalid { message } => Self::InvalidConfig {
                message,
                path: "(effective configuration)".into(),
            },
            other => Self::Runtime(other.to_string()),
        }
    }
}

impl From<streamcord_core::CycleReport> for CliError {
    fn from(report: streamcord_core::CycleReport) -> Self {
        Self::PartialFailure {
            succeeded: report.created + report.updated + report.deleted,
            failed: report.failed.len(),
        }
    }
}
