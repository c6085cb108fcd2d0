use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while configuring logging, before any output is produced.
#[derive(Error, Diagnostic, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("option 'log-format' has an invalid value '{0}'")]
    #[diagnostic(help(
        "expected one of: raw, raw-with-logs, internal-json, json, bar, bar-with-logs"
    ))]
    InvalidLogFormat(String),

    #[error("invalid verbosity '{0}'")]
    #[diagnostic(help(
        "expected one of: error, warn, notice, info, talkative, chatty, debug, vomit"
    ))]
    InvalidVerbosity(String),
}

/// A specialized result type for logging configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
