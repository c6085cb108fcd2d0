//! Log format selection and construction of the active logger.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::json::JsonLogger;
use crate::logger::{Logger, set_logger};
use crate::progress::ProgressBar;
use crate::simple::{SimpleLogger, in_systemd};
use crate::sink::{self, Sink};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", parse_err_fn = invalid_log_format, parse_err_ty = ConfigError)]
pub enum LogFormat {
    /// Plain text lines (default).
    #[default]
    Raw,
    /// Plain text lines, including build output.
    RawWithLogs,
    /// Structured lines with numeric tags, for readers built from this code base.
    InternalJson,
    /// Structured lines with stable names, for third-party readers.
    #[serde(rename = "json", alias = "external-json")]
    #[strum(to_string = "json", serialize = "external-json")]
    #[cfg_attr(feature = "clap", value(name = "json", alias = "external-json"))]
    ExternalJson,
    /// A status line on the terminal.
    Bar,
    /// A status line on the terminal, with build output printed above it.
    BarWithLogs,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The variant of this format that also prints build output.
    pub fn with_build_logs(self) -> Self {
        match self {
            LogFormat::Raw => LogFormat::RawWithLogs,
            LogFormat::Bar => LogFormat::BarWithLogs,
            other => other,
        }
    }

    /// Build a logger for this format writing to stderr.
    pub fn make_logger(self) -> Arc<dyn Logger> {
        match self {
            LogFormat::Bar => Arc::new(ProgressBar::new()),
            LogFormat::BarWithLogs => Arc::new(ProgressBar::new().print_build_logs(true)),
            _ => self.make_logger_with_sink(sink::stderr()),
        }
    }

    /// Build a logger for this format writing to `sink`.
    ///
    /// JSON formats wrap a plain text logger on the same sink.
    pub fn make_logger_with_sink(self, sink: Arc<dyn Sink>) -> Arc<dyn Logger> {
        let simple = || SimpleLogger::with_sink(sink.clone()).systemd(in_systemd());
        match self {
            LogFormat::Raw => Arc::new(simple()),
            LogFormat::RawWithLogs => Arc::new(simple().print_build_logs(true)),
            LogFormat::InternalJson => Arc::new(JsonLogger::internal(Arc::new(simple()))),
            LogFormat::ExternalJson => Arc::new(JsonLogger::external(Arc::new(simple()))),
            LogFormat::Bar => Arc::new(ProgressBar::with_sink(sink.clone())),
            LogFormat::BarWithLogs => {
                Arc::new(ProgressBar::with_sink(sink.clone()).print_build_logs(true))
            }
        }
    }
}

fn invalid_log_format(s: &str) -> ConfigError {
    ConfigError::InvalidLogFormat(s.to_string())
}

static DEFAULT_LOG_FORMAT: RwLock<LogFormat> = RwLock::new(LogFormat::Raw);

/// The format the active logger was last built from.
pub fn default_log_format() -> LogFormat {
    *DEFAULT_LOG_FORMAT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Select a format and replace the active logger with a fresh one.
///
/// Call this before other threads start logging. Activities that are already
/// running keep reporting to the logger they started with.
pub fn set_log_format(format: LogFormat) {
    *DEFAULT_LOG_FORMAT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = format;
    create_default_logger();
}

/// Parse a format name and select it.
pub fn set_log_format_str(format: &str) -> ConfigResult<()> {
    set_log_format(format.parse()?);
    Ok(())
}

/// Replace the active logger with one built from [`default_log_format`].
pub fn create_default_logger() {
    let format = default_log_format();
    tracing::debug!(target: "activity_log", %format, "creating logger");
    set_logger(format.make_logger());
}
