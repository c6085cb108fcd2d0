//! Serializable logging configuration.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::format::{LogFormat, set_log_format};
use crate::verbosity::{Verbosity, set_verbosity};

/// Logging options as they appear in a configuration file.
///
/// ```yaml
/// log-format: bar
/// verbosity: talkative
/// print-build-logs: true
/// ```
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LogSettings {
    pub log_format: LogFormat,
    #[serde_as(as = "DisplayFromStr")]
    pub verbosity: Verbosity,
    /// Echo build output even with a format that would only summarize it.
    pub print_build_logs: bool,
}

impl LogSettings {
    /// The format that will actually be used.
    pub fn effective_format(&self) -> LogFormat {
        if self.print_build_logs {
            self.log_format.with_build_logs()
        } else {
            self.log_format
        }
    }

    /// Set the process-wide threshold and replace the active logger.
    pub fn apply(&self) {
        set_verbosity(self.verbosity);
        set_log_format(self.effective_format());
    }
}
