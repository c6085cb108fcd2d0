//! Activity tracking and structured logging for build tools.
//!
//! This crate provides:
//! - [`Activity`], a guard for a unit of work that reports its start, updates
//!   and stop to a [`Logger`]
//! - a process-wide active logger with text, JSON and progress bar backends
//! - a line protocol ([`InternalLog`]) that lets a worker process relay its
//!   activities to a supervisor over a shared text stream, and a receiving
//!   [`ActivityRegistry`] that only admits what the source is trusted to send
//!
//! ## Usage
//!
//! ```ignore
//! use activity_log::{Activity, ActivityType, LogFormat, Verbosity};
//!
//! activity_log::set_log_format(LogFormat::InternalJson);
//!
//! let build = Activity::new(Verbosity::Info, ActivityType::Build, "building foo");
//! build.phase("configurePhase");
//! build.log_line("checking for gcc... yes");
//! // `build` reports its stop when dropped
//! ```
//!
//! On the supervising side:
//!
//! ```ignore
//! use activity_log::{Activity, ActivityRegistry, ActivityType};
//!
//! let act = Activity::builder(ActivityType::Build).text("building foo").start();
//! let mut registry = ActivityRegistry::new();
//! for line in worker_stderr.lines() {
//!     if !registry.handle_line(&line, &act, trusted) {
//!         eprintln!("{line}");
//!     }
//! }
//! ```

mod activity;
mod context;
mod error;
mod format;
mod handler;
mod internal_log;
mod json;
mod logger;
mod progress;
mod settings;
mod simple;
pub mod sink;
mod types;
mod verbosity;

pub use activity::{Activity, ActivityBuilder};
pub use context::{ActivityInstrument, PushActivity, current_activity, set_current_activity};
pub use error::{ConfigError, ConfigResult};
pub use format::{
    LogFormat, create_default_logger, default_log_format, set_log_format, set_log_format_str,
};
pub use handler::{ActivityRegistry, admits_start, handle_json_log_message};
pub use internal_log::{InternalLog, MARKER};
pub use json::{JsonLogger, WireFormat};
pub use logger::{
    Logger, WARNING_PREFIX, logger, print_debug, print_error, print_info, print_msg,
    print_talkative, set_logger, warn, warn_once,
};
pub use progress::ProgressBar;
pub use settings::LogSettings;
pub use simple::{SimpleLogger, in_systemd};
pub use sink::{BufferSink, Sink};
pub use types::{ActivityId, ActivityType, Field, NO_PARENT, ResultType};
pub use verbosity::{Verbosity, set_verbosity, set_verbosity_str, verbosity};
