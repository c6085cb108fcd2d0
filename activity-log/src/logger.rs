//! The logger capability and the process-wide active logger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::simple::SimpleLogger;
use crate::types::{ActivityId, ActivityType, Field, ResultType};
use crate::verbosity::Verbosity;

/// Prefix prepended by [`Logger::warn`].
pub const WARNING_PREFIX: &str = "\u{1b}[31;1mwarning:\u{1b}[0m ";

/// A logging backend.
///
/// None of these operations report failure: a backend that can't write simply
/// drops the output. Callers on error paths rely on that.
pub trait Logger: Send + Sync {
    /// Write a free-standing message.
    fn log(&self, level: Verbosity, msg: &str);

    /// Write a warning at `Warn` level.
    fn warn(&self, msg: &str) {
        self.log(Verbosity::Warn, &format!("{WARNING_PREFIX}{msg}"));
    }

    /// Announce a new unit of work.
    fn start_activity(
        &self,
        _id: ActivityId,
        _level: Verbosity,
        _typ: ActivityType,
        _text: &str,
        _fields: &[Field],
        _parent: ActivityId,
    ) {
    }

    /// Release everything tied to `id`. Unknown ids are ignored.
    fn stop_activity(&self, _id: ActivityId) {}

    /// Deliver an update for a running activity.
    fn result(&self, _id: ActivityId, _typ: ResultType, _fields: &[Field]) {}

    /// Whether this backend wants subprocess output streamed to it.
    fn is_verbose(&self) -> bool {
        false
    }
}

static LOGGER: LazyLock<RwLock<Arc<dyn Logger>>> =
    LazyLock::new(|| RwLock::new(Arc::new(SimpleLogger::new())));

/// The currently active logger.
pub fn logger() -> Arc<dyn Logger> {
    LOGGER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the active logger, returning the previous one.
///
/// Activities already running keep the logger they were started with.
pub fn set_logger(logger: Arc<dyn Logger>) -> Arc<dyn Logger> {
    let mut slot = LOGGER.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, logger)
}

/// Log `msg` on the active logger if `level` passes the threshold.
pub fn print_msg(level: Verbosity, msg: impl AsRef<str>) {
    if level.is_enabled() {
        logger().log(level, msg.as_ref());
    }
}

pub fn print_error(msg: impl AsRef<str>) {
    print_msg(Verbosity::Error, msg);
}

pub fn print_info(msg: impl AsRef<str>) {
    print_msg(Verbosity::Info, msg);
}

pub fn print_talkative(msg: impl AsRef<str>) {
    print_msg(Verbosity::Talkative, msg);
}

pub fn print_debug(msg: impl AsRef<str>) {
    print_msg(Verbosity::Debug, msg);
}

/// Warn on the active logger.
pub fn warn(msg: impl AsRef<str>) {
    logger().warn(msg.as_ref());
}

/// Warn only the first time this flag is seen unset.
pub fn warn_once(have_warned: &AtomicBool, msg: impl AsRef<str>) {
    if !have_warned.swap(true, Ordering::Relaxed) {
        warn(msg);
    }
}
