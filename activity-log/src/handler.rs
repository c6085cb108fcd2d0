//! Receiving side of the wire protocol.
//!
//! A supervising process reads a worker's output line by line and feeds each line
//! to [`ActivityRegistry::handle_line`]. Structured lines are turned back into
//! activities and log calls on the supervisor's own logger; everything else is
//! left to the caller as plain text.
//!
//! # Trust
//!
//! An untrusted worker may only open `Download` activities. Any other `start`
//! it sends is dropped before it reaches the registry, so later `result` and
//! `stop` lines for that id find nothing and do nothing.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::activity::Activity;
use crate::internal_log::InternalLog;
use crate::logger::{self, Logger};
use crate::types::{ActivityId, ActivityType, Field, ResultType};

/// Whether a `start` from a source with the given trust may be admitted.
pub fn admits_start(trusted: bool, typ: ActivityType) -> bool {
    trusted || typ == ActivityType::Download
}

/// Activities opened by a remote source, keyed by the remote id.
pub struct ActivityRegistry {
    logger: Option<Arc<dyn Logger>>,
    activities: HashMap<ActivityId, Activity>,
}

impl ActivityRegistry {
    /// Registry that forwards to whichever logger is active at the time.
    pub fn new() -> Self {
        Self {
            logger: None,
            activities: HashMap::new(),
        }
    }

    /// Registry that forwards to a fixed logger.
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self {
            logger: Some(logger),
            activities: HashMap::new(),
        }
    }

    fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone().unwrap_or_else(logger::logger)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Whether the remote id is currently admitted.
    pub fn contains(&self, remote_id: ActivityId) -> bool {
        self.activities.contains_key(&remote_id)
    }

    /// The local activity standing in for a remote id.
    pub fn get(&self, remote_id: ActivityId) -> Option<&Activity> {
        self.activities.get(&remote_id)
    }

    /// Stop every admitted activity.
    pub fn clear(&mut self) {
        self.activities.clear();
    }

    /// Handle one line of a source's output.
    ///
    /// Returns `false` for plain text, which the caller should print itself.
    /// Structured lines are always consumed, including malformed ones, which are
    /// reported as a warning and dropped.
    pub fn handle_line(&mut self, line: &str, act: &Activity, trusted: bool) -> bool {
        let Some(parsed) = InternalLog::parse(line) else {
            return false;
        };

        match parsed {
            Ok(log) => self.apply(log, act, trusted),
            Err(e) => {
                tracing::warn!(target: "activity_log", "Failed to parse internal log: {e} - line: {line}");
                self.logger()
                    .warn(&format!("bad log message from builder: {e}"));
            }
        }

        true
    }

    /// Apply an already decoded event.
    ///
    /// `act` is the activity relaying this source; it becomes the parent of
    /// admitted activities and receives `setPhase` updates.
    pub fn apply(&mut self, log: InternalLog, act: &Activity, trusted: bool) {
        match log {
            InternalLog::Start {
                id,
                level,
                typ,
                text,
                fields,
                ..
            } => {
                if !admits_start(trusted, typ) {
                    tracing::debug!(
                        target: "activity_log",
                        remote_id = id,
                        typ = ?typ,
                        "dropping start from untrusted source"
                    );
                    return;
                }
                let logger = self.logger();
                match self.activities.entry(id) {
                    Entry::Occupied(_) => {
                        tracing::debug!(target: "activity_log", remote_id = id, "ignoring duplicate start");
                    }
                    Entry::Vacant(slot) => {
                        let activity = Activity::builder(typ)
                            .level(level)
                            .text(text)
                            .fields(fields)
                            .parent(act.id())
                            .logger(logger)
                            .start();
                        slot.insert(activity);
                    }
                }
            }

            InternalLog::Stop { id } => {
                self.activities.remove(&id);
            }

            InternalLog::Result { id, typ, fields } => {
                if let Some(activity) = self.activities.get(&id) {
                    activity.result(typ, &fields);
                }
            }

            InternalLog::SetPhase { phase } => {
                act.result(ResultType::SetPhase, &[Field::String(phase)]);
            }

            InternalLog::Msg { level, msg } => {
                self.logger().log(level, &msg);
            }
        }
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle one line from a source, see [`ActivityRegistry::handle_line`].
pub fn handle_json_log_message(
    line: &str,
    act: &Activity,
    activities: &mut ActivityRegistry,
    trusted: bool,
) -> bool {
    activities.handle_line(line, act, trusted)
}
