//! Activity guard that tracks a unit of work from start to stop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use tracing::{Level, Span, span};

use crate::context::{PushActivity, current_activity};
use crate::logger::{self, Logger};
use crate::types::{ActivityId, ActivityType, Field, ResultType};
use crate::verbosity::Verbosity;

/// Next id to hand out.
///
/// Seeded with the pid in the high half so ids minted by a worker and by the
/// process reading its output don't collide.
static NEXT_ID: LazyLock<AtomicU64> =
    LazyLock::new(|| AtomicU64::new(u64::from(std::process::id()) << 32));

fn next_id() -> ActivityId {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Guard for a running unit of work.
///
/// Starting it calls [`Logger::start_activity`]; dropping it calls
/// [`Logger::stop_activity`] exactly once. Not `Clone`: hand the [`id`](Self::id)
/// to other threads or tasks instead.
#[must_use = "Activity stops immediately if dropped"]
pub struct Activity {
    id: ActivityId,
    parent: ActivityId,
    logger: Arc<dyn Logger>,
    span: Span,
}

impl Activity {
    /// Create a builder for an activity of the given type.
    pub fn builder(typ: ActivityType) -> ActivityBuilder {
        ActivityBuilder::new(typ)
    }

    /// Start an activity on the active logger with the current activity as parent.
    pub fn new(level: Verbosity, typ: ActivityType, text: impl Into<String>) -> Self {
        Self::builder(typ).level(level).text(text).start()
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn parent(&self) -> ActivityId {
        self.parent
    }

    /// The logger this activity reports to.
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Get a cloned span for this activity.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// Send an update to the logger.
    pub fn result(&self, typ: ResultType, fields: &[Field]) {
        let logger = &self.logger;
        let id = self.id;
        if panic::catch_unwind(AssertUnwindSafe(|| logger.result(id, typ, fields))).is_err() {
            tracing::debug!(target: "activity_log", activity_id = id, ?typ, "logger panicked while sending result");
        }
    }

    /// Report `done` out of `expected` units, with `running` in flight and `failed` failed.
    pub fn progress(&self, done: u64, expected: u64, running: u64, failed: u64) {
        self.result(
            ResultType::Progress,
            &[
                Field::Int(done),
                Field::Int(expected),
                Field::Int(running),
                Field::Int(failed),
            ],
        );
    }

    /// Announce how many child activities of type `typ` are expected.
    pub fn set_expected(&self, typ: ActivityType, expected: u64) {
        self.result(
            ResultType::SetExpected,
            &[Field::Int(typ.into()), Field::Int(expected)],
        );
    }

    pub fn phase(&self, phase: impl Into<String>) {
        self.result(ResultType::SetPhase, &[Field::String(phase.into())]);
    }

    /// Forward one line of build output.
    pub fn log_line(&self, line: impl Into<String>) {
        self.result(ResultType::BuildLogLine, &[Field::String(line.into())]);
    }

    /// Run a closure with this activity as the current one.
    ///
    /// Activities started inside the closure get this one as their parent.
    pub fn in_scope<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _push = PushActivity::new(self.id);
        self.span.in_scope(f)
    }
}

impl std::fmt::Debug for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Activity")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}

impl Drop for Activity {
    fn drop(&mut self) {
        let logger = &self.logger;
        let id = self.id;
        if panic::catch_unwind(AssertUnwindSafe(|| logger.stop_activity(id))).is_err() {
            tracing::debug!(target: "activity_log", activity_id = id, "logger panicked while stopping activity");
        }
        tracing::trace!(target: "activity_log", activity_id = id, event_type = "stop");
    }
}

/// Builder for [`Activity`].
///
/// Defaults: error level, empty text, no fields, the active logger, and the
/// current activity as parent.
pub struct ActivityBuilder {
    typ: ActivityType,
    level: Verbosity,
    text: String,
    fields: Vec<Field>,
    parent: Option<ActivityId>,
    logger: Option<Arc<dyn Logger>>,
}

impl ActivityBuilder {
    pub(crate) fn new(typ: ActivityType) -> Self {
        Self {
            typ,
            level: Verbosity::Error,
            text: String::new(),
            fields: Vec::new(),
            parent: None,
            logger: None,
        }
    }

    pub fn level(mut self, level: Verbosity) -> Self {
        self.level = level;
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    /// Use an explicit parent instead of the current activity.
    pub fn parent(mut self, parent: ActivityId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Report to this logger instead of the active one.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn start(self) -> Activity {
        let id = next_id();
        let parent = self.parent.unwrap_or_else(current_activity);
        let logger = self.logger.unwrap_or_else(logger::logger);

        let span = span!(Level::TRACE, "activity", activity_id = id);
        tracing::trace!(
            target: "activity_log",
            activity_id = id,
            event_type = "start",
            typ = ?self.typ,
            parent_id = parent,
            text = %self.text,
        );

        if panic::catch_unwind(AssertUnwindSafe(|| {
            logger.start_activity(id, self.level, self.typ, &self.text, &self.fields, parent)
        }))
        .is_err()
        {
            tracing::debug!(target: "activity_log", activity_id = id, "logger panicked while starting activity");
        }

        Activity {
            id,
            parent,
            logger,
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PushActivity;
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Call {
        Start(ActivityId, ActivityType, String, ActivityId),
        Stop(ActivityId),
        Result(ActivityId, ResultType, Vec<Field>),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
    }

    impl Logger for Recorder {
        fn log(&self, _level: Verbosity, _msg: &str) {}

        fn start_activity(
            &self,
            id: ActivityId,
            _level: Verbosity,
            typ: ActivityType,
            text: &str,
            _fields: &[Field],
            parent: ActivityId,
        ) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Start(id, typ, text.to_string(), parent));
        }

        fn stop_activity(&self, id: ActivityId) {
            self.calls.lock().unwrap().push(Call::Stop(id));
        }

        fn result(&self, id: ActivityId, typ: ResultType, fields: &[Field]) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Result(id, typ, fields.to_vec()));
        }
    }

    struct Exploding;

    impl Logger for Exploding {
        fn log(&self, _level: Verbosity, _msg: &str) {}

        fn stop_activity(&self, _id: ActivityId) {
            panic!("stop failed");
        }
    }

    #[test]
    fn test_lifecycle_notifies_start_results_stop() {
        let recorder = Arc::new(Recorder::default());
        let activity = Activity::builder(ActivityType::Build)
            .text("building foo")
            .parent(0)
            .logger(recorder.clone())
            .start();
        let id = activity.id();
        activity.phase("configure");
        activity.progress(1, 4, 2, 0);
        drop(activity);

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                Call::Start(id, ActivityType::Build, "building foo".to_string(), 0),
                Call::Result(id, ResultType::SetPhase, vec![Field::from("configure")]),
                Call::Result(
                    id,
                    ResultType::Progress,
                    vec![Field::Int(1), Field::Int(4), Field::Int(2), Field::Int(0)]
                ),
                Call::Stop(id),
            ]
        );
    }

    #[test]
    fn test_parent_defaults_to_current_activity() {
        let recorder = Arc::new(Recorder::default());
        let outer = Activity::builder(ActivityType::Builds)
            .logger(recorder.clone())
            .start();
        let inner = outer.in_scope(|| {
            Activity::builder(ActivityType::Build)
                .logger(recorder.clone())
                .start()
        });
        assert_eq!(inner.parent(), outer.id());

        let _push = PushActivity::new(12345);
        let explicit = Activity::builder(ActivityType::Build)
            .parent(outer.id())
            .logger(recorder.clone())
            .start();
        assert_eq!(explicit.parent(), outer.id());
        let implicit = Activity::builder(ActivityType::Build)
            .logger(recorder.clone())
            .start();
        assert_eq!(implicit.parent(), 12345);
    }

    #[test]
    fn test_ids_increase_and_carry_pid() {
        let recorder: Arc<dyn Logger> = Arc::new(Recorder::default());
        let a = Activity::builder(ActivityType::Unknown)
            .logger(recorder.clone())
            .start();
        let b = Activity::builder(ActivityType::Unknown)
            .logger(recorder)
            .start();
        assert!(b.id() > a.id());
        assert_eq!(a.id() >> 32, u64::from(std::process::id()));
    }

    #[test]
    fn test_set_expected_fields() {
        let recorder = Arc::new(Recorder::default());
        let activity = Activity::builder(ActivityType::Realise)
            .logger(recorder.clone())
            .start();
        activity.set_expected(ActivityType::Download, 3);
        let calls = recorder.calls.lock().unwrap();
        assert_eq!(
            calls[1],
            Call::Result(
                activity.id(),
                ResultType::SetExpected,
                vec![Field::Int(101), Field::Int(3)]
            )
        );
    }

    /// Fails on start and on every update, but still records stops.
    #[derive(Default)]
    struct Flaky {
        stopped: Mutex<Vec<ActivityId>>,
    }

    impl Logger for Flaky {
        fn log(&self, _level: Verbosity, _msg: &str) {}

        fn start_activity(
            &self,
            _id: ActivityId,
            _level: Verbosity,
            _typ: ActivityType,
            _text: &str,
            _fields: &[Field],
            _parent: ActivityId,
        ) {
            panic!("start failed");
        }

        fn stop_activity(&self, id: ActivityId) {
            self.stopped.lock().unwrap().push(id);
        }

        fn result(&self, _id: ActivityId, _typ: ResultType, _fields: &[Field]) {
            panic!("result failed");
        }
    }

    #[test]
    fn test_panicking_start_still_yields_activity() {
        let flaky = Arc::new(Flaky::default());
        let activity = Activity::builder(ActivityType::Build)
            .text("building foo")
            .logger(flaky.clone())
            .start();
        let id = activity.id();
        assert_ne!(id, 0);
        drop(activity);
        assert_eq!(*flaky.stopped.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_panicking_result_is_contained() {
        let flaky = Arc::new(Flaky::default());
        let activity = Activity::builder(ActivityType::Build)
            .logger(flaky.clone())
            .start();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            activity.phase("buildPhase");
            activity.log_line("make all");
            activity.progress(1, 2, 1, 0);
            activity.set_expected(ActivityType::Build, 2);
        }));
        assert!(outcome.is_ok());
        let id = activity.id();
        drop(activity);
        assert_eq!(*flaky.stopped.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_panicking_stop_is_contained() {
        let activity = Activity::builder(ActivityType::Build)
            .logger(Arc::new(Exploding))
            .start();
        drop(activity);
    }
}
