//! The "current activity" used as the implicit parent of new activities.
//!
//! The value lives in a thread-local, or in a task-local while a future runs
//! under [`ActivityInstrument::in_activity`]. Neither crosses `std::thread::spawn`
//! or `tokio::spawn`: capture [`current_activity`] before spawning and pass it to
//! [`ActivityBuilder::parent`](crate::ActivityBuilder::parent) on the other side.

use std::cell::Cell;
use std::future::Future;

use crate::activity::Activity;
use crate::types::{ActivityId, NO_PARENT};

thread_local! {
    static CUR_ACTIVITY: Cell<ActivityId> = const { Cell::new(NO_PARENT) };
}

tokio::task_local! {
    static TASK_ACTIVITY: Cell<ActivityId>;
}

/// The current activity of this thread or task, `0` if none.
pub fn current_activity() -> ActivityId {
    TASK_ACTIVITY
        .try_with(Cell::get)
        .unwrap_or_else(|_| CUR_ACTIVITY.with(Cell::get))
}

/// Set the current activity of this thread or task.
pub fn set_current_activity(id: ActivityId) {
    if TASK_ACTIVITY.try_with(|cur| cur.set(id)).is_err() {
        CUR_ACTIVITY.with(|cur| cur.set(id));
    }
}

/// Makes an activity current until dropped, then restores the previous one.
#[must_use = "the previous activity is restored as soon as this is dropped"]
pub struct PushActivity {
    prev: ActivityId,
}

impl PushActivity {
    pub fn new(id: ActivityId) -> Self {
        let prev = current_activity();
        set_current_activity(id);
        Self { prev }
    }
}

impl Drop for PushActivity {
    fn drop(&mut self) {
        set_current_activity(self.prev);
    }
}

/// Extension trait for running futures with an activity as their context.
///
/// ```ignore
/// use activity_log::{Activity, ActivityInstrument, ActivityType};
///
/// let activity = Activity::builder(ActivityType::Builds).text("building").start();
/// async {
///     // `activity` is the parent of anything started in here
///     let child = Activity::builder(ActivityType::Build).start();
/// }
/// .in_activity(&activity)
/// .await;
/// ```
///
/// The `&Activity` is only read at call time; the returned future does not
/// borrow it, so it can be handed to `tokio::spawn`.
pub trait ActivityInstrument: Future + Sized {
    fn in_activity(self, activity: &Activity) -> impl Future<Output = Self::Output> + use<Self> {
        let span = activity.span();
        TASK_ACTIVITY.scope(
            Cell::new(activity.id()),
            tracing::Instrument::instrument(self, span),
        )
    }
}

impl<F: Future> ActivityInstrument for F {}
