#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use activity_log::{ActivityId, ActivityType, Field, Logger, ResultType, Verbosity};

/// Every call a logger received, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Log(Verbosity, String),
    Start {
        id: ActivityId,
        level: Verbosity,
        typ: ActivityType,
        text: String,
        fields: Vec<Field>,
        parent: ActivityId,
    },
    Stop(ActivityId),
    Result(ActivityId, ResultType, Vec<Field>),
}

#[derive(Default)]
pub struct RecordingLogger {
    calls: Mutex<Vec<Call>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Verbosity, msg: &str) {
        self.push(Call::Log(level, msg.to_string()));
    }

    fn start_activity(
        &self,
        id: ActivityId,
        level: Verbosity,
        typ: ActivityType,
        text: &str,
        fields: &[Field],
        parent: ActivityId,
    ) {
        self.push(Call::Start {
            id,
            level,
            typ,
            text: text.to_string(),
            fields: fields.to_vec(),
            parent,
        });
    }

    fn stop_activity(&self, id: ActivityId) {
        self.push(Call::Stop(id));
    }

    fn result(&self, id: ActivityId, typ: ResultType, fields: &[Field]) {
        self.push(Call::Result(id, typ, fields.to_vec()));
    }
}
