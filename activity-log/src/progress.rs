//! Single status line renderer for interactive terminals.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::logger::Logger;
use crate::sink::{self, Sink, write_ignoring_errors};
use crate::types::{ActivityId, ActivityType, Field, ResultType, int_field, string_field};
use crate::verbosity::{Verbosity, verbosity};

const CLEAR_LINE: &str = "\r\u{1b}[K";

#[derive(Debug, Default)]
struct ActInfo {
    text: String,
    phase: Option<String>,
    last_line: Option<String>,
    done: u64,
    expected: u64,
    running: u64,
    failed: u64,
}

#[derive(Debug)]
struct State {
    // Ids increase monotonically, so the last entry is the newest activity.
    activities: BTreeMap<ActivityId, ActInfo>,
    active: bool,
}

/// Keeps one status line at the bottom of the terminal describing the newest
/// running activity, and prints log messages above it.
///
/// When the sink is not a terminal no status line is drawn and messages are
/// written as plain lines.
pub struct ProgressBar {
    state: Mutex<State>,
    sink: Arc<dyn Sink>,
    redraw: bool,
    width: Option<usize>,
    print_build_logs: bool,
}

impl ProgressBar {
    /// Progress bar on stderr.
    pub fn new() -> Self {
        let mut bar = Self::with_sink(sink::stderr());
        bar.width = console::Term::stderr()
            .size_checked()
            .map(|(_, cols)| usize::from(cols));
        bar
    }

    pub fn with_sink(sink: Arc<dyn Sink>) -> Self {
        let redraw = sink.is_terminal();
        Self {
            state: Mutex::new(State {
                activities: BTreeMap::new(),
                active: true,
            }),
            sink,
            redraw,
            width: None,
            print_build_logs: false,
        }
    }

    /// Print build output above the status line instead of only showing its last line.
    pub fn print_build_logs(mut self, print_build_logs: bool) -> Self {
        self.print_build_logs = print_build_logs;
        self
    }

    /// Erase the status line and stop drawing.
    pub fn stop(&self) {
        let mut state = self.lock();
        if !state.active {
            return;
        }
        state.active = false;
        if self.redraw {
            write_ignoring_errors(self.sink.as_ref(), CLEAR_LINE);
        }
    }

    /// The status line as it would currently be drawn.
    pub fn status(&self) -> String {
        let state = self.lock();
        self.render(&state)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self, state: &State) -> String {
        let Some(info) = state.activities.values().rev().find(|i| !i.text.is_empty()) else {
            return String::new();
        };

        let mut line = String::new();
        if info.expected > 0 {
            line.push_str(&format!("[{}/{}", info.done, info.expected));
            if info.running > 0 {
                line.push_str(&format!(" running {}", info.running));
            }
            if info.failed > 0 {
                line.push_str(&format!(" failed {}", info.failed));
            }
            line.push_str("] ");
        }
        line.push_str(&info.text);
        if let Some(phase) = &info.phase {
            line.push_str(&format!(" ({phase})"));
        }
        if let Some(last) = &info.last_line {
            line.push_str(": ");
            line.push_str(last);
        }

        match self.width {
            Some(width) => console::truncate_str(&line, width, "").into_owned(),
            None => line,
        }
    }

    /// Write `above` as a full line, then redraw the status line.
    ///
    /// After [`stop`](Self::stop) only `above` is written.
    fn draw(&self, state: &State, above: Option<&str>) {
        let redraw = self.redraw && state.active;

        let mut out = String::new();
        if redraw {
            out.push_str(CLEAR_LINE);
        }
        if let Some(msg) = above {
            if self.redraw {
                out.push_str(msg);
            } else {
                out.push_str(&console::strip_ansi_codes(msg));
            }
            out.push('\n');
        }
        if redraw {
            out.push_str(&self.render(state));
        }
        if !out.is_empty() {
            write_ignoring_errors(self.sink.as_ref(), &out);
        }
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Logger for ProgressBar {
    fn log(&self, level: Verbosity, msg: &str) {
        if level > verbosity() {
            return;
        }
        let state = self.lock();
        self.draw(&state, Some(msg));
    }

    fn start_activity(
        &self,
        id: ActivityId,
        _level: Verbosity,
        _typ: ActivityType,
        text: &str,
        _fields: &[Field],
        _parent: ActivityId,
    ) {
        let mut state = self.lock();
        state.activities.insert(
            id,
            ActInfo {
                text: text.to_string(),
                ..ActInfo::default()
            },
        );
        self.draw(&state, None);
    }

    fn stop_activity(&self, id: ActivityId) {
        let mut state = self.lock();
        if state.activities.remove(&id).is_some() {
            self.draw(&state, None);
        }
    }

    fn result(&self, id: ActivityId, typ: ResultType, fields: &[Field]) {
        let mut state = self.lock();
        let Some(info) = state.activities.get_mut(&id) else {
            return;
        };

        let mut above = None;
        match typ {
            ResultType::BuildLogLine | ResultType::PostBuildLogLine => {
                let Some(line) = string_field(fields, 0) else {
                    return;
                };
                let line = line.trim_end();
                if self.print_build_logs {
                    above = Some(format!("{}> {line}", info.text));
                } else if !line.is_empty() {
                    info.last_line = Some(console::strip_ansi_codes(line).into_owned());
                }
            }
            ResultType::SetPhase => {
                info.phase = string_field(fields, 0).map(str::to_string);
            }
            ResultType::Progress => {
                info.done = int_field(fields, 0).unwrap_or(0);
                info.expected = int_field(fields, 1).unwrap_or(0);
                info.running = int_field(fields, 2).unwrap_or(0);
                info.failed = int_field(fields, 3).unwrap_or(0);
            }
            _ => return,
        }

        self.draw(&state, above.as_deref());
    }

    fn is_verbose(&self) -> bool {
        self.print_build_logs
    }
}
