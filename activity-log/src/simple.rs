//! Plain text backend.

use std::sync::Arc;

use crate::logger::Logger;
use crate::sink::{self, Sink, write_ignoring_errors};
use crate::types::{ActivityId, ActivityType, Field, ResultType, string_field};
use crate::verbosity::{Verbosity, verbosity};

/// Whether we run under systemd, which wants syslog priority prefixes.
pub fn in_systemd() -> bool {
    std::env::var("IN_SYSTEMD").is_ok_and(|v| v == "1")
}

/// Writes one line per message, filtered by the verbosity threshold.
pub struct SimpleLogger {
    sink: Arc<dyn Sink>,
    systemd: bool,
    tty: bool,
    print_build_logs: bool,
}

impl SimpleLogger {
    /// Logger on stderr, configured from the environment.
    pub fn new() -> Self {
        Self::with_sink(sink::stderr()).systemd(in_systemd())
    }

    pub fn with_sink(sink: Arc<dyn Sink>) -> Self {
        let tty = sink.is_terminal();
        Self {
            sink,
            systemd: false,
            tty,
            print_build_logs: false,
        }
    }

    /// Prefix lines with syslog priorities.
    pub fn systemd(mut self, systemd: bool) -> Self {
        self.systemd = systemd;
        self
    }

    /// Echo build output lines delivered through `result`.
    pub fn print_build_logs(mut self, print_build_logs: bool) -> Self {
        self.print_build_logs = print_build_logs;
        self
    }

    fn systemd_priority(level: Verbosity) -> char {
        match level {
            Verbosity::Error => '3',
            Verbosity::Warn => '4',
            Verbosity::Notice | Verbosity::Info => '5',
            Verbosity::Talkative | Verbosity::Chatty => '6',
            Verbosity::Debug | Verbosity::Vomit => '7',
        }
    }
}

impl Default for SimpleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for SimpleLogger {
    fn log(&self, level: Verbosity, msg: &str) {
        if level > verbosity() {
            return;
        }

        let mut line = String::with_capacity(msg.len() + 4);
        if self.systemd {
            line.push('<');
            line.push(Self::systemd_priority(level));
            line.push('>');
        }
        if self.tty {
            line.push_str(msg);
        } else {
            line.push_str(&console::strip_ansi_codes(msg));
        }
        line.push('\n');

        write_ignoring_errors(self.sink.as_ref(), &line);
    }

    fn start_activity(
        &self,
        _id: ActivityId,
        level: Verbosity,
        _typ: ActivityType,
        text: &str,
        _fields: &[Field],
        _parent: ActivityId,
    ) {
        if level <= verbosity() && !text.is_empty() {
            self.log(level, &format!("{text}..."));
        }
    }

    fn result(&self, _id: ActivityId, typ: ResultType, fields: &[Field]) {
        if !self.print_build_logs {
            return;
        }
        match typ {
            ResultType::BuildLogLine => {
                if let Some(line) = string_field(fields, 0) {
                    self.log(Verbosity::Error, line);
                }
            }
            ResultType::PostBuildLogLine => {
                if let Some(line) = string_field(fields, 0) {
                    self.log(Verbosity::Error, &format!("post-build-hook: {line}"));
                }
            }
            _ => {}
        }
    }

    fn is_verbose(&self) -> bool {
        self.print_build_logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use pretty_assertions::assert_eq;

    fn logger() -> (SimpleLogger, BufferSink) {
        let sink = BufferSink::new();
        (SimpleLogger::with_sink(Arc::new(sink.clone())), sink)
    }

    #[test]
    fn test_log_writes_one_line() {
        let (logger, sink) = logger();
        logger.log(Verbosity::Info, "hello");
        assert_eq!(sink.contents(), "hello\n");
    }

    #[test]
    fn test_log_above_threshold_is_dropped() {
        let (logger, sink) = logger();
        logger.log(Verbosity::Vomit, "noise");
        assert_eq!(sink.contents(), "");
    }

    #[test]
    fn test_ansi_is_stripped_off_terminal() {
        let (logger, sink) = logger();
        logger.log(Verbosity::Error, "\u{1b}[31;1merror:\u{1b}[0m boom");
        assert_eq!(sink.lines(), vec!["error: boom"]);
    }

    #[test]
    fn test_systemd_prefix() {
        let (logger, sink) = logger();
        let logger = logger.systemd(true);
        logger.log(Verbosity::Error, "a");
        logger.log(Verbosity::Warn, "b");
        logger.log(Verbosity::Info, "c");
        assert_eq!(sink.lines(), vec!["<3>a", "<4>b", "<5>c"]);
    }

    #[test]
    fn test_start_activity_announces_text() {
        let (logger, sink) = logger();
        logger.start_activity(1, Verbosity::Info, ActivityType::Download, "fetching x", &[], 0);
        logger.start_activity(2, Verbosity::Info, ActivityType::Build, "", &[], 0);
        logger.start_activity(3, Verbosity::Debug, ActivityType::Build, "hidden", &[], 0);
        logger.stop_activity(1);
        assert_eq!(sink.lines(), vec!["fetching x..."]);
    }

    #[test]
    fn test_build_logs_only_when_enabled() {
        let (quiet, quiet_sink) = logger();
        quiet.result(1, ResultType::BuildLogLine, &[Field::from("compiling")]);
        assert_eq!(quiet_sink.contents(), "");
        assert!(!quiet.is_verbose());

        let (verbose, sink) = logger();
        let verbose = verbose.print_build_logs(true);
        verbose.result(1, ResultType::BuildLogLine, &[Field::from("compiling")]);
        verbose.result(1, ResultType::PostBuildLogLine, &[Field::from("uploading")]);
        verbose.result(1, ResultType::Progress, &[Field::Int(1), Field::Int(2)]);
        verbose.result(1, ResultType::BuildLogLine, &[Field::Int(7)]);
        assert_eq!(sink.lines(), vec!["compiling", "post-build-hook: uploading"]);
        assert!(verbose.is_verbose());
    }
}
