//! Append-only text transports that text backends write to.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use console::Term;

/// Where rendered log text ends up.
///
/// Every call must hand the whole string to the underlying stream in one write,
/// so concurrent loggers never interleave inside a line.
pub trait Sink: Send + Sync {
    fn write_str(&self, s: &str) -> io::Result<()>;

    /// Whether the sink is an interactive terminal.
    fn is_terminal(&self) -> bool {
        false
    }
}

impl Sink for Term {
    fn write_str(&self, s: &str) -> io::Result<()> {
        Term::write_str(self, s)?;
        self.flush()
    }

    fn is_terminal(&self) -> bool {
        self.is_term()
    }
}

/// The default transport: unbuffered standard error.
pub fn stderr() -> Arc<dyn Sink> {
    Arc::new(Term::stderr())
}

/// Write to a sink, discarding failures.
///
/// Cleanup code logs on its way out, and has to run to completion even when the
/// other end of stderr is already closed.
pub(crate) fn write_ignoring_errors(sink: &dyn Sink, s: &str) {
    let _ = sink.write_str(s);
}

/// In-memory sink, shared between clones.
#[derive(Clone, Debug, Default)]
pub struct BufferSink {
    buf: Arc<Mutex<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Complete lines written so far, without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sink for BufferSink {
    fn write_str(&self, s: &str) -> io::Result<()> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(s);
        Ok(())
    }
}
