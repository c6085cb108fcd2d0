//! JSON backends: encode every call as a wire line and hand it to an inner logger.

use std::sync::Arc;

use crate::internal_log::{ExternalLog, InternalLog, MARKER};
use crate::logger::Logger;
use crate::types::{ActivityId, ActivityType, Field, ResultType};
use crate::verbosity::Verbosity;

/// How tags are written on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// Raw numeric tags, for a reader built from this same code base.
    Internal,
    /// Stable string names, for third-party readers.
    External,
}

/// Decorator that serializes events instead of rendering them.
///
/// Lines go to the inner logger at `Error` level so no threshold can drop them;
/// the reader decides what to show.
pub struct JsonLogger {
    inner: Arc<dyn Logger>,
    format: WireFormat,
}

impl JsonLogger {
    pub fn new(inner: Arc<dyn Logger>, format: WireFormat) -> Self {
        Self { inner, format }
    }

    pub fn internal(inner: Arc<dyn Logger>) -> Self {
        Self::new(inner, WireFormat::Internal)
    }

    pub fn external(inner: Arc<dyn Logger>) -> Self {
        Self::new(inner, WireFormat::External)
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    fn write(&self, log: &InternalLog) {
        let json = match self.format {
            WireFormat::Internal => serde_json::to_string(log),
            WireFormat::External => serde_json::to_string(&ExternalLog::from(log)),
        };
        match json {
            Ok(json) => self.inner.log(Verbosity::Error, &format!("{MARKER}{json}")),
            Err(e) => tracing::debug!(target: "activity_log", "failed to encode log event: {e}"),
        }
    }
}

impl Logger for JsonLogger {
    fn log(&self, level: Verbosity, msg: &str) {
        self.write(&InternalLog::Msg {
            level,
            msg: msg.to_string(),
        });
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
        self.write(&InternalLog::Start {
            id,
            level,
            typ,
            text: text.to_string(),
            parent,
            fields: fields.to_vec(),
        });
    }

    fn stop_activity(&self, id: ActivityId) {
        self.write(&InternalLog::Stop { id });
    }

    fn result(&self, id: ActivityId, typ: ResultType, fields: &[Field]) {
        self.write(&InternalLog::Result {
            id,
            typ,
            fields: fields.to_vec(),
        });
    }

    fn is_verbose(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simple::SimpleLogger;
    use crate::sink::BufferSink;
    use pretty_assertions::assert_eq;

    fn json_logger(format: WireFormat) -> (JsonLogger, BufferSink) {
        let sink = BufferSink::new();
        let inner = Arc::new(SimpleLogger::with_sink(Arc::new(sink.clone())));
        (JsonLogger::new(inner, format), sink)
    }

    #[test]
    fn test_internal_msg() {
        let (logger, sink) = json_logger(WireFormat::Internal);
        logger.log(Verbosity::Error, "x");
        assert_eq!(
            sink.lines(),
            vec![r#"@nix {"action":"msg","level":0,"msg":"x"}"#]
        );
    }

    #[test]
    fn test_messages_above_threshold_still_encoded() {
        let (logger, sink) = json_logger(WireFormat::Internal);
        logger.log(Verbosity::Vomit, "chatter");
        assert_eq!(
            sink.lines(),
            vec![r#"@nix {"action":"msg","level":7,"msg":"chatter"}"#]
        );
    }

    #[test]
    fn test_internal_activity_lines() {
        let (logger, sink) = json_logger(WireFormat::Internal);
        logger.start_activity(
            42,
            Verbosity::Info,
            ActivityType::Build,
            "",
            &[Field::from("/drv/foo.drv")],
            7,
        );
        logger.result(42, ResultType::Progress, &[Field::Int(1), Field::Int(2)]);
        logger.stop_activity(42);
        assert_eq!(
            sink.lines(),
            vec![
                r#"@nix {"action":"start","id":42,"level":3,"type":105,"text":"","parent":7,"fields":["/drv/foo.drv"]}"#,
                r#"@nix {"action":"result","id":42,"type":105,"fields":[1,2]}"#,
                r#"@nix {"action":"stop","id":42}"#,
            ]
        );
    }

    #[test]
    fn test_external_uses_names() {
        let (logger, sink) = json_logger(WireFormat::External);
        logger.log(Verbosity::Notice, "hi");
        logger.start_activity(1, Verbosity::Talkative, ActivityType::Download, "fetching", &[], 0);
        logger.result(1, ResultType::SetPhase, &[Field::from("unpack")]);
        assert_eq!(
            sink.lines(),
            vec![
                r#"@nix {"action":"msg","level":"notice","msg":"hi"}"#,
                r#"@nix {"action":"start","id":1,"level":"talkative","type":"Download","text":"fetching"}"#,
                r#"@nix {"action":"result","id":1,"type":"SetPhase","fields":["unpack"]}"#,
            ]
        );
    }

    #[test]
    fn test_external_unknown_activity_type() {
        let (logger, sink) = json_logger(WireFormat::External);
        logger.start_activity(3, Verbosity::Info, ActivityType::Other(999), "future", &[], 0);
        assert_eq!(
            sink.lines(),
            vec![
                r#"@nix {"action":"start","id":3,"level":"info","type":"UnknownActivity","text":"future"}"#
            ]
        );
    }

    #[test]
    fn test_is_verbose() {
        let (logger, _sink) = json_logger(WireFormat::Internal);
        assert!(logger.is_verbose());
    }
}
