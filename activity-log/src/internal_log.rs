//! Wire format for relaying log events over a shared text stream.
//!
//! Each event is one JSON object on one line, prefixed with [`MARKER`] so it can
//! be told apart from ordinary output on the same stream:
//!
//! ```text
//! @nix {"action":"start","id":4294967297,"level":3,"type":105,"text":"building foo"}
//! @nix {"action":"result","id":4294967297,"type":101,"fields":["configuring"]}
//! @nix {"action":"stop","id":4294967297}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, ActivityType, Field, NO_PARENT, ResultType};
use crate::verbosity::Verbosity;

/// Prefix of every structured line.
pub const MARKER: &str = "@nix ";

/// One decoded event. Tags are carried as their numeric values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum InternalLog {
    Msg {
        level: Verbosity,
        msg: String,
    },
    Start {
        id: ActivityId,
        level: Verbosity,
        #[serde(rename = "type")]
        typ: ActivityType,
        text: String,
        #[serde(default, skip_serializing_if = "is_root")]
        parent: ActivityId,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Field>,
    },
    Stop {
        id: ActivityId,
    },
    Result {
        id: ActivityId,
        #[serde(rename = "type")]
        typ: ResultType,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<Field>,
    },
    SetPhase {
        phase: String,
    },
}

fn is_root(parent: &ActivityId) -> bool {
    *parent == NO_PARENT
}

impl InternalLog {
    /// Decode a line.
    ///
    /// Returns `None` for lines without the marker, which are plain text.
    // TODO: assumes UTF-8 encoding
    pub fn parse<T>(line: T) -> Option<serde_json::Result<Self>>
    where
        T: AsRef<str>,
    {
        line.as_ref()
            .strip_prefix(MARKER)
            .map(serde_json::from_str)
    }

    /// Encode as a marker-prefixed line, without a trailing newline.
    pub fn to_line(&self) -> serde_json::Result<String> {
        Ok(format!("{MARKER}{}", serde_json::to_string(self)?))
    }
}

/// The same events with every tag replaced by a stable name.
///
/// Consumers outside this code base can't track numeric tag assignments, so
/// the external format spells them out. Unrecognized tags get a sentinel name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub(crate) enum ExternalLog<'a> {
    Msg {
        level: &'static str,
        msg: &'a str,
    },
    Start {
        id: ActivityId,
        level: &'static str,
        #[serde(rename = "type")]
        typ: &'static str,
        text: &'a str,
        #[serde(skip_serializing_if = "is_root")]
        parent: ActivityId,
        #[serde(skip_serializing_if = "no_fields")]
        fields: &'a [Field],
    },
    Stop {
        id: ActivityId,
    },
    Result {
        id: ActivityId,
        #[serde(rename = "type")]
        typ: &'static str,
        #[serde(skip_serializing_if = "no_fields")]
        fields: &'a [Field],
    },
    SetPhase {
        phase: &'a str,
    },
}

fn no_fields(fields: &&[Field]) -> bool {
    fields.is_empty()
}

impl<'a> From<&'a InternalLog> for ExternalLog<'a> {
    fn from(log: &'a InternalLog) -> Self {
        match log {
            InternalLog::Msg { level, msg } => ExternalLog::Msg {
                level: level.external_name(),
                msg,
            },
            InternalLog::Start {
                id,
                level,
                typ,
                text,
                parent,
                fields,
            } => ExternalLog::Start {
                id: *id,
                level: level.external_name(),
                typ: typ.external_name(),
                text,
                parent: *parent,
                fields,
            },
            InternalLog::Stop { id } => ExternalLog::Stop { id: *id },
            InternalLog::Result { id, typ, fields } => ExternalLog::Result {
                id: *id,
                typ: typ.external_name(),
                fields,
            },
            InternalLog::SetPhase { phase } => ExternalLog::SetPhase { phase },
        }
    }
}
