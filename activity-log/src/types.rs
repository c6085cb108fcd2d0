//! Value types shared by activities, loggers and the wire protocol.

use std::fmt::{self, Display, Formatter};

use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};

/// Identifier of an activity. `0` means "no activity".
pub type ActivityId = u64;

/// Parent value used when an activity has no parent.
pub const NO_PARENT: ActivityId = 0;

/// Category of a unit of work.
///
/// Tags that this build does not know about are kept in `Other` so they survive
/// a decode/encode cycle unchanged.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
#[repr(u64)]
pub enum ActivityType {
    Unknown = 0,
    CopyPath = 100,
    Download = 101,
    Realise = 102,
    CopyPaths = 103,
    Builds = 104,
    Build = 105,
    OptimiseStore = 106,
    VerifyPaths = 107,
    Substitute = 108,
    QueryPathInfo = 109,
    PostBuildHook = 110,
    BuildWaiting = 111,
    FetchTree = 112,
    #[num_enum(catch_all)]
    Other(u64),
}

impl ActivityType {
    /// Stable name used by the external JSON format.
    pub fn external_name(self) -> &'static str {
        match self {
            ActivityType::Unknown => "Unknown",
            ActivityType::CopyPath => "CopyPath",
            ActivityType::Download => "Download",
            ActivityType::Realise => "Realise",
            ActivityType::CopyPaths => "CopyPaths",
            ActivityType::Builds => "Builds",
            ActivityType::Build => "Build",
            ActivityType::OptimiseStore => "OptimiseStore",
            ActivityType::VerifyPaths => "VerifyPaths",
            ActivityType::Substitute => "Substitute",
            ActivityType::QueryPathInfo => "QueryPathInfo",
            ActivityType::PostBuildHook => "PostBuildHook",
            ActivityType::BuildWaiting => "BuildWaiting",
            ActivityType::FetchTree => "FetchTree",
            ActivityType::Other(_) => "UnknownActivity",
        }
    }
}

/// Category of a progress update sent to a running activity.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, FromPrimitive, IntoPrimitive, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
#[repr(u64)]
pub enum ResultType {
    FileLinked = 100,
    BuildLogLine = 101,
    UntrustedPath = 102,
    CorruptedPath = 103,
    SetPhase = 104,
    Progress = 105,
    SetExpected = 106,
    PostBuildLogLine = 107,
    FetchStatus = 108,
    #[num_enum(catch_all)]
    Other(u64),
}

impl ResultType {
    /// Stable name used by the external JSON format.
    pub fn external_name(self) -> &'static str {
        match self {
            ResultType::FileLinked => "FileLinked",
            ResultType::BuildLogLine => "BuildLogLine",
            ResultType::UntrustedPath => "UntrustedPath",
            ResultType::CorruptedPath => "CorruptedPath",
            ResultType::SetPhase => "SetPhase",
            ResultType::Progress => "Progress",
            ResultType::SetExpected => "SetExpected",
            ResultType::PostBuildLogLine => "PostBuildLogLine",
            ResultType::FetchStatus => "FetchStatus",
            ResultType::Other(_) => "UnknownResultType",
        }
    }
}

/// A positional value attached to a start or result event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Int(u64),
    String(String),
}

impl Field {
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Field::Int(i) => Some(*i),
            Field::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Int(_) => None,
            Field::String(s) => Some(s),
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Field::Int(i) => write!(f, "{i}"),
            Field::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Int(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Field::String(value)
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Field::String(value.to_string())
    }
}

/// String field at `index`, if present and of the right type.
pub(crate) fn string_field(fields: &[Field], index: usize) -> Option<&str> {
    fields.get(index).and_then(Field::as_str)
}

/// Integer field at `index`, if present and of the right type.
pub(crate) fn int_field(fields: &[Field], index: usize) -> Option<u64> {
    fields.get(index).and_then(Field::as_int)
}
