//! Log levels and the process-wide verbosity threshold.

use std::sync::atomic::{AtomicU8, Ordering};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::{ConfigError, ConfigResult};

/// Severity of a message or activity.
///
/// Lower values are more severe. A message is shown when its level is at or
/// below the current threshold, so `Error` is always shown.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize_repr,
    Deserialize_repr,
    TryFromPrimitive,
    IntoPrimitive,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Verbosity {
    Error = 0,
    Warn = 1,
    Notice = 2,
    #[default]
    Info = 3,
    Talkative = 4,
    Chatty = 5,
    Debug = 6,
    Vomit = 7,
}

static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Info as u8);

/// Current process-wide threshold.
pub fn verbosity() -> Verbosity {
    Verbosity::try_from(VERBOSITY.load(Ordering::Relaxed)).unwrap_or_default()
}

/// Replace the process-wide threshold.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level.into(), Ordering::Relaxed);
}

/// Parse a level name and make it the threshold.
pub fn set_verbosity_str(name: &str) -> ConfigResult<()> {
    let level = name
        .parse::<Verbosity>()
        .map_err(|_| ConfigError::InvalidVerbosity(name.to_string()))?;
    set_verbosity(level);
    Ok(())
}

impl Verbosity {
    /// Whether a message at this level passes the current threshold.
    pub fn is_enabled(self) -> bool {
        self <= verbosity()
    }

    /// One step more verbose, saturating at `Vomit`.
    pub fn increase(self) -> Self {
        Self::try_from(u8::from(self) + 1).unwrap_or(Verbosity::Vomit)
    }

    /// One step quieter, saturating at `Error`.
    pub fn decrease(self) -> Self {
        u8::from(self)
            .checked_sub(1)
            .and_then(|v| Self::try_from(v).ok())
            .unwrap_or(Verbosity::Error)
    }

    /// Stable name used by the external JSON format.
    pub fn external_name(self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Notice => "notice",
            Verbosity::Info => "info",
            Verbosity::Talkative => "talkative",
            Verbosity::Chatty => "chatty",
            Verbosity::Debug => "debug",
            Verbosity::Vomit => "vomit",
        }
    }
}
