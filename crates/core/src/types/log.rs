//! Structured log events emitted by the sync engine.
//!
//! The engine reports every per-store lifecycle event (start, skip, success,
//! failure) as a [`LogEntry`]. How entries are persisted or displayed is the
//! sink's concern; the engine never waits on durability.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::StoreId;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when parsing an unknown log level name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct LogLevelParseError(pub String);

impl FromStr for LogLevel {
    type Err = LogLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            other => Err(LogLevelParseError(other.to_owned())),
        }
    }
}

/// A structured log event, optionally tagged with the store it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Store the event concerns, for later filtering. Absent for sweep-level
    /// events.
    pub store_id: Option<StoreId>,
    /// Free-form JSON context blob (response bodies, parameters).
    pub context: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create an info-level entry.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Create a warning-level entry.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    /// Create an error-level entry.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            store_id: None,
            context: None,
        }
    }

    /// Tag the entry with a store.
    #[must_use]
    pub const fn store(mut self, store_id: StoreId) -> Self {
        self.store_id = Some(store_id);
        self
    }

    /// Attach a JSON context blob.
    #[must_use]
    pub fn context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}
