//! Core types for Shopsync.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod log;
pub mod platform;
pub mod record;

pub use id::*;
pub use log::{LogEntry, LogLevel, LogLevelParseError};
pub use platform::{Platform, PlatformParseError};
pub use record::{NormalizedLineItem, NormalizedOrder, NormalizedProduct};
