//! Alarm state shared with the alarm watchdog.
//!
//! The watchdog writes a single character to a state file: `0` when the
//! alarm is disarmed, `1` when it is armed. This module only reads it.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Whether the house alarm is currently armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    /// File holds `0`
    Inactive,
    /// File holds `1`
    Active,
    /// File is unreadable or holds anything else
    Unknown,
}

impl AlarmState {
    /// Parses the state file contents.
    pub fn parse(contents: &str) -> AlarmState {
        match contents.trim() {
            "0" => AlarmState::Inactive,
            "1" => AlarmState::Active,
            _ => AlarmState::Unknown,
        }
    }

    /// Reads the alarm state from the given file.
    pub fn read(path: &Path) -> Result<AlarmState> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read alarm state file: {:?}", path))?;
        Ok(Self::parse(&contents))
    }

    /// Reads the alarm state, logging and falling back to `Unknown` on error.
    pub fn read_or_unknown(path: &Path) -> AlarmState {
        match Self::read(path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "Alarm state unknown");
                AlarmState::Unknown
            }
        }
    }

    /// True only for an explicit `1`.
    pub fn is_active(&self) -> bool {
        *self == AlarmState::Active
    }

    /// True only for an explicit `0`.
    pub fn is_inactive(&self) -> bool {
        *self == AlarmState::Inactive
    }
}
