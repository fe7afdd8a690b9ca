//! Control command encoding.
//!
//! Devices never accept pushed writes; they poll the bridge and the
//! bridge answers with an encrypted heartbeat line carrying the target
//! comfort level and operating mode.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandEncodeError {
    #[error("comfort level {0} out of range 1..=5")]
    ComfortOutOfRange(u8),
    #[error("operating mode {0} out of range 1..=4")]
    ModeOutOfRange(u8),
}

/// A validated setpoint pair for one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommand {
    comfort_level: u8,
    operating_mode: u8,
}

impl DeviceCommand {
    pub fn new(comfort_level: u8, operating_mode: u8) -> Result<Self, CommandEncodeError> {
        if !(1..=5).contains(&comfort_level) {
            return Err(CommandEncodeError::ComfortOutOfRange(comfort_level));
        }
        if !(1..=4).contains(&operating_mode) {
            return Err(CommandEncodeError::ModeOutOfRange(operating_mode));
        }
        Ok(Self {
            comfort_level,
            operating_mode,
        })
    }

    pub fn comfort_level(&self) -> u8 {
        self.comfort_level
    }

    pub fn operating_mode(&self) -> u8 {
        self.operating_mode
    }

    /// The plaintext heartbeat line the device expects, newline
    /// terminated. The `11` literal is a fixed protocol marker.
    pub fn to_heartbeat(&self) -> String {
        format!(
            "heart__beat11{}{}\n",
            self.comfort_level, self.operating_mode
        )
    }

    /// Whether a reported comfort/mode pair confirms this command.
    /// Devices report mode 0 while idling in automatic, which counts
    /// as mode 1 for acknowledgement purposes.
    pub fn matches_report(&self, comfort_level: i64, operating_mode: i64) -> bool {
        let reported_mode = if operating_mode == 0 { 1 } else { operating_mode };
        i64::from(self.comfort_level) == comfort_level
            && i64::from(self.operating_mode) == reported_mode
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "comfort={} mode={}",
            self.comfort_level, self.operating_mode
        )
    }
}
