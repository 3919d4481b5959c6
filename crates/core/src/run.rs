//! Run taxonomy.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a sync run was invoked.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Started by an operator from the admin surface.
    Manual,
    /// Started by the recurring schedule.
    Scheduled,
    /// Started as a queued background run.
    Background,
}

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Manual => "manual",
            RunType::Scheduled => "scheduled",
            RunType::Background => "background",
        }
    }
}

impl core::fmt::Display for RunType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown run type: {0}")]
pub struct ParseRunTypeError(String);

impl FromStr for RunType {
    type Err = ParseRunTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(RunType::Manual),
            "scheduled" => Ok(RunType::Scheduled),
            "background" => Ok(RunType::Background),
            other => Err(ParseRunTypeError(other.to_string())),
        }
    }
}
