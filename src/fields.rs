//! Enumerations and field types for task management.
//!
//! `Priority` is persisted as its ordinal (0 = Low, 1 = Medium, 2 = High) and
//! orders Low < Medium < High. `SortKey` names the orderings `list` accepts.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task priority, ordered Low < Medium < High.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn ordinal(self) -> i64 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl From<Priority> for i64 {
    fn from(p: Priority) -> i64 {
        p.ordinal()
    }
}

impl TryFrom<i64> for Priority {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Medium),
            2 => Ok(Priority::High),
            other => Err(format!("priority must be 0, 1 or 2, got {other}")),
        }
    }
}

/// Accepts either the ordinal ("0".."2") or the name, case-insensitively.
impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Priority::try_from(n);
        }
        match s.to_lowercase().as_str() {
            "low" | "l" => Ok(Priority::Low),
            "medium" | "med" | "m" => Ok(Priority::Medium),
            "high" | "h" => Ok(Priority::High),
            _ => Err(format!("unknown priority '{s}' (use 0/1/2 or low/medium/high)")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Available sorting options for task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Priority,
    Due,
    Category,
}

impl SortKey {
    /// Lenient parse used by the interactive menu: anything unrecognised
    /// (including an empty answer) means "keep insertion order".
    pub fn parse_lenient(s: &str) -> Option<SortKey> {
        <SortKey as ValueEnum>::from_str(s.trim(), true).ok()
    }
}
