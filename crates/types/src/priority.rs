//! Request priority classes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Priority class of a read request.
///
/// The class is always known to the harness. Whether it is sent to the
/// backend as a hint depends on the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    High,
    Low,
}

impl PriorityClass {
    /// Both classes, in report order.
    pub const ALL: [PriorityClass; 2] = [PriorityClass::High, PriorityClass::Low];

    /// Value used for the backend's priority header.
    pub fn as_header_value(self) -> &'static str {
        match self {
            PriorityClass::High => "High",
            PriorityClass::Low => "Low",
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, PriorityClass::High)
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityClass::High => write!(f, "high"),
            PriorityClass::Low => write!(f, "low"),
        }
    }
}

impl FromStr for PriorityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(PriorityClass::High),
            "low" => Ok(PriorityClass::Low),
            other => Err(format!("Unknown priority class: {}", other)),
        }
    }
}
