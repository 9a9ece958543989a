//! Classified result of a single store request.

use std::fmt;

/// Outcome of one request against the store.
///
/// Capacity rejection is an expected result under load, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The store served the request.
    Succeeded,

    /// The store refused the request because the capacity budget was exhausted.
    RejectedForCapacity,

    /// Any other failure: unexpected status, decode failure, transport
    /// error or deadline expiry.
    Failed {
        /// Human-readable reason, logged by the caller.
        reason: String,
    },
}

impl Outcome {
    /// Build a `Failed` outcome from anything displayable.
    pub fn failed(reason: impl fmt::Display) -> Self {
        Outcome::Failed {
            reason: reason.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::RejectedForCapacity)
    }

    /// Classify an HTTP status code.
    ///
    /// Only the status is trusted: 2xx succeeds, 429 is a capacity
    /// rejection, everything else is a failure.
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Outcome::Succeeded,
            429 => Outcome::RejectedForCapacity,
            other => Outcome::failed(format!("unexpected status {}", other)),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded => write!(f, "succeeded"),
            Outcome::RejectedForCapacity => write!(f, "rejected (capacity)"),
            Outcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}
