//! Record Status Definitions
//!
//! Deposits and transfers share one three-state lifecycle. Status IDs are
//! stored as SMALLINT in PostgreSQL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle of a deposit or transfer.
///
/// ```text
/// PENDING ──gateway success──▶ COMPLETED
///    │
///    └──gateway failed/reversed──▶ FAILED
/// ```
///
/// Terminal states are idempotent sinks: no transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum RecordStatus {
    /// Awaiting gateway confirmation
    Pending = 0,

    /// Terminal: settled
    Completed = 10,

    /// Terminal: declined, failed or reversed by the gateway
    Failed = -10,
}

impl RecordStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Completed | RecordStatus::Failed)
    }

    /// Whether `self -> next` is a legal transition
    #[inline]
    pub fn can_transition_to(&self, next: RecordStatus) -> bool {
        matches!(
            (self, next),
            (RecordStatus::Pending, RecordStatus::Completed)
                | (RecordStatus::Pending, RecordStatus::Failed)
        )
    }

    /// Numeric state ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL state ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(RecordStatus::Pending),
            10 => Some(RecordStatus::Completed),
            -10 => Some(RecordStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Completed => "completed",
            RecordStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RecordStatus::Pending),
            "completed" => Ok(RecordStatus::Completed),
            "failed" => Ok(RecordStatus::Failed),
            _ => Err(format!("Invalid record status: {}", s)),
        }
    }
}
