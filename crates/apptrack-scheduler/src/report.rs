//! Per-run delivery bookkeeping.

use apptrack_core::types::ReminderKind;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a single send went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed(String),
}

/// Outcome of one reminder attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub application_id: i64,
    pub title: String,
    pub kind: ReminderKind,
    pub status: DeliveryStatus,
    pub at: DateTime<Utc>,
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// Ordered outcomes of one scheduler run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl ReminderReport {
    /// Successful sends.
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_sent()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Outcomes of one reminder kind.
    pub fn of_kind(&self, kind: ReminderKind) -> impl Iterator<Item = &DeliveryOutcome> {
        self.outcomes.iter().filter(move |o| o.kind == kind)
    }
}
