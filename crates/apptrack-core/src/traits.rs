//! Seams between the reminder scheduler and its collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{Application, ApplicationStatus, DateField, RenderedMessage};

/// Read access to stored applications.
pub trait ApplicationStore: Send + Sync {
    /// Records whose `field` equals `date` exactly and whose status is one of `statuses`.
    /// Records with no value in `field` never match.
    fn find_by_date(
        &self,
        field: DateField,
        date: NaiveDate,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>>;
}

/// Outbound delivery of a rendered notification.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Short name used in logs (e.g. "smtp").
    fn name(&self) -> &str;

    /// Deliver `message` to `to`. Transport failures come back as `Err`.
    async fn send(&self, to: &str, message: &RenderedMessage) -> Result<()>;
}
