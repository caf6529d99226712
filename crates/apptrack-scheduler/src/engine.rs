//! Reminder engine — finds due applications and sends their reminders.
//! Each record is delivered in isolation: a failed or hung send is logged,
//! counted as a failure, and the run moves on to the next record.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use apptrack_core::config::ReminderConfig;
use apptrack_core::error::{AppTrackError, Result};
use apptrack_core::traits::{ApplicationStore, NotificationSender};
use apptrack_core::types::{Application, ApplicationStatus, DateField, ReminderKind};
use chrono::{Days, NaiveDate, Utc};

use crate::render::render;
use crate::report::{DeliveryOutcome, DeliveryStatus, ReminderReport};

/// Outcomes kept in memory for the history view.
const HISTORY_LIMIT: usize = 100;

/// The reminder scheduler. Read-only with respect to the store.
pub struct ReminderScheduler {
    store: Arc<dyn ApplicationStore>,
    sender: Arc<dyn NotificationSender>,
    recipient: String,
    settings: ReminderConfig,
    history: Mutex<VecDeque<DeliveryOutcome>>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        sender: Arc<dyn NotificationSender>,
        recipient: impl Into<String>,
        settings: ReminderConfig,
    ) -> Self {
        Self {
            store,
            sender,
            recipient: recipient.into(),
            settings,
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    pub fn settings(&self) -> &ReminderConfig {
        &self.settings
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Today in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        self.settings.today()
    }

    /// Send today's deadline reminders. Returns the number of successful sends.
    pub async fn run_deadline_reminders(&self) -> Result<usize> {
        let report = self.deadline_report(self.today()).await?;
        Ok(report.sent())
    }

    /// Send today's result reminders. Returns the number of successful sends.
    pub async fn run_result_reminders(&self) -> Result<usize> {
        let report = self.result_report(self.today()).await?;
        Ok(report.sent())
    }

    /// Deadline reminders as of `today`: urgent for deadlines today, warning
    /// for deadlines `warning_days` out. Both queries run before any send, so
    /// a store failure aborts the run without a partial batch.
    pub async fn deadline_report(&self, today: NaiveDate) -> Result<ReminderReport> {
        self.settings.validate()?;
        let warning_day = u64::try_from(self.settings.warning_days)
            .ok()
            .and_then(|days| today.checked_add_days(Days::new(days)))
            .ok_or_else(|| {
                AppTrackError::Config(format!(
                    "warning date out of range: {today} + {} days",
                    self.settings.warning_days
                ))
            })?;

        let due_today =
            self.store
                .find_by_date(DateField::Deadline, today, &ApplicationStatus::OPEN)?;
        let due_soon =
            self.store
                .find_by_date(DateField::Deadline, warning_day, &ApplicationStatus::OPEN)?;

        tracing::info!(
            "🔔 Deadline reminders for {today}: {} urgent, {} warning",
            due_today.len(),
            due_soon.len()
        );

        let mut report = ReminderReport::default();
        for app in &due_today {
            report
                .outcomes
                .push(self.deliver(app, ReminderKind::Urgent, today).await);
        }
        for app in &due_soon {
            report
                .outcomes
                .push(self.deliver(app, ReminderKind::Warning, today).await);
        }

        tracing::info!(
            "✅ Deadline reminder job complete. Sent {} email(s), {} failed.",
            report.sent(),
            report.failed()
        );
        Ok(report)
    }

    /// Result reminders as of `today`: result date today and status applied.
    pub async fn result_report(&self, today: NaiveDate) -> Result<ReminderReport> {
        let due = self.store.find_by_date(
            DateField::ResultDate,
            today,
            &[ApplicationStatus::Applied],
        )?;

        tracing::info!("🔔 Result reminders for {today}: {} due", due.len());

        let mut report = ReminderReport::default();
        for app in &due {
            report
                .outcomes
                .push(self.deliver(app, ReminderKind::Result, today).await);
        }

        tracing::info!(
            "✅ Result reminder job complete. Sent {} email(s), {} failed.",
            report.sent(),
            report.failed()
        );
        Ok(report)
    }

    /// Render and send one reminder. Never fails: errors become a failed outcome.
    async fn deliver(&self, app: &Application, kind: ReminderKind, today: NaiveDate) -> DeliveryOutcome {
        let message = render(app, kind, today);
        let limit = Duration::from_secs(self.settings.send_timeout_secs.max(1));

        let status = match tokio::time::timeout(limit, self.sender.send(&self.recipient, &message)).await {
            Ok(Ok(())) => {
                tracing::info!("📤 Sent {kind} reminder for: {}", app.title);
                DeliveryStatus::Sent
            }
            Ok(Err(e)) => {
                tracing::error!("❌ Failed to send {kind} reminder for {}: {e}", app.title);
                DeliveryStatus::Failed(e.to_string())
            }
            Err(_) => {
                tracing::error!(
                    "⏱️ {} send timed out after {}s for {} ({kind})",
                    self.sender.name(),
                    limit.as_secs(),
                    app.title
                );
                DeliveryStatus::Failed(format!("timed out after {}s", limit.as_secs()))
            }
        };

        let outcome = DeliveryOutcome {
            application_id: app.id,
            title: app.title.clone(),
            kind,
            status,
            at: Utc::now(),
        };
        self.record(outcome.clone());
        outcome
    }

    fn record(&self, outcome: DeliveryOutcome) {
        let Ok(mut history) = self.history.lock() else {
            tracing::warn!("⚠️ Reminder history lock poisoned; outcome not recorded");
            return;
        };
        if history.len() >= HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(outcome);
    }

    /// Recent delivery outcomes, oldest first.
    pub fn history(&self) -> Vec<DeliveryOutcome> {
        self.history
            .lock()
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}
