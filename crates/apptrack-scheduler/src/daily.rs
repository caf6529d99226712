//! Daily reminder loop — fires the deadline and result runs at their cron times.
//! Uses tokio::interval for ticking (sleeps between checks).

use std::sync::Arc;

use apptrack_core::config::ReminderConfig;
use chrono::{DateTime, FixedOffset, Utc};

use crate::cron::CronSchedule;
use crate::engine::ReminderScheduler;

/// Which reminder run a job triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Deadlines,
    Results,
}

#[derive(Debug, Clone)]
struct DailyJob {
    kind: JobKind,
    schedule: CronSchedule,
    next_run: Option<DateTime<FixedOffset>>,
}

/// The two recurring reminder jobs and their next fire times.
#[derive(Debug, Clone)]
pub struct DailyJobs {
    offset: FixedOffset,
    jobs: Vec<DailyJob>,
}

impl DailyJobs {
    /// Build from settings, starting the schedule after `now`. Invalid cron
    /// expressions are logged and their job is skipped.
    pub fn from_config(settings: &ReminderConfig, now: DateTime<Utc>) -> Self {
        let offset = settings.offset();
        let local_now = now.with_timezone(&offset);
        let jobs = [
            (JobKind::Deadlines, settings.deadline_cron.as_str()),
            (JobKind::Results, settings.result_cron.as_str()),
        ]
        .into_iter()
        .filter_map(|(kind, expr)| {
            let Some(schedule) = CronSchedule::parse(expr) else {
                tracing::warn!("⚠️ Invalid cron expression '{expr}' for {kind:?}; job skipped");
                return None;
            };
            let next_run = schedule.next_after(local_now);
            Some(DailyJob { kind, schedule, next_run })
        })
        .collect();

        Self { offset, jobs }
    }

    /// Jobs due at `now`; each due job is rescheduled to its next occurrence.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<JobKind> {
        let local_now = now.with_timezone(&self.offset);
        let mut due = Vec::new();
        for job in self.jobs.iter_mut() {
            if job.next_run.is_some_and(|next| local_now >= next) {
                due.push(job.kind);
                job.next_run = job.schedule.next_after(local_now);
            }
        }
        due
    }

    /// Next fire time of a job, if scheduled.
    pub fn next_run(&self, kind: JobKind) -> Option<DateTime<FixedOffset>> {
        self.jobs
            .iter()
            .find(|j| j.kind == kind)
            .and_then(|j| j.next_run)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Spawn-able loop that runs the reminder jobs on schedule, forever.
pub async fn spawn_reminder_loop(scheduler: Arc<ReminderScheduler>) {
    let settings = scheduler.settings().clone();
    let mut jobs = DailyJobs::from_config(&settings, Utc::now());

    if jobs.is_empty() {
        tracing::warn!("⚠️ No valid reminder schedules configured; daily loop not started");
        return;
    }

    tracing::info!(
        "⏰ Reminder loop started (deadlines '{}' next {:?}, results '{}' next {:?}, check every {}s)",
        settings.deadline_cron,
        jobs.next_run(JobKind::Deadlines).map(|t| t.to_rfc3339()),
        settings.result_cron,
        jobs.next_run(JobKind::Results).map(|t| t.to_rfc3339()),
        settings.check_interval_secs
    );

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(settings.check_interval_secs.max(1)));

    loop {
        interval.tick().await;

        for kind in jobs.tick(Utc::now()) {
            let result = match kind {
                JobKind::Deadlines => scheduler.run_deadline_reminders().await,
                JobKind::Results => scheduler.run_result_reminders().await,
            };
            match result {
                Ok(sent) => tracing::info!("📣 [{kind:?}] scheduled run sent {sent} reminder(s)"),
                Err(e) => tracing::error!("❌ [{kind:?}] scheduled run failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 22, h, m, 0).unwrap()
    }

    #[test]
    fn test_default_schedule() {
        let jobs = DailyJobs::from_config(&ReminderConfig::default(), at(7, 0));
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs.next_run(JobKind::Deadlines).unwrap().hour(), 8);
        assert_eq!(jobs.next_run(JobKind::Results).unwrap().hour(), 9);
    }

    #[test]
    fn test_tick_fires_once_per_day() {
        let mut jobs = DailyJobs::from_config(&ReminderConfig::default(), at(7, 0));
        assert!(jobs.tick(at(7, 59)).is_empty());
        assert_eq!(jobs.tick(at(8, 0)), vec![JobKind::Deadlines]);
        assert!(jobs.tick(at(8, 30)).is_empty());
        assert_eq!(jobs.tick(at(9, 1)), vec![JobKind::Results]);

        let next = jobs.next_run(JobKind::Deadlines).unwrap();
        assert_eq!(next.day(), 23);
    }

    #[test]
    fn test_offset_shifts_fire_time() {
        let settings = ReminderConfig {
            utc_offset_minutes: 6 * 60,
            ..ReminderConfig::default()
        };
        let mut jobs = DailyJobs::from_config(&settings, at(0, 0));
        // 08:00 at UTC+6 is 02:00 UTC.
        assert!(jobs.tick(at(1, 59)).is_empty());
        assert_eq!(jobs.tick(at(2, 0)), vec![JobKind::Deadlines]);
    }

    #[test]
    fn test_invalid_cron_skipped() {
        let settings = ReminderConfig {
            result_cron: "nonsense".into(),
            ..ReminderConfig::default()
        };
        let jobs = DailyJobs::from_config(&settings, at(0, 0));
        assert_eq!(jobs.len(), 1);
        assert!(jobs.next_run(JobKind::Results).is_none());
    }
}
