//! # AppTrack Scheduler
//!
//! Decides which applications need a reminder today, renders the
//! notification and hands it to a sender.
//!
//! ## Architecture
//! ```text
//! Daily loop (tokio interval)          Trigger endpoint / CLI
//!   ├── "0 8 * * *" → deadline run  ─┐        │
//!   └── "0 9 * * *" → result run    ─┴──► ReminderScheduler
//!                                          ├── ApplicationStore (due query)
//!                                          ├── render (subject, text, html)
//!                                          └── NotificationSender (per record, isolated)
//! ```
//!
//! Runs are stateless: every run recomputes "today" and re-queries the store.
//! There is no sent-ledger, so overlapping runs on the same day send twice.

pub mod cron;
pub mod daily;
pub mod engine;
pub mod render;
pub mod report;

pub use daily::{DailyJobs, JobKind, spawn_reminder_loop};
pub use engine::ReminderScheduler;
pub use render::render;
pub use report::{DeliveryOutcome, DeliveryStatus, ReminderReport};
