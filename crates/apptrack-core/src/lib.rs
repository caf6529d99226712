//! # AppTrack Core
//!
//! Shared building blocks for the application tracker: the `Application`
//! record, reminder kinds, the store and sender traits, configuration and
//! the crate-wide error type.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AppTrackConfig;
pub use error::{AppTrackError, Result};
pub use traits::{ApplicationStore, NotificationSender};
pub use types::{Application, ApplicationStatus, Category, DateField, NewApplication, ReminderKind, RenderedMessage};
