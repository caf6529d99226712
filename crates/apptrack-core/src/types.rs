//! Application records and reminder types — the core data model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppTrackError;

/// Kind of opportunity being tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Job,
    Scholarship,
    Internship,
    Exam,
    #[serde(alias = "others")]
    Other,
}

impl Category {
    /// Storage tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Job => "job",
            Self::Scholarship => "scholarship",
            Self::Internship => "internship",
            Self::Exam => "exam",
            Self::Other => "other",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Job => "Job",
            Self::Scholarship => "Scholarship",
            Self::Internship => "Internship",
            Self::Exam => "Exam",
            Self::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = AppTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "job" => Ok(Self::Job),
            "scholarship" => Ok(Self::Scholarship),
            "internship" => Ok(Self::Internship),
            "exam" => Ok(Self::Exam),
            "other" | "others" => Ok(Self::Other),
            other => Err(AppTrackError::Validation(format!("Unknown category: '{other}'"))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an application stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Applied,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    /// Statuses that still get deadline reminders.
    pub const OPEN: [ApplicationStatus; 2] = [Self::Pending, Self::Applied];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Selected => "selected",
            Self::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Applied => "Applied",
            Self::Selected => "Selected",
            Self::Rejected => "Rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = AppTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "applied" => Ok(Self::Applied),
            "selected" => Ok(Self::Selected),
            "rejected" => Ok(Self::Rejected),
            other => Err(AppTrackError::Validation(format!("Unknown status: '{other}'"))),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A tracked application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub title: String,
    /// Company or institution.
    pub organization: String,
    pub category: Category,
    pub deadline: NaiveDate,
    /// Expected result date, if known.
    pub result_date: Option<NaiveDate>,
    pub status: ApplicationStatus,
    /// Free text; empty when unset.
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Days remaining until the deadline (negative once it has passed).
    pub fn days_until_deadline(&self, today: NaiveDate) -> i64 {
        (self.deadline - today).num_days()
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.title, self.organization, self.status.label())
    }
}

/// Input for creating an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplication {
    pub title: String,
    pub organization: String,
    #[serde(default)]
    pub category: Category,
    pub deadline: NaiveDate,
    #[serde(default)]
    pub result_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
}

impl NewApplication {
    pub fn new(title: &str, organization: &str, deadline: NaiveDate) -> Self {
        Self {
            title: title.to_string(),
            organization: organization.to_string(),
            category: Category::default(),
            deadline,
            result_date: None,
            status: ApplicationStatus::default(),
            notes: String::new(),
        }
    }

    pub fn with_status(mut self, status: ApplicationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_result_date(mut self, date: NaiveDate) -> Self {
        self.result_date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    /// Reject blank title or organization.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppTrackError::Validation("title must not be empty".into()));
        }
        if self.organization.trim().is_empty() {
            return Err(AppTrackError::Validation("organization must not be empty".into()));
        }
        Ok(())
    }
}

/// Which date column a due-query matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Deadline,
    ResultDate,
}

impl DateField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Deadline => "deadline",
            Self::ResultDate => "result_date",
        }
    }
}

/// Classification of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    /// Deadline is today.
    Urgent,
    /// Deadline is a few days out.
    Warning,
    /// Result is expected today.
    Result,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Warning => "warning",
            Self::Result => "result",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered notification, ready for a sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}
