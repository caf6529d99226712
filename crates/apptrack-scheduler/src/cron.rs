//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds)
//! Field syntax: *, */N, N, A-B, A-B/N and comma lists of those.
//! Example: "0 8 * * *" = every day at 8:00
//!
//! Times are evaluated in a fixed UTC offset so "8:00" means 8:00 local.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone};

/// A parsed 5-field cron schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    minutes: Vec<u32>,
    hours: Vec<u32>,
    days_of_month: Vec<u32>,
    months: Vec<u32>,
    /// 0 = Sunday.
    days_of_week: Vec<u32>,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronSchedule {
    /// Parse an expression. Returns `None` (and logs) when invalid.
    pub fn parse(expression: &str) -> Option<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            tracing::warn!(
                "Invalid cron expression: '{}' (need 5 fields: MIN HOUR DOM MON DOW)",
                expression
            );
            return None;
        }

        let schedule = Self {
            expression: expression.to_string(),
            minutes: parse_field(parts[0], 0, 59)?,
            hours: parse_field(parts[1], 0, 23)?,
            days_of_month: parse_field(parts[2], 1, 31)?,
            months: parse_field(parts[3], 1, 12)?,
            // Accept 7 as Sunday too.
            days_of_week: parse_field(parts[4], 0, 7)?
                .into_iter()
                .map(|d| d % 7)
                .collect(),
            dom_restricted: parts[2] != "*",
            dow_restricted: parts[4] != "*",
        };
        Some(schedule)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    fn day_matches(&self, date: chrono::NaiveDate) -> bool {
        if !self.months.contains(&date.month()) {
            return false;
        }
        let dom = self.days_of_month.contains(&date.day());
        let dow = self
            .days_of_week
            .contains(&date.weekday().num_days_from_sunday());
        // Classic cron: when both day fields are restricted, either may match.
        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom || dow,
            _ => dom && dow,
        }
    }

    /// First matching time strictly after `after`, searching up to a year ahead.
    pub fn next_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let tz = after.timezone();
        let start = after.date_naive();

        for offset in 0..=366 {
            let date = start + Duration::days(offset);
            if !self.day_matches(date) {
                continue;
            }
            for &h in &self.hours {
                for &m in &self.minutes {
                    let Some(time) = NaiveTime::from_hms_opt(h, m, 0) else {
                        continue;
                    };
                    let Some(candidate) = tz.from_local_datetime(&date.and_time(time)).single()
                    else {
                        continue;
                    };
                    if candidate > after {
                        return Some(candidate);
                    }
                }
            }
        }

        None
    }
}

/// Convenience: parse and compute the next run in one step.
pub fn next_run_from_cron(
    expression: &str,
    after: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    CronSchedule::parse(expression)?.next_after(after)
}

/// Parse a cron field into a sorted list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let mut values = Vec::new();
    for part in field.split(',') {
        values.extend(parse_part(part.trim(), min, max)?);
    }
    values.sort_unstable();
    values.dedup();
    if values.is_empty() { None } else { Some(values) }
}

fn parse_part(part: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let (range, step) = match part.split_once('/') {
        Some((r, s)) => {
            let n: u32 = s.parse().ok()?;
            if n == 0 {
                return None;
            }
            (r, n)
        }
        None => (part, 1),
    };

    let (lo, hi) = if range == "*" {
        (min, max)
    } else if let Some((a, b)) = range.split_once('-') {
        (a.parse().ok()?, b.parse().ok()?)
    } else {
        let n: u32 = range.parse().ok()?;
        // "N/step" runs from N to the end of the range.
        if step > 1 { (n, max) } else { (n, n) }
    };

    if lo < min || hi > max || lo > hi {
        return None;
    }
    Some((lo..=hi).step_by(step as usize).collect())
}
