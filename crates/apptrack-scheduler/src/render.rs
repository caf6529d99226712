//! Reminder rendering — subject, plain-text body and HTML body for one record.
//! Pure functions: no I/O, never fail.

use apptrack_core::types::{Application, ReminderKind, RenderedMessage};
use chrono::NaiveDate;

const DISPLAY_DATE: &str = "%B %d, %Y";

const FOOTER: &str = "This is an automated reminder from your Application Tracker.";

/// Render the notification for `app` as a `kind` reminder on `today`.
pub fn render(app: &Application, kind: ReminderKind, today: NaiveDate) -> RenderedMessage {
    RenderedMessage {
        subject: subject(app, kind, today),
        text: plain_body(app, kind, today),
        html: html_body(app, kind, today),
    }
}

fn subject(app: &Application, kind: ReminderKind, today: NaiveDate) -> String {
    match kind {
        ReminderKind::Urgent => format!(
            "🚨 URGENT: {} deadline is TODAY! Only 12 hours left!",
            app.title
        ),
        ReminderKind::Warning => format!(
            "⏰ Reminder: {} deadline in {}",
            app.title,
            days_phrase(app.days_until_deadline(today))
        ),
        ReminderKind::Result => format!("📊 Result expected today: {}", app.title),
    }
}

/// Headline shown at the top of both bodies.
fn headline(app: &Application, kind: ReminderKind, today: NaiveDate) -> String {
    match kind {
        ReminderKind::Urgent => "Deadline TODAY - ONLY 12 HOURS LEFT".to_string(),
        ReminderKind::Warning => format!(
            "Deadline in {}",
            days_phrase(app.days_until_deadline(today))
        ),
        ReminderKind::Result => "Result expected today".to_string(),
    }
}

fn days_phrase(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

/// Label and value of the date the reminder is about.
fn key_date(app: &Application, kind: ReminderKind) -> (&'static str, String) {
    match (kind, app.result_date) {
        (ReminderKind::Result, Some(date)) => ("Result date", date.format(DISPLAY_DATE).to_string()),
        _ => ("Deadline", app.deadline.format(DISPLAY_DATE).to_string()),
    }
}

fn plain_body(app: &Application, kind: ReminderKind, today: NaiveDate) -> String {
    let (date_label, date_value) = key_date(app, kind);
    let mut lines = vec![
        format!("Application Reminder - {}", headline(app, kind, today)),
        String::new(),
        format!("Title: {}", app.title),
        format!("Organization: {}", app.organization),
        format!("Category: {}", app.category.label()),
        format!("{date_label}: {date_value}"),
        format!("Status: {}", app.status.label()),
    ];
    if !app.notes.is_empty() {
        lines.push(format!("Notes: {}", app.notes));
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(FOOTER.to_string());
    lines.join("\n")
}

fn header_background(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::Urgent => "linear-gradient(135deg, #dc2626 0%, #991b1b 100%)",
        ReminderKind::Warning => "linear-gradient(135deg, #f59e0b 0%, #d97706 100%)",
        ReminderKind::Result => "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
    }
}

fn html_field(label: &str, value_html: &str) -> String {
    format!(
        "<div class=\"field\"><div class=\"label\">{label}</div><div class=\"value\">{value_html}</div></div>"
    )
}

fn html_body(app: &Application, kind: ReminderKind, today: NaiveDate) -> String {
    let (date_label, date_value) = key_date(app, kind);
    let mut fields = vec![
        html_field("Title", &escape_html(&app.title)),
        html_field("Organization", &escape_html(&app.organization)),
        html_field("Category", app.category.label()),
        html_field(
            date_label,
            &format!("<span class=\"urgency\">{}</span>", escape_html(&date_value)),
        ),
        html_field(
            "Status",
            &format!(
                "<span class=\"status status-{}\">{}</span>",
                app.status.as_str(),
                app.status.label()
            ),
        ),
    ];
    if !app.notes.is_empty() {
        fields.push(html_field("Notes", &escape_html(&app.notes)));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
  body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
  .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
  .header {{ background: {background}; color: white; padding: 20px; border-radius: 10px 10px 0 0; }}
  .content {{ background: #f9f9f9; padding: 20px; border-radius: 0 0 10px 10px; }}
  .field {{ margin-bottom: 15px; }}
  .label {{ font-weight: bold; color: #555; }}
  .status {{ display: inline-block; padding: 5px 15px; border-radius: 20px; font-size: 14px; }}
  .status-pending {{ background: #fef3c7; color: #92400e; }}
  .status-applied {{ background: #dbeafe; color: #1e40af; }}
  .status-selected {{ background: #d1fae5; color: #065f46; }}
  .status-rejected {{ background: #fee2e2; color: #991b1b; }}
  .urgency {{ font-size: 18px; color: #dc2626; font-weight: bold; }}
</style>
</head>
<body>
<div class="container">
  <div class="header">
    <h1 style="margin: 0;">Application Reminder</h1>
    <p style="margin: 10px 0 0 0; opacity: 0.9;">{headline}</p>
  </div>
  <div class="content">
    {fields}
  </div>
  <p style="color: #888; font-size: 12px;">{footer}</p>
</div>
</body>
</html>"#,
        background = header_background(kind),
        headline = escape_html(&headline(app, kind, today)),
        fields = fields.join("\n    "),
        footer = FOOTER,
    )
}

/// Escape text for inclusion in HTML.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
