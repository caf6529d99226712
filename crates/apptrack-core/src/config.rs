//! AppTrack configuration system.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppTrackError, Result};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppTrackConfig {
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppTrackConfig {
    /// Load config from the default path (~/.apptrack/config.toml), then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppTrackError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AppTrackError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the reminder runs cannot honour.
    pub fn validate(&self) -> Result<()> {
        self.reminders.validate()
    }

    /// Save config to a path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppTrackError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the AppTrack home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".apptrack")
    }

    /// Override settings from process environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Override settings from an arbitrary variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("EMAIL_HOST") {
            self.mail.host = v;
        }
        if let Some(v) = get("EMAIL_PORT") {
            match v.parse() {
                Ok(port) => self.mail.port = port,
                Err(_) => tracing::warn!("⚠️ Ignoring invalid EMAIL_PORT: '{v}'"),
            }
        }
        if let Some(v) = get("EMAIL_HOST_USER") {
            self.mail.username = v;
        }
        if let Some(v) = get("EMAIL_HOST_PASSWORD") {
            self.mail.password = v;
        }
        if let Some(v) = get("EMAIL_USE_TLS") {
            self.mail.use_tls = parse_flag(&v);
        }
        if let Some(v) = get("EMAIL_USE_SSL") {
            self.mail.use_ssl = parse_flag(&v);
        }
        if let Some(v) = get("ADMIN_EMAIL") {
            self.reminders.admin_email = v;
        }
        if let Some(v) = get("CRON_SECRET_TOKEN") {
            self.reminders.cron_secret = v;
        }
        if let Some(v) = get("APPTRACK_DB_PATH") {
            self.database.path = v;
        }
    }
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Outbound SMTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// STARTTLS on a plain connection.
    #[serde(default = "bool_true")]
    pub use_tls: bool,
    /// Implicit TLS (usually port 465). Takes precedence over `use_tls`.
    #[serde(default)]
    pub use_ssl: bool,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String { "smtp.gmail.com".into() }
fn default_smtp_port() -> u16 { 587 }
fn default_from_name() -> String { "Application Tracker".into() }
fn bool_true() -> bool { true }

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            use_tls: true,
            use_ssl: false,
            from_name: default_from_name(),
        }
    }
}

/// Reminder scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Recipient for every reminder. Falls back to the SMTP username.
    #[serde(default)]
    pub admin_email: String,
    /// Shared secret for the trigger endpoint. Empty disables the endpoint.
    #[serde(default)]
    pub cron_secret: String,
    #[serde(default = "default_deadline_cron")]
    pub deadline_cron: String,
    #[serde(default = "default_result_cron")]
    pub result_cron: String,
    /// Lead time for the early-warning reminder.
    #[serde(default = "default_warning_days")]
    pub warning_days: i64,
    /// Offset from UTC used to decide what "today" is.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// How often the daily loop checks its cron schedule.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_deadline_cron() -> String { "0 8 * * *".into() }
fn default_result_cron() -> String { "0 9 * * *".into() }
fn default_warning_days() -> i64 { 3 }

/// Accepted range for `warning_days`.
pub const WARNING_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=365;
fn default_send_timeout() -> u64 { 30 }
fn default_check_interval() -> u64 { 30 }

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            admin_email: String::new(),
            cron_secret: String::new(),
            deadline_cron: default_deadline_cron(),
            result_cron: default_result_cron(),
            warning_days: default_warning_days(),
            utc_offset_minutes: 0,
            send_timeout_secs: default_send_timeout(),
            check_interval_secs: default_check_interval(),
        }
    }
}

impl ReminderConfig {
    pub fn validate(&self) -> Result<()> {
        if !WARNING_DAYS_RANGE.contains(&self.warning_days) {
            return Err(AppTrackError::Config(format!(
                "reminders.warning_days must be between {} and {}, got {}",
                WARNING_DAYS_RANGE.start(),
                WARNING_DAYS_RANGE.end(),
                self.warning_days
            )));
        }
        Ok(())
    }

    /// The configured local timezone as a fixed offset (UTC when out of range).
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Today's date in the configured timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }

    /// Recipient address, falling back to the SMTP user.
    pub fn recipient<'a>(&'a self, mail: &'a MailConfig) -> &'a str {
        if self.admin_email.trim().is_empty() {
            &mail.username
        } else {
            &self.admin_email
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 8000 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.apptrack/apptrack.db".into() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppTrackConfig::default();
        assert_eq!(config.mail.host, "smtp.gmail.com");
        assert_eq!(config.mail.port, 587);
        assert!(config.mail.use_tls);
        assert_eq!(config.reminders.deadline_cron, "0 8 * * *");
        assert_eq!(config.reminders.result_cron, "0 9 * * *");
        assert_eq!(config.reminders.warning_days, 3);
        assert!(config.reminders.cron_secret.is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [mail]
            host = "smtp.example.com"
            port = 465
            use_ssl = true

            [reminders]
            admin_email = "me@example.com"
            cron_secret = "s3cret"
            utc_offset_minutes = 360
        "#;

        let config: AppTrackConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.mail.host, "smtp.example.com");
        assert_eq!(config.mail.port, 465);
        assert!(config.mail.use_ssl);
        assert_eq!(config.reminders.admin_email, "me@example.com");
        assert_eq!(config.reminders.cron_secret, "s3cret");
        assert_eq!(config.reminders.offset().local_minus_utc(), 360 * 60);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: AppTrackConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.reminders.send_timeout_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ADMIN_EMAIL", "admin@example.com"),
            ("CRON_SECRET_TOKEN", "tok"),
            ("EMAIL_PORT", "2525"),
            ("EMAIL_USE_TLS", "False"),
            ("EMAIL_HOST_USER", ""),
        ]);
        let mut config = AppTrackConfig::default();
        config.mail.username = "keep@example.com".into();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.reminders.admin_email, "admin@example.com");
        assert_eq!(config.reminders.cron_secret, "tok");
        assert_eq!(config.mail.port, 2525);
        assert!(!config.mail.use_tls);
        // Blank values do not clobber existing settings.
        assert_eq!(config.mail.username, "keep@example.com");
    }

    #[test]
    fn test_recipient_falls_back_to_smtp_user() {
        let mut config = AppTrackConfig::default();
        config.mail.username = "sender@example.com".into();
        assert_eq!(config.reminders.recipient(&config.mail), "sender@example.com");
        config.reminders.admin_email = "admin@example.com".into();
        assert_eq!(config.reminders.recipient(&config.mail), "admin@example.com");
    }

    #[test]
    fn test_warning_days_out_of_range_rejected() {
        for days in [0, -3, 366, i64::MAX] {
            let settings = ReminderConfig {
                warning_days: days,
                ..ReminderConfig::default()
            };
            assert!(
                matches!(settings.validate(), Err(AppTrackError::Config(_))),
                "warning_days = {days}"
            );
        }
        for days in [1, 3, 365] {
            let settings = ReminderConfig {
                warning_days: days,
                ..ReminderConfig::default()
            };
            assert!(settings.validate().is_ok(), "warning_days = {days}");
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppTrackConfig::default();
        config.reminders.admin_email = "me@example.com".into();
        config.reminders.warning_days = 5;
        config.gateway.port = 9100;
        config.save_to(&path).unwrap();

        let loaded = AppTrackConfig::load_from(&path).unwrap();
        assert_eq!(loaded.reminders.admin_email, "me@example.com");
        assert_eq!(loaded.reminders.warning_days, 5);
        assert_eq!(loaded.gateway.port, 9100);
        assert_eq!(loaded.mail.host, "smtp.gmail.com");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppTrackConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, AppTrackError::Config(ref m) if m.contains("read")));
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reminders\nwarning_days = ").unwrap();
        let err = AppTrackConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, AppTrackError::Config(ref m) if m.contains("parse")));
    }

    #[test]
    fn test_load_rejects_bad_warning_days() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for value in ["0", "-1", "9223372036854775807"] {
            std::fs::write(&path, format!("[reminders]\nwarning_days = {value}\n")).unwrap();
            let err = AppTrackConfig::load_from(&path).unwrap_err();
            assert!(
                matches!(err, AppTrackError::Config(ref m) if m.contains("warning_days")),
                "warning_days = {value}"
            );
        }
    }

    #[test]
    fn test_home_dir() {
        let home = AppTrackConfig::home_dir();
        assert!(home.to_string_lossy().contains("apptrack"));
    }
}
