//! # AppTrack DB
//!
//! SQLite-backed record store for tracked applications.
//! The reminder scheduler reads through [`ApplicationStore`]; the CLI uses
//! the insert/list helpers to manage records.

use apptrack_core::error::{AppTrackError, Result};
use apptrack_core::traits::ApplicationStore;
use apptrack_core::types::{Application, ApplicationStatus, DateField, NewApplication};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params, params_from_iter};
use std::path::Path;
use std::sync::Mutex;

const DATE_FMT: &str = "%Y-%m-%d";

const SELECT_COLUMNS: &str = "id, title, organization, category, deadline, result_date, status, notes, created_at, updated_at";

/// Application database.
pub struct ApplicationDb {
    conn: Mutex<Connection>,
}

/// Row as stored, before tags and dates are parsed.
struct RawRow {
    id: i64,
    title: String,
    organization: String,
    category: String,
    deadline: String,
    result_date: Option<String>,
    status: String,
    notes: String,
    created_at: String,
    updated_at: String,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            organization: row.get(2)?,
            category: row.get(3)?,
            deadline: row.get(4)?,
            result_date: row.get(5)?,
            status: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn into_application(self) -> Result<Application> {
        Ok(Application {
            id: self.id,
            title: self.title,
            organization: self.organization,
            category: self.category.parse()?,
            deadline: parse_date(&self.deadline)?,
            result_date: self.result_date.as_deref().map(parse_date).transpose()?,
            status: self.status.parse()?,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| AppTrackError::Database(format!("Bad date '{s}': {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppTrackError::Database(format!("Bad timestamp '{s}': {e}")))
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> AppTrackError + '_ {
    move |e| AppTrackError::Database(format!("{context}: {e}"))
}

impl ApplicationDb {
    /// Open or create the application database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err("DB open"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").ok();
        let db = Self { conn: Mutex::new(conn) };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory database, used by tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| AppTrackError::Database(format!("Lock: {e}")))
    }

    /// Run schema migrations.
    fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS applications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                organization TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'job',
                deadline TEXT NOT NULL,          -- YYYY-MM-DD
                result_date TEXT,                -- YYYY-MM-DD, optional
                status TEXT NOT NULL DEFAULT 'pending',
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_applications_deadline ON applications(deadline, status);
            CREATE INDEX IF NOT EXISTS idx_applications_result ON applications(result_date, status);
        ",
        )
        .map_err(db_err("Migration"))?;
        Ok(())
    }

    /// Insert a new application and return it.
    pub fn insert(&self, new: &NewApplication) -> Result<Application> {
        new.validate()?;
        let now = Utc::now().to_rfc3339();
        let id = {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO applications
                 (title, organization, category, deadline, result_date, status, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    new.title.trim(),
                    new.organization.trim(),
                    new.category.as_str(),
                    new.deadline.format(DATE_FMT).to_string(),
                    new.result_date.map(|d| d.format(DATE_FMT).to_string()),
                    new.status.as_str(),
                    new.notes,
                    now,
                ],
            )
            .map_err(db_err("Insert application"))?;
            conn.last_insert_rowid()
        };
        tracing::debug!("💾 Application {id} saved: '{}'", new.title);
        self.get(id)
    }

    /// Fetch one application.
    pub fn get(&self, id: i64) -> Result<Application> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM applications WHERE id = ?1"),
                params![id],
                RawRow::from_row,
            )
            .map_err(db_err("Get application"))?;
        raw.into_application()
    }

    /// All applications, nearest deadline first.
    pub fn list(&self) -> Result<Vec<Application>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SELECT_COLUMNS} FROM applications ORDER BY deadline ASC, created_at DESC, id DESC"
            ))
            .map_err(db_err("Prepare list"))?;
        let rows = stmt
            .query_map([], RawRow::from_row)
            .map_err(db_err("List applications"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("Read row"))?;
        rows.into_iter().map(RawRow::into_application).collect()
    }

    /// Change the status of an application.
    pub fn set_status(&self, id: i64, status: ApplicationStatus) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn
            .execute(
                "UPDATE applications SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), Utc::now().to_rfc3339(), id],
            )
            .map_err(db_err("Update status"))?;
        if changed == 0 {
            return Err(AppTrackError::Database(format!("Application {id} not found")));
        }
        Ok(())
    }

    /// Delete an application. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn
            .execute("DELETE FROM applications WHERE id = ?1", params![id])
            .map_err(db_err("Delete application"))?;
        Ok(changed > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM applications", [], |r| r.get(0))
            .map_err(db_err("Count applications"))?;
        Ok(n as usize)
    }
}

impl ApplicationStore for ApplicationDb {
    fn find_by_date(
        &self,
        field: DateField,
        date: NaiveDate,
        statuses: &[ApplicationStatus],
    ) -> Result<Vec<Application>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (0..statuses.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM applications
             WHERE {} = ?1 AND status IN ({placeholders})
             ORDER BY deadline ASC, created_at DESC, id DESC",
            field.column()
        );

        let mut values = vec![date.format(DATE_FMT).to_string()];
        values.extend(statuses.iter().map(|s| s.as_str().to_string()));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql).map_err(db_err("Prepare due query"))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), RawRow::from_row)
            .map_err(db_err("Due query"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_err("Read row"))?;
        rows.into_iter().map(RawRow::into_application).collect()
    }
}
