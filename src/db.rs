use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, Row};

use crate::config::DatabaseConfig;
use crate::error::{ContactError, Result};
use crate::models::{MonthlyCount, NewSubmission, ProjectTypeCount, SubmissionRecord, YearMonth};
use crate::schema::submissions;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Register `ulower`, a Unicode-aware `lower()`; the built-in one only folds ASCII
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "ulower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Strip the `sqlite:` / `sqlite://` scheme from a database URL
#[must_use]
pub fn database_path(database_url: &str) -> &Path {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    Path::new(path)
}

/// Database manager for handling connections and submission queries
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Create a new database connection pool with default pool settings
    pub fn new(database_url: &str) -> Result<Self> {
        Self::with_pool_settings(database_url, 10, Duration::from_secs(30))
    }

    /// Create a new database connection pool from configuration
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::with_pool_settings(
            &config.url,
            config.max_connections,
            Duration::from_secs(config.connection_timeout_secs),
        )
    }

    fn with_pool_settings(database_url: &str, max_connections: u32, timeout: Duration) -> Result<Self> {
        let path = database_path(database_url);

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ContactError::Persistence(format!("Failed to create database directory: {e}")))?;
        }

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            register_functions(conn)
        });
        let pool = Pool::builder()
            .max_size(max_connections)
            .connection_timeout(timeout)
            .build(manager)?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;

        tracing::info!(path = %path.display(), max_connections, "Database ready");
        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/0001_create_submissions/up.sql"))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Store a validated submission.
    ///
    /// `created_at` is raised to the newest stored timestamp if the clock went
    /// backwards, so insertion order and timestamp order never disagree.
    pub fn insert_submission(&self, new: &NewSubmission, created_at: DateTime<Utc>) -> Result<SubmissionRecord> {
        let conn = self.get_connection()?;

        let (id, stored_at): (i64, i64) = conn.query_row(
            &format!(
                "INSERT INTO {table} ({name}, {email}, {phone}, {country_code}, {company}, {project_type}, \
                 {budget_range}, {timeline}, {project_details}, {created_at}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, \
                 MAX(?10, COALESCE((SELECT MAX({created_at}) FROM {table}), 0))) \
                 RETURNING {id}, {created_at}",
                table = submissions::TABLE,
                id = submissions::ID,
                name = submissions::NAME,
                email = submissions::EMAIL,
                phone = submissions::PHONE,
                country_code = submissions::COUNTRY_CODE,
                company = submissions::COMPANY,
                project_type = submissions::PROJECT_TYPE,
                budget_range = submissions::BUDGET_RANGE,
                timeline = submissions::TIMELINE,
                project_details = submissions::PROJECT_DETAILS,
                created_at = submissions::CREATED_AT,
            ),
            params![
                new.name,
                new.email,
                new.phone,
                new.country_code,
                new.company,
                new.project_type,
                new.budget_range,
                new.timeline,
                new.project_details,
                created_at.timestamp_millis(),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(SubmissionRecord {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            country_code: new.country_code.clone(),
            company: new.company.clone(),
            project_type: new.project_type.clone(),
            budget_range: new.budget_range.clone(),
            timeline: new.timeline.clone(),
            project_details: new.project_details.clone(),
            created_at: millis_to_datetime(stored_at).ok_or_else(|| {
                ContactError::Persistence(format!("Stored timestamp out of range: {stored_at}"))
            })?,
        })
    }

    /// Get one page of submissions, newest first
    pub fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} DESC, {} DESC LIMIT ?1 OFFSET ?2",
            submissions::TABLE,
            submissions::CREATED_AT,
            submissions::ID
        ))?;
        let rows = stmt.query_map(params![limit, offset], map_submission)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Case-insensitive substring search across the searchable columns, newest first
    pub fn search_submissions(&self, term: &str, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} ORDER BY {} DESC, {} DESC LIMIT ?2 OFFSET ?3",
            submissions::TABLE,
            search_condition(),
            submissions::CREATED_AT,
            submissions::ID
        ))?;
        let rows = stmt.query_map(params![term.to_lowercase(), limit, offset], map_submission)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Count every stored submission
    pub fn count_submissions(&self) -> Result<i64> {
        let conn = self.get_connection()?;

        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", submissions::TABLE),
            params![],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// Count submissions matching a search term
    pub fn count_matching(&self, term: &str) -> Result<i64> {
        let conn = self.get_connection()?;

        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE {}", submissions::TABLE, search_condition()),
            params![term.to_lowercase()],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// Count submissions created at or after `since`
    pub fn count_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let conn = self.get_connection()?;

        let count = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE {} >= ?1",
                submissions::TABLE,
                submissions::CREATED_AT
            ),
            params![since.timestamp_millis()],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    /// Submission counts per project type, most popular first
    pub fn project_type_stats(&self) -> Result<Vec<ProjectTypeCount>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {col}, COUNT(*) AS total FROM {table} GROUP BY {col} ORDER BY total DESC, {col} ASC",
            col = submissions::PROJECT_TYPE,
            table = submissions::TABLE
        ))?;
        let rows = stmt.query_map(params![], |row| {
            Ok(ProjectTypeCount {
                project_type: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Submission counts per calendar month (UTC) since `since`, oldest first
    pub fn monthly_stats(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyCount>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT CAST(strftime('%Y', {col} / 1000, 'unixepoch') AS INTEGER) AS year, \
             CAST(strftime('%m', {col} / 1000, 'unixepoch') AS INTEGER) AS month, \
             COUNT(*) FROM {table} WHERE {col} >= ?1 \
             GROUP BY year, month ORDER BY year ASC, month ASC",
            col = submissions::CREATED_AT,
            table = submissions::TABLE
        ))?;
        let rows = stmt.query_map(params![since.timestamp_millis()], |row| {
            Ok(MonthlyCount {
                period: YearMonth {
                    year: row.get(0)?,
                    month: row.get(1)?,
                },
                count: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }
}

fn search_condition() -> String {
    submissions::SEARCHABLE
        .iter()
        .map(|column| format!("instr(ulower({column}), ?1) > 0"))
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Map a database row to a `SubmissionRecord`
fn map_submission(row: &Row) -> rusqlite::Result<SubmissionRecord> {
    let created_at: i64 = row.get(submissions::CREATED_AT)?;

    Ok(SubmissionRecord {
        id: row.get(submissions::ID)?,
        name: row.get(submissions::NAME)?,
        email: row.get(submissions::EMAIL)?,
        phone: row.get(submissions::PHONE)?,
        country_code: row.get(submissions::COUNTRY_CODE)?,
        company: row.get(submissions::COMPANY)?,
        project_type: row.get(submissions::PROJECT_TYPE)?,
        budget_range: row.get(submissions::BUDGET_RANGE)?,
        timeline: row.get(submissions::TIMELINE)?,
        project_details: row.get(submissions::PROJECT_DETAILS)?,
        created_at: millis_to_datetime(created_at).ok_or(rusqlite::Error::IntegralValueOutOfRange(
            10, created_at,
        ))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_strips_scheme() {
        assert_eq!(database_path("sqlite:data/contacts.db"), Path::new("data/contacts.db"));
        assert_eq!(database_path("sqlite:///tmp/x.db"), Path::new("/tmp/x.db"));
        assert_eq!(database_path("plain.db"), Path::new("plain.db"));
    }

    #[test]
    fn test_search_condition_covers_searchable_columns() {
        let condition = search_condition();
        for column in submissions::SEARCHABLE {
            assert!(condition.contains(&format!("ulower({column})")));
        }
        assert!(!condition.contains(submissions::PHONE));
    }

    #[test]
    fn test_ulower_folds_non_ascii() {
        let conn = Connection::open_in_memory().unwrap();
        register_functions(&conn).unwrap();

        let folded: String = conn
            .query_row("SELECT ulower(?1)", params!["ÉMILE Zürich"], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "émile zürich");

        let null: Option<String> = conn.query_row("SELECT ulower(NULL)", [], |row| row.get(0)).unwrap();
        assert_eq!(null, None);
    }
}
