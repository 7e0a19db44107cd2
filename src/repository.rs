use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::error::{ContactError, Result};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::models::{MonthlyCount, NewSubmission, ProjectTypeCount, SubmissionRecord};

/// Async access to stored submissions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a validated submission, returning the stored record
    async fn insert(&self, submission: NewSubmission) -> Result<SubmissionRecord>;
    /// One page of submissions, newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>>;
    /// One page of submissions matching `term`, newest first
    async fn search(&self, term: &str, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>>;
    /// Number of stored submissions
    async fn count(&self) -> Result<i64>;
    /// Number of submissions matching `term`
    async fn count_matching(&self, term: &str) -> Result<i64>;
    /// Number of submissions created at or after `since`
    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64>;
    /// Counts per project type, count descending then name ascending
    async fn aggregate_by_project_type(&self) -> Result<Vec<ProjectTypeCount>>;
    /// Counts per calendar month from `since`, oldest first
    async fn aggregate_by_month(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyCount>>;
}

/// SQLite-backed repository; queries run on the blocking thread pool
#[derive(Clone)]
pub struct SqliteSubmissionRepository {
    db: Arc<Database>,
    metrics: MetricsCollector,
}

impl SqliteSubmissionRepository {
    /// Repository over an opened database
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            metrics: MetricsCollector::default(),
        }
    }

    async fn run<T, F>(&self, operation: &'static str, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let timer = MetricsTimer::new(self.metrics.clone(), operation);

        let result = tokio::task::spawn_blocking(move || query(&db))
            .await
            .map_err(|e| ContactError::Internal(format!("Store task failed: {e}")))
            .and_then(|inner| inner);

        timer.finish(result.is_ok());
        if let Err(e) = &result {
            tracing::error!(operation, error = %e, "Store operation failed");
        }

        result
    }
}

#[async_trait]
impl SubmissionRepository for SqliteSubmissionRepository {
    async fn insert(&self, submission: NewSubmission) -> Result<SubmissionRecord> {
        self.run("insert", move |db| db.insert_submission(&submission, Utc::now()))
            .await
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>> {
        self.run("list", move |db| db.list_submissions(limit, offset)).await
    }

    async fn search(&self, term: &str, limit: i64, offset: i64) -> Result<Vec<SubmissionRecord>> {
        let term = term.to_string();
        self.run("search", move |db| db.search_submissions(&term, limit, offset))
            .await
    }

    async fn count(&self) -> Result<i64> {
        self.run("count", Database::count_submissions).await
    }

    async fn count_matching(&self, term: &str) -> Result<i64> {
        let term = term.to_string();
        self.run("count_matching", move |db| db.count_matching(&term)).await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64> {
        self.run("count_since", move |db| db.count_since(since)).await
    }

    async fn aggregate_by_project_type(&self) -> Result<Vec<ProjectTypeCount>> {
        self.run("aggregate_by_project_type", Database::project_type_stats)
            .await
    }

    async fn aggregate_by_month(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyCount>> {
        self.run("aggregate_by_month", move |db| db.monthly_stats(since))
            .await
    }
}
