use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Months, Utc};

use crate::error::{ContactError, Result};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{ContactForm, SubmissionPage, SubmissionQuery, SubmissionReceipt, SubmissionStats};
use crate::report::ReportGenerator;
use crate::repository::SubmissionRepository;
use crate::validation::validate_submission;

const THANK_YOU: &str =
    "Thank you! Your message has been sent successfully. We'll get back to you within 24 hours.";

const RECENT_DAYS: i64 = 7;
const MONTHLY_WINDOW: u32 = 6;

/// Intake and admin operations over a submission repository
pub struct ContactService {
    repository: Arc<dyn SubmissionRepository>,
    report: ReportGenerator,
    export_limit: i64,
    metrics: MetricsCollector,
}

impl ContactService {
    /// Service over `repository`; exports render at most `export_limit` records
    pub fn new(repository: Arc<dyn SubmissionRepository>, report: ReportGenerator, export_limit: i64) -> Self {
        Self {
            repository,
            report,
            export_limit,
            metrics: MetricsCollector::default(),
        }
    }

    /// Validate and store a contact form
    pub async fn submit(&self, form: ContactForm) -> Result<SubmissionReceipt> {
        let submission = validate_submission(&form).map_err(|errors| {
            tracing::debug!(violations = errors.len(), "Contact form rejected");
            self.metrics.record_submission_rejected(errors.len());
            ContactError::Validation(errors)
        })?;

        let record = self.repository.insert(submission).await?;

        tracing::info!(
            email = %record.email,
            project_type = %record.project_type,
            submission_id = record.id,
            "New contact submission"
        );
        self.metrics.record_submission_accepted(&record.project_type);

        Ok(SubmissionReceipt {
            ok: true,
            message: THANK_YOU.to_string(),
            submission_id: record.id,
        })
    }

    /// One page of submissions, optionally filtered by a search term.
    ///
    /// `total` counts every matching record, not just this page.
    pub async fn list(&self, query: SubmissionQuery) -> Result<SubmissionPage> {
        let term = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());

        let (submissions, total) = match term {
            Some(term) => (
                self.repository.search(term, query.limit, query.offset).await?,
                self.repository.count_matching(term).await?,
            ),
            None => (
                self.repository.list(query.limit, query.offset).await?,
                self.repository.count().await?,
            ),
        };

        Ok(SubmissionPage {
            ok: true,
            submissions,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    /// Dashboard statistics as of `now`
    pub async fn stats(&self, now: DateTime<Utc>) -> Result<SubmissionStats> {
        let timer = OperationTimer::new("stats");

        let recent_since = now - Duration::days(RECENT_DAYS);
        let monthly_since = now
            .checked_sub_months(Months::new(MONTHLY_WINDOW))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let stats = SubmissionStats {
            total_submissions: self.repository.count().await?,
            recent_submissions: self.repository.count_since(recent_since).await?,
            project_type_stats: self.repository.aggregate_by_project_type().await?,
            monthly_stats: self.repository.aggregate_by_month(monthly_since).await?,
        };

        timer.finish();
        Ok(stats)
    }

    /// Render the most recent submissions as a PDF
    pub async fn export_pdf(&self, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let records = self.repository.list(self.export_limit, 0).await?;
        if records.is_empty() {
            return Err(ContactError::NotFound("No submissions found to export".to_string()));
        }

        let timer = OperationTimer::new("render_pdf");
        let start = Instant::now();
        let report = self.report.clone();
        let count = records.len();

        let bytes = tokio::task::spawn_blocking(move || report.render(&records, generated_at))
            .await
            .map_err(|e| ContactError::Internal(format!("PDF task failed: {e}")))??;

        self.metrics
            .record_export_operation(count, bytes.len(), start.elapsed());
        timer.finish();
        tracing::info!(records = count, bytes = bytes.len(), "PDF report generated");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSubmission, SubmissionRecord};
    use crate::repository::MockSubmissionRepository;
    use mockall::predicate::eq;

    fn valid_form() -> ContactForm {
        ContactForm {
            name: Some("Jane Doe".to_string()),
            email: Some("Jane.Doe@Gmail.com".to_string()),
            phone: Some("9876543210".to_string()),
            country_code: None,
            company: Some("Acme".to_string()),
            project_type: Some("Web Development".to_string()),
            budget_range: Some("$5k-$10k".to_string()),
            timeline: Some("1-3 months".to_string()),
            project_details: Some("We need a new marketing site.".to_string()),
        }
    }

    fn stored(id: i64, new: NewSubmission) -> SubmissionRecord {
        SubmissionRecord {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            country_code: new.country_code,
            company: new.company,
            project_type: new.project_type,
            budget_range: new.budget_range,
            timeline: new.timeline,
            project_details: new.project_details,
            created_at: Utc::now(),
        }
    }

    fn service(repo: MockSubmissionRepository) -> ContactService {
        ContactService::new(Arc::new(repo), ReportGenerator::default(), 1000)
    }

    #[tokio::test]
    async fn test_submit_stores_normalized_submission() {
        let mut repo = MockSubmissionRepository::new();
        repo.expect_insert()
            .withf(|new| new.email == "jane.doe@gmail.com" && new.country_code == "+91")
            .times(1)
            .returning(|new| Ok(stored(7, new)));

        let receipt = service(repo).submit(valid_form()).await.unwrap();
        assert!(receipt.ok);
        assert_eq!(receipt.submission_id, 7);
        assert_eq!(receipt.message, THANK_YOU);
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_store() {
        let mut repo = MockSubmissionRepository::new();
        repo.expect_insert().never();

        let mut form = valid_form();
        form.email = Some("user@yahoo.com".to_string());

        let err = service(repo).submit(form).await.unwrap_err();
        assert!(matches!(err, ContactError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_uses_matching_count() {
        let mut repo = MockSubmissionRepository::new();
        repo.expect_search()
            .with(eq("gmail"), eq(10), eq(0))
            .returning(|_, _, _| Ok(Vec::new()));
        repo.expect_count_matching().with(eq("gmail")).returning(|_| Ok(42));
        repo.expect_list().never();

        let page = service(repo)
            .list(SubmissionQuery {
                limit: 10,
                offset: 0,
                search: Some("  gmail ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 42);
        assert_eq!(page.limit, 10);
    }

    #[tokio::test]
    async fn test_blank_search_lists_everything() {
        let mut repo = MockSubmissionRepository::new();
        repo.expect_list().with(eq(200), eq(5)).returning(|_, _| Ok(Vec::new()));
        repo.expect_count().returning(|| Ok(3));
        repo.expect_search().never();

        let page = service(repo)
            .list(SubmissionQuery {
                limit: 200,
                offset: 5,
                search: Some("   ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.offset, 5);
    }

    #[tokio::test]
    async fn test_export_with_no_records_is_not_found() {
        let mut repo = MockSubmissionRepository::new();
        repo.expect_list().with(eq(1000), eq(0)).returning(|_, _| Ok(Vec::new()));

        let err = service(repo).export_pdf(Utc::now()).await.unwrap_err();
        assert!(matches!(err, ContactError::NotFound(_)));
        assert_eq!(err.to_string(), "No submissions found to export");
    }

    #[tokio::test]
    async fn test_stats_windows() {
        let now = Utc::now();
        let mut repo = MockSubmissionRepository::new();
        repo.expect_count().returning(|| Ok(12));
        repo.expect_count_since()
            .withf(move |since| *since == now - Duration::days(7))
            .returning(|_| Ok(4));
        repo.expect_aggregate_by_project_type().returning(|| Ok(Vec::new()));
        repo.expect_aggregate_by_month()
            .withf(move |since| *since < now - Duration::days(180))
            .returning(|_| Ok(Vec::new()));

        let stats = service(repo).stats(now).await.unwrap();
        assert_eq!(stats.total_submissions, 12);
        assert_eq!(stats.recent_submissions, 4);
    }
}
