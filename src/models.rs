//! Data models for contact submissions and admin statistics
//!
//! This module contains the payloads accepted over HTTP, the normalized submission
//! handed to the store, the stored record, and the aggregate shapes returned to the
//! dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw contact form as posted by the public site.
///
/// Every field is optional so that missing fields surface as validation messages
/// rather than body-parsing failures.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactForm {
    /// Submitter name
    pub name: Option<String>,
    /// Submitter email
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Dialling prefix such as `+44`
    pub country_code: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Kind of project requested
    pub project_type: Option<String>,
    /// Budget bracket
    pub budget_range: Option<String>,
    /// Expected delivery timeline
    pub timeline: Option<String>,
    /// Free-text description of the project
    pub project_details: Option<String>,
}

/// A submission that passed validation and is ready to be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubmission {
    /// Trimmed name
    pub name: String,
    /// Trimmed, lower-cased Gmail address
    pub email: String,
    /// Trimmed phone number
    pub phone: String,
    /// Dialling prefix, `+91` when the form left it empty
    pub country_code: String,
    /// Company name
    pub company: String,
    /// Kind of project requested
    pub project_type: String,
    /// Budget bracket
    pub budget_range: String,
    /// Expected delivery timeline
    pub timeline: String,
    /// Free-text description of the project
    pub project_details: String,
}

/// A stored submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Store-assigned identifier, never reused
    pub id: i64,
    /// Submitter name
    pub name: String,
    /// Submitter email
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Dialling prefix
    pub country_code: String,
    /// Company name
    pub company: String,
    /// Kind of project requested
    pub project_type: String,
    /// Budget bracket
    pub budget_range: String,
    /// Expected delivery timeline
    pub timeline: String,
    /// Free-text description of the project
    pub project_details: String,
    /// Time the store accepted the submission
    pub created_at: DateTime<Utc>,
}

/// Acknowledgement returned to the submitter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Always true for a receipt
    pub ok: bool,
    /// Message shown on the site
    pub message: String,
    /// Identifier of the stored record
    pub submission_id: i64,
}

/// Which page of submissions the admin asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionQuery {
    /// Page size, already bounded
    pub limit: i64,
    /// Records to skip
    pub offset: i64,
    /// Case-insensitive search term, if any
    pub search: Option<String>,
}

/// One page of submissions
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPage {
    /// Always true for a page
    pub ok: bool,
    /// Records on this page, newest first
    pub submissions: Vec<SubmissionRecord>,
    /// Records matching the query across all pages
    pub total: i64,
    /// Page size used
    pub limit: i64,
    /// Offset used
    pub offset: i64,
}

/// Submission count for one project type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTypeCount {
    /// Project type as submitted
    #[serde(rename = "_id")]
    pub project_type: String,
    /// Number of submissions
    pub count: i64,
}

/// Calendar month bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year
    pub year: i32,
    /// Month, 1-based
    pub month: u32,
}

/// Submission count for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Bucket the count belongs to
    #[serde(rename = "_id")]
    pub period: YearMonth,
    /// Number of submissions
    pub count: i64,
}

/// Dashboard statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    /// Every stored submission
    pub total_submissions: i64,
    /// Submissions from the last seven days
    pub recent_submissions: i64,
    /// Counts per project type, most popular first
    pub project_type_stats: Vec<ProjectTypeCount>,
    /// Counts per month over the last six months, oldest first
    pub monthly_stats: Vec<MonthlyCount>,
}

/// Admin login payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Shared admin secret
    pub password: Option<String>,
}
