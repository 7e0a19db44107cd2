//! Database schema definitions
//!
//! This module provides constants for table and column names used with rusqlite.

/// Submissions table schema
pub mod submissions {
    /// Table name
    pub const TABLE: &str = "submissions";
    /// Primary key column
    pub const ID: &str = "id";
    /// Submitter name column
    pub const NAME: &str = "name";
    /// Email address column
    pub const EMAIL: &str = "email";
    /// Phone number column
    pub const PHONE: &str = "phone";
    /// Country code column
    pub const COUNTRY_CODE: &str = "country_code";
    /// Company name column
    pub const COMPANY: &str = "company";
    /// Project type column
    pub const PROJECT_TYPE: &str = "project_type";
    /// Budget range column
    pub const BUDGET_RANGE: &str = "budget_range";
    /// Timeline column
    pub const TIMELINE: &str = "timeline";
    /// Project details column
    pub const PROJECT_DETAILS: &str = "project_details";
    /// Creation timestamp column, Unix milliseconds
    pub const CREATED_AT: &str = "created_at";

    /// Columns matched by free-text search
    pub const SEARCHABLE: [&str; 5] = [NAME, EMAIL, COMPANY, PROJECT_TYPE, PROJECT_DETAILS];
}
