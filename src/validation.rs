//! Submission validation and normalization.
//!
//! Every inbound contact form passes through [`validate_submission`] before it can reach
//! the record store. Validation is a pure function over field values: it never touches a
//! request object, so the HTTP layer and the CLI share exactly one rule set.
//!
//! Each field runs an ordered list of named rules. A field stops at its first failing
//! rule, while failures across different fields accumulate in form order.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::ContactError;
use crate::models::{ContactForm, NewSubmission};

/// Country code used when the form leaves it empty.
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

/// Smallest accepted page size.
pub const MIN_PAGE_LIMIT: i64 = 1;
/// Largest accepted page size.
pub const MAX_PAGE_LIMIT: i64 = 1000;
/// Page size used when the caller does not pass one.
pub const DEFAULT_PAGE_LIMIT: i64 = 200;

/// Shortest accepted admin password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Form fields subject to validation, in form order
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Submitter name
    Name,
    /// Gmail address
    Email,
    /// Phone number without country code
    Phone,
    /// International dialling prefix
    CountryCode,
    /// Company name
    Company,
    /// Kind of project requested
    ProjectType,
    /// Budget bracket
    BudgetRange,
    /// Expected delivery timeline
    Timeline,
    /// Free-text description
    ProjectDetails,
}

impl Field {
    /// Wire name of the field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::CountryCode => "country_code",
            Self::Company => "company",
            Self::ProjectType => "project_type",
            Self::BudgetRange => "budget_range",
            Self::Timeline => "timeline",
            Self::ProjectDetails => "project_details",
        }
    }
}

/// A single violated rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Field the rule belongs to
    pub field: Field,
    /// Human-readable message shown to the submitter
    pub message: String,
}

/// Ordered list of violated rules; never empty when returned as an error
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// First violated rule's message, surfaced as the primary error
    #[must_use]
    pub fn headline(&self) -> &str {
        self.errors
            .first()
            .map_or("Validation failed", |error| error.message.as_str())
    }

    /// Every violated rule's message in form order
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|error| error.message.clone()).collect()
    }

    /// Structured view of the violations
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Messages reported against one field
    #[must_use]
    pub fn for_field(&self, field: Field) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|error| error.field == field)
            .map(|error| error.message.as_str())
            .collect()
    }

    /// True when no rule was violated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of violated rules
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

type Check = fn(&str) -> bool;

/// A named predicate and the message reported when it fails
struct Rule {
    name: &'static str,
    check: Check,
    message: &'static str,
}

fn rule(name: &'static str, check: Check, message: &'static str) -> Rule {
    Rule {
        name,
        check,
        message,
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[allow(clippy::expect_used)]
fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

fn name_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"^[A-Za-z\s]+$")
}

fn phone_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"^[\d\s\-\+\(\)]+$")
}

fn country_code_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"^\+\d{1,4}$")
}

fn gmail_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    // ASCII word characters only, matching the front-end check
    compiled(&CELL, r"^[A-Za-z0-9_.%+-]+@gmail\.com$")
}

/// Syntactic address check applied before the Gmail restriction
fn is_email_address(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

fn name_rules() -> [Rule; 3] {
    [
        rule("required", |v| !v.is_empty(), "Name is required"),
        rule("max_length", |v| char_len(v) <= 150, "Name cannot exceed 150 characters"),
        rule(
            "letters_and_spaces",
            |v| name_pattern().is_match(v),
            "Name can only contain letters and spaces",
        ),
    ]
}

fn email_rules() -> [Rule; 4] {
    [
        rule("required", |v| !v.is_empty(), "Email is required"),
        rule("max_length", |v| char_len(v) <= 200, "Email cannot exceed 200 characters"),
        rule("address", is_email_address, "Please enter a valid email address"),
        rule("gmail", |v| gmail_pattern().is_match(v), "Please enter a valid Gmail address"),
    ]
}

fn phone_rules() -> [Rule; 3] {
    [
        rule("required", |v| !v.is_empty(), "Phone is required"),
        rule("max_length", |v| char_len(v) <= 50, "Phone cannot exceed 50 characters"),
        rule(
            "phone_characters",
            |v| phone_pattern().is_match(v),
            "Phone can only contain numbers, spaces, hyphens, and parentheses",
        ),
    ]
}

fn country_code_rules() -> [Rule; 2] {
    [
        rule("max_length", |v| char_len(v) <= 10, "Country code cannot exceed 10 characters"),
        rule(
            "dialling_prefix",
            |v| country_code_pattern().is_match(v),
            "Country code must be in format +XXX",
        ),
    ]
}

fn bounded_text_rules(
    required: &'static str,
    too_long: &'static str,
    max: fn(&str) -> bool,
) -> [Rule; 2] {
    [
        rule("required", |v| !v.is_empty(), required),
        rule("max_length", max, too_long),
    ]
}

fn project_details_rules() -> [Rule; 2] {
    [
        rule("required", |v| !v.is_empty(), "Project details are required"),
        rule(
            "length_range",
            |v| (10..=2000).contains(&char_len(v)),
            "Project details must be between 10 and 2000 characters",
        ),
    ]
}

/// Run `rules` in order against `value`, recording the first failure
fn apply(errors: &mut ValidationErrors, field: Field, value: &str, rules: &[Rule]) {
    if let Some(failed) = rules.iter().find(|rule| !(rule.check)(value)) {
        tracing::debug!(field = field.as_str(), rule = failed.name, "Field rejected");
        errors.push(field, failed.message);
    }
}

fn trimmed(value: Option<&String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Validate and normalize a raw contact form.
///
/// Fields are trimmed, the email is lower-cased and an empty country code
/// becomes [`DEFAULT_COUNTRY_CODE`] before any rule runs. On failure the returned
/// [`ValidationErrors`] lists every violated field in form order.
pub fn validate_submission(form: &ContactForm) -> Result<NewSubmission, ValidationErrors> {
    let name = trimmed(form.name.as_ref());
    let email = trimmed(form.email.as_ref()).to_lowercase();
    let phone = trimmed(form.phone.as_ref());
    let country_code = match trimmed(form.country_code.as_ref()) {
        code if code.is_empty() => DEFAULT_COUNTRY_CODE.to_string(),
        code => code,
    };
    let company = trimmed(form.company.as_ref());
    let project_type = trimmed(form.project_type.as_ref());
    let budget_range = trimmed(form.budget_range.as_ref());
    let timeline = trimmed(form.timeline.as_ref());
    let project_details = trimmed(form.project_details.as_ref());

    let mut errors = ValidationErrors::default();

    apply(&mut errors, Field::Name, &name, &name_rules());
    apply(&mut errors, Field::Email, &email, &email_rules());
    apply(&mut errors, Field::Phone, &phone, &phone_rules());
    apply(&mut errors, Field::CountryCode, &country_code, &country_code_rules());
    apply(
        &mut errors,
        Field::Company,
        &company,
        &bounded_text_rules(
            "Company name is required",
            "Company name cannot exceed 150 characters",
            |v| char_len(v) <= 150,
        ),
    );
    apply(
        &mut errors,
        Field::ProjectType,
        &project_type,
        &bounded_text_rules(
            "Project type is required",
            "Project type cannot exceed 120 characters",
            |v| char_len(v) <= 120,
        ),
    );
    apply(
        &mut errors,
        Field::BudgetRange,
        &budget_range,
        &bounded_text_rules(
            "Budget range is required",
            "Budget range cannot exceed 120 characters",
            |v| char_len(v) <= 120,
        ),
    );
    apply(
        &mut errors,
        Field::Timeline,
        &timeline,
        &bounded_text_rules(
            "Timeline is required",
            "Timeline cannot exceed 120 characters",
            |v| char_len(v) <= 120,
        ),
    );
    apply(&mut errors, Field::ProjectDetails, &project_details, &project_details_rules());

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewSubmission {
        name,
        email,
        phone,
        country_code,
        company,
        project_type,
        budget_range,
        timeline,
        project_details,
    })
}

/// Validate an admin login payload before the credential comparison
pub fn validate_login(password: Option<&str>) -> Result<String, ContactError> {
    let password = password.map(str::trim).unwrap_or_default();

    if password.is_empty() {
        return Err(ContactError::InvalidArgument("Password is required".to_string()));
    }

    if char_len(password) < MIN_PASSWORD_LENGTH {
        return Err(ContactError::InvalidArgument(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password.to_string())
}

/// Validate raw pagination parameters, applying defaults for missing values.
///
/// Returns `(limit, offset)`.
pub fn validate_pagination(
    limit: Option<&str>,
    offset: Option<&str>,
) -> Result<(i64, i64), ContactError> {
    let limit_error = || {
        ContactError::InvalidArgument(format!(
            "Limit must be between {MIN_PAGE_LIMIT} and {MAX_PAGE_LIMIT}"
        ))
    };
    let offset_error = || ContactError::InvalidArgument("Offset must be non-negative".to_string());

    let limit = match limit.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse::<i64>().map_err(|_| limit_error())?,
        None => DEFAULT_PAGE_LIMIT,
    };

    if !(MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(limit_error());
    }

    let offset = match offset.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse::<i64>().map_err(|_| offset_error())?,
        None => 0,
    };

    if offset < 0 {
        return Err(offset_error());
    }

    Ok((limit, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_address_shape() {
        assert!(is_email_address("someone@example.com"));
        assert!(is_email_address("first.last+tag@sub.example.org"));
        assert!(!is_email_address("plainaddress"));
        assert!(!is_email_address("two@@example.com"));
        assert!(!is_email_address("dots..inside@example.com"));
        assert!(!is_email_address("nodomain@localhost"));
        assert!(!is_email_address("space here@example.com"));
    }

    #[test]
    fn test_headline_defaults_when_empty() {
        assert_eq!(ValidationErrors::default().headline(), "Validation failed");
    }

    #[test]
    fn test_trimmed_keeps_inner_characters() {
        assert_eq!(trimmed(Some(&"  hi\u{0}there\n ".to_string())), "hi\u{0}there");
        assert_eq!(trimmed(None), "");
    }
}
