//! Contact Intake - Contact Form Pipeline and Admin API
//!
//! A Rust service that accepts contact-form submissions from a public site,
//! stores them in SQLite, and lets an administrator browse, search, export
//! and summarize them.
//!
//! # Features
//!
//! - Field-by-field validation with every violation reported
//! - Per-address rate limiting for intake, login and all routes
//! - JWT admin sessions with logout and expiry
//! - Paged listing, search and dashboard statistics
//! - PDF export of recent submissions

/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Error taxonomy and HTTP mapping
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Per-address rate limiting
pub mod rate_limit;
/// PDF report rendering
pub mod report;
/// Repository pattern for data access
pub mod repository;
/// HTTP handlers and extractors
pub mod routes;
/// Database schema definitions
pub mod schema;
/// Router assembly and server lifecycle
pub mod server;
/// Intake and admin operations
pub mod service;
/// Admin session tokens
pub mod session;
/// Shared application state
pub mod state;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use config::AppConfig;
pub use db::Database;
pub use error::{ContactError, Result};
pub use models::{ContactForm, SubmissionRecord, SubmissionStats};
pub use server::build_router;
pub use state::AppState;
