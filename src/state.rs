use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::rate_limit::{RateLimitPolicy, RateLimiter};
use crate::report::ReportGenerator;
use crate::repository::{SqliteSubmissionRepository, SubmissionRepository};
use crate::service::ContactService;
use crate::session::{AdminCredential, SessionStore};

/// Shared components handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<ContactService>,
    pub sessions: Arc<SessionStore>,
    pub credential: Arc<AdminCredential>,
    pub contact_limiter: Arc<RateLimiter>,
    pub login_limiter: Arc<RateLimiter>,
    pub global_limiter: Arc<RateLimiter>,
    pub metrics: MetricsCollector,
}

impl AppState {
    /// Wire the components around an existing repository
    pub fn new(config: AppConfig, repository: Arc<dyn SubmissionRepository>) -> Self {
        let service = ContactService::new(
            repository,
            ReportGenerator::new(config.export.title.clone()),
            config.export.max_records,
        );

        Self {
            service: Arc::new(service),
            sessions: Arc::new(SessionStore::from_config(&config.auth)),
            credential: Arc::new(AdminCredential::new(config.auth.admin_password.clone())),
            contact_limiter: Arc::new(RateLimiter::new(RateLimitPolicy::contact(&config.rate_limit))),
            login_limiter: Arc::new(RateLimiter::new(RateLimitPolicy::login(&config.rate_limit))),
            global_limiter: Arc::new(RateLimiter::new(RateLimitPolicy::global(&config.rate_limit))),
            metrics: MetricsCollector::default(),
            config: Arc::new(config),
        }
    }

    /// Open the configured database and wire everything around it
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let db = Database::from_config(&config.database)?;
        let repository = SqliteSubmissionRepository::new(Arc::new(db));
        Ok(Self::new(config, Arc::new(repository)))
    }

    /// Every limiter, for maintenance sweeps
    pub fn limiters(&self) -> [&RateLimiter; 3] {
        [
            self.contact_limiter.as_ref(),
            self.login_limiter.as_ref(),
            self.global_limiter.as_ref(),
        ]
    }
}
