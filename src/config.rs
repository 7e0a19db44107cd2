use std::env;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::validation::MIN_PASSWORD_LENGTH;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
    pub environment: String,
    /// Take the client address from `X-Forwarded-For` when behind a proxy
    pub trust_forwarded_for: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub admin_password: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub contact_max: u32,
    pub login_max: u32,
    pub global_max: u32,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub max_records: i64,
    pub title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                request_timeout_secs: 30,
                body_limit_bytes: 10 * 1024 * 1024,
                environment: "development".to_string(),
                trust_forwarded_for: false,
            },
            database: DatabaseConfig {
                url: "sqlite:data/contacts.db".to_string(),
                max_connections: 10,
                connection_timeout_secs: 30,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                admin_password: "admin123".to_string(),
                token_ttl_hours: 24,
            },
            rate_limit: RateLimitConfig {
                window_secs: 15 * 60,
                contact_max: 5,
                login_max: 10,
                global_max: 100,
                sweep_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            export: ExportConfig {
                max_records: 1000,
                title: "Contact Submissions Report".to_string(),
            },
        }
    }
}

/// Plain deployment variables and the config keys they override
const DEPLOYMENT_OVERRIDES: [(&str, &str); 6] = [
    ("PORT", "server.port"),
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("ADMIN_PASSWORD", "auth.admin_password"),
    ("APP_ENV", "server.environment"),
    ("LOG_FORMAT", "logging.format"),
];

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&Self::default())?)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("CONTACT_INTAKE")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            );

        for (variable, key) in DEPLOYMENT_OVERRIDES {
            builder = builder.set_override_option(key, env::var(variable).ok())?;
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let mut app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // The deployed front end's origin is allowed alongside the local dev servers
        if let Ok(origin) = env::var("CORS_ORIGIN") {
            if !app_config.server.cors_origins.contains(&origin) {
                app_config.server.cors_origins.insert(0, origin);
            }
        }

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(anyhow::anyhow!("body_limit_bytes must be greater than 0"));
        }
        // Credentialed CORS cannot be combined with a wildcard origin
        if self.server.cors_origins.iter().any(|origin| origin.trim() == "*") {
            return Err(anyhow::anyhow!("cors_origins must list explicit origins, not '*'"));
        }

        // Validate database config
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }

        // Validate auth config
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(anyhow::anyhow!("jwt_secret must not be empty"));
        }
        if self.auth.admin_password.trim().is_empty() {
            return Err(anyhow::anyhow!("admin_password must not be empty"));
        }
        if self.auth.admin_password.trim().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(anyhow::anyhow!(
                "admin_password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("token_ttl_hours must be greater than 0"));
        }

        // Validate rate limit config
        if self.rate_limit.window_secs == 0 {
            return Err(anyhow::anyhow!("window_secs must be greater than 0"));
        }
        if self.rate_limit.contact_max == 0 || self.rate_limit.login_max == 0 || self.rate_limit.global_max == 0 {
            return Err(anyhow::anyhow!("rate limit caps must be greater than 0"));
        }
        if self.rate_limit.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!("sweep_interval_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate export config
        if !(1..=1000).contains(&self.export.max_records) {
            return Err(anyhow::anyhow!("max_records must be between 1 and 1000"));
        }

        Ok(())
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Copy safe to print, with secrets masked
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.auth.jwt_secret = "********".to_string();
        copy.auth.admin_password = "********".to_string();
        copy
    }
}
