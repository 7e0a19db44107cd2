//! Tests for configuration defaults and validation

use contact_intake::config::AppConfig;
use contact_intake::validation::validate_login;

#[test]
fn test_default_server_config() {
    let config = AppConfig::default();

    assert_eq!(config.server.port, 5000);
    assert_eq!(config.server.request_timeout_secs, 30);
    assert_eq!(config.server.body_limit_bytes, 10 * 1024 * 1024);
    assert_eq!(config.server.environment, "development");
    assert!(!config.server.trust_forwarded_for);
    assert!(config.server.cors_origins.contains(&"http://localhost:3000".to_string()));
    assert!(config.server.cors_origins.contains(&"http://localhost:5173".to_string()));
    assert_eq!(config.bind_address(), "0.0.0.0:5000");
}

#[test]
fn test_default_database_config() {
    let config = AppConfig::default();

    assert_eq!(config.database.url, "sqlite:data/contacts.db");
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.database.connection_timeout_secs, 30);
}

#[test]
fn test_default_auth_and_rate_limits() {
    let config = AppConfig::default();

    assert_eq!(config.auth.admin_password, "admin123");
    assert_eq!(config.auth.token_ttl_hours, 24);
    assert_eq!(config.rate_limit.window_secs, 900);
    assert_eq!(config.rate_limit.contact_max, 5);
    assert_eq!(config.rate_limit.login_max, 10);
    assert_eq!(config.rate_limit.global_max, 100);
}

#[test]
fn test_default_logging_and_export() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
    assert_eq!(config.export.max_records, 1000);
    assert_eq!(config.export.title, "Contact Submissions Report");
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases: Vec<fn(&mut AppConfig)> = vec![
        |c| c.database.max_connections = 0,
        |c| c.database.connection_timeout_secs = 0,
        |c| c.logging.level = "verbose".to_string(),
        |c| c.logging.format = "xml".to_string(),
        |c| c.rate_limit.contact_max = 0,
        |c| c.rate_limit.window_secs = 0,
        |c| c.export.max_records = 0,
        |c| c.export.max_records = 1001,
        |c| c.auth.jwt_secret = "  ".to_string(),
        |c| c.auth.admin_password = String::new(),
        |c| c.auth.admin_password = "abc".to_string(),
        |c| c.server.cors_origins.push("*".to_string()),
        |c| c.auth.token_ttl_hours = 0,
    ];

    for mutate in cases {
        let mut config = AppConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "{config:?}");
    }
    assert!(AppConfig::default().validate().is_ok());
}

#[test]
fn test_admin_password_must_pass_login_validation() {
    let mut config = AppConfig::default();

    config.auth.admin_password = "abcde".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("at least 6 characters"), "{err}");
    assert!(validate_login(Some(&config.auth.admin_password)).is_err());

    config.auth.admin_password = "abcdef".to_string();
    assert!(config.validate().is_ok());
    assert_eq!(validate_login(Some(&config.auth.admin_password)).unwrap(), "abcdef");
}

#[test]
fn test_wildcard_cors_origin_is_rejected() {
    let mut config = AppConfig::default();
    config.server.cors_origins = vec!["*".to_string()];

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("cors_origins"), "{err}");
}

#[test]
fn test_redacted_masks_secrets() {
    let redacted = AppConfig::default().redacted();
    assert_eq!(redacted.auth.admin_password, "********");
    assert_eq!(redacted.auth.jwt_secret, "********");
    assert_eq!(redacted.server.port, 5000);
}
