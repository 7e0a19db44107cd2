//! Admin session tokens.
//!
//! Tokens are HS256 JWTs carrying the role, issue time, expiry and a random id. A token
//! only authorizes while it is also held in the in-memory active set: logging out or
//! restarting the process invalidates it even before it expires.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::{ContactError, Result};

/// The only role this service issues
pub const ADMIN_ROLE: &str = "admin";

/// Message for every rejected token, whatever the reason
pub const INVALID_TOKEN: &str = "Token expired or invalid";

/// Claims embedded in every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Role granted by the token
    pub role: String,
    /// Issued-at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds)
    pub exp: i64,
    /// Random token id
    pub jti: String,
}

/// Issues, tracks and verifies admin bearer tokens
pub struct SessionStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    // token -> expiry
    active: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SessionStore {
    /// Store signing with `secret`, issuing tokens valid for `ttl`
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `verify_at`
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Store built from the auth section of the configuration
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, Duration::hours(config.token_ttl_hours))
    }

    /// Issue a token for `role` and add it to the active set
    pub fn issue(&self, role: &str) -> Result<String> {
        self.issue_at(role, Utc::now())
    }

    /// Issue a token for `role` as of `now`
    pub fn issue_at(&self, role: &str, now: DateTime<Utc>) -> Result<String> {
        let expires_at = now + self.ttl;
        let claims = AdminClaims {
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: format!("{:032x}", rand::random::<u128>()),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ContactError::Internal(format!("Failed to sign session token: {e}")))?;

        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), expires_at);

        Ok(token)
    }

    /// Verify a presented token now
    pub fn verify(&self, token: &str) -> Result<AdminClaims> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a presented token as of `now`.
    ///
    /// Membership in the active set is checked before the signature and expiry, and
    /// every failure yields the same `Unauthenticated` error.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AdminClaims> {
        let rejected = || ContactError::Unauthenticated(INVALID_TOKEN.to_string());

        if !self.is_active(token) {
            return Err(rejected());
        }

        let claims = decode::<AdminClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Session token failed verification");
                rejected()
            })?
            .claims;

        if claims.exp <= now.timestamp() {
            self.revoke(token);
            return Err(rejected());
        }

        if claims.role != ADMIN_ROLE {
            return Err(rejected());
        }

        Ok(claims)
    }

    /// Remove a token from the active set; returns whether it was present
    pub fn revoke(&self, token: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .is_some()
    }

    /// Whether `token` is currently in the active set
    #[must_use]
    pub fn is_active(&self, token: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(token)
    }

    /// Drop expired tokens from the active set; returns how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let before = active.len();
        active.retain(|_, expires_at| *expires_at > now);
        before - active.len()
    }

    /// Number of tokens in the active set
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// The single shared admin secret
pub struct AdminCredential {
    secret: String,
}

impl AdminCredential {
    /// Credential expecting `secret`
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Direct comparison with the configured secret
    #[must_use]
    pub fn matches(&self, supplied: &str) -> bool {
        supplied == self.secret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_issued_together_differ() {
        let store = SessionStore::new("secret", Duration::hours(24));
        let now = Utc::now();
        let first = store.issue_at(ADMIN_ROLE, now).unwrap();
        let second = store.issue_at(ADMIN_ROLE, now).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.active_sessions(), 2);
    }

    #[test]
    fn test_non_admin_role_is_rejected() {
        let store = SessionStore::new("secret", Duration::hours(24));
        let token = store.issue("viewer").unwrap();
        assert!(matches!(store.verify(&token), Err(ContactError::Unauthenticated(_))));
    }

    #[test]
    fn test_credential_matches_exactly() {
        let credential = AdminCredential::new("admin123");
        assert!(credential.matches("admin123"));
        assert!(!credential.matches("admin1234"));
        assert!(!credential.matches("ADMIN123"));
    }
}
