//! HTTP handlers and the extractors they share.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        ConnectInfo, FromRequestParts, Query, Request, State,
    },
    http::{header, request::Parts, Extensions, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::error::{ContactError, Result};
use crate::models::{ContactForm, LoginRequest, SubmissionPage, SubmissionQuery, SubmissionReceipt};
use crate::rate_limit::RateLimiter;
use crate::session::{AdminClaims, ADMIN_ROLE};
use crate::state::AppState;
use crate::validation::{validate_login, validate_pagination};

const PDF_DISPOSITION: &str = "attachment; filename=contact_submissions.pdf";

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolve the client address used for rate limiting.
///
/// The first `X-Forwarded-For` hop wins when `trust_forwarded_for` is set; otherwise the
/// peer address of the connection, falling back to loopback when none is attached.
pub fn client_addr(headers: &HeaderMap, extensions: &Extensions, trust_forwarded_for: bool) -> IpAddr {
    let forwarded = trust_forwarded_for
        .then(|| headers.get("x-forwarded-for")?.to_str().ok())
        .flatten()
        .and_then(|raw| raw.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Address of the calling client
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub IpAddr);

#[async_trait]
impl FromRequestParts<AppState> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Infallible> {
        Ok(Self(client_addr(
            &parts.headers,
            &parts.extensions,
            state.config.server.trust_forwarded_for,
        )))
    }
}

/// A verified admin bearer token
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub claims: AdminClaims,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ContactError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ContactError::Unauthenticated("Access token required".to_string()))?;

        let claims = state.sessions.verify(token)?;

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }
}

fn enforce(state: &AppState, limiter: &RateLimiter, addr: IpAddr) -> Result<()> {
    limiter.check(addr).map_err(|e| {
        state.metrics.record_rate_limited(limiter.policy().name);
        e
    })
}

fn malformed_body(rejection: &JsonRejection) -> ContactError {
    ContactError::InvalidArgument(rejection.body_text())
}

/// Every route passes the global limiter first
pub async fn global_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let addr = client_addr(
        request.headers(),
        request.extensions(),
        state.config.server.trust_forwarded_for,
    );

    match enforce(&state, &state.global_limiter, addr) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// `POST /api/contact`
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    body: std::result::Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<SubmissionReceipt>> {
    enforce(&state, &state.contact_limiter, addr)?;

    let Json(form) = body.map_err(|rejection| malformed_body(&rejection))?;
    let receipt = state.service.submit(form).await?;

    Ok(Json(receipt))
}

/// `GET /api/contact/health`
pub async fn contact_health() -> Json<Value> {
    Json(json!({
        "ok": true,
        "message": "Contact service is healthy",
        "timestamp": timestamp(),
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "message": "Contact intake API is running",
        "timestamp": timestamp(),
        "environment": state.config.server.environment,
    }))
}

/// `POST /api/admin/login`
pub async fn login(
    State(state): State<AppState>,
    ClientAddr(addr): ClientAddr,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    enforce(&state, &state.login_limiter, addr)?;

    let Json(request) = body.map_err(|rejection| malformed_body(&rejection))?;
    let password = validate_login(request.password.as_deref())?;

    if !state.credential.matches(&password) {
        tracing::warn!(client = %addr, "Admin login failed");
        state.metrics.record_login(false);
        return Err(ContactError::Unauthenticated("Invalid credentials".to_string()));
    }

    let token = state.sessions.issue(ADMIN_ROLE)?;
    tracing::info!(client = %addr, "Admin login successful");
    state.metrics.record_login(true);

    Ok(Json(json!({
        "ok": true,
        "token": token,
        "message": "Login successful",
    })))
}

/// `POST /api/admin/logout`
pub async fn logout(State(state): State<AppState>, session: AdminSession) -> Json<Value> {
    state.sessions.revoke(&session.token);
    tracing::info!(jti = %session.claims.jti, "Admin logged out");

    Json(json!({
        "ok": true,
        "message": "Logged out successfully",
    }))
}

/// `GET /api/admin/submissions?limit&offset&search`
pub async fn list_submissions(
    State(state): State<AppState>,
    _session: AdminSession,
    params: std::result::Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<SubmissionPage>> {
    let Query(params) = params.map_err(|rejection| ContactError::InvalidArgument(rejection.body_text()))?;

    let (limit, offset) = validate_pagination(
        params.get("limit").map(String::as_str),
        params.get("offset").map(String::as_str),
    )?;

    let page = state
        .service
        .list(SubmissionQuery {
            limit,
            offset,
            search: params.get("search").cloned(),
        })
        .await?;

    Ok(Json(page))
}

/// `GET /api/admin/export/pdf`
pub async fn export_pdf(State(state): State<AppState>, _session: AdminSession) -> Result<Response> {
    let bytes = state.service.export_pdf(Utc::now()).await?;

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static(PDF_DISPOSITION),
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(bytes.len())),
    ];

    Ok((StatusCode::OK, headers, bytes).into_response())
}

/// `GET /api/admin/stats`
pub async fn stats(State(state): State<AppState>, _session: AdminSession) -> Result<Json<Value>> {
    let stats = state.service.stats(Utc::now()).await?;

    Ok(Json(json!({
        "ok": true,
        "stats": stats,
    })))
}

/// Any unmatched route
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "ok": false,
            "error": "Route not found",
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_forwarded_for_only_when_trusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo::<SocketAddr>("192.0.2.4:5555".parse().unwrap()));

        assert_eq!(
            client_addr(&headers, &extensions, true),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            client_addr(&headers, &extensions, false),
            "192.0.2.4".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            client_addr(&HeaderMap::new(), &Extensions::new(), false),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
    }
}
