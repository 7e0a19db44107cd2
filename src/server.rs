use std::any::Any;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS},
        HeaderValue, Method, StatusCode,
    },
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tokio::{
    net::TcpListener,
    signal::ctrl_c,
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::routes;
use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": "Internal server error" })),
    )
        .into_response()
}

/// Assemble every route and middleware around `state`
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    let api = Router::new()
        .route("/contact", post(routes::submit_contact))
        .route("/contact/health", get(routes::contact_health))
        .route("/admin/login", post(routes::login))
        .route("/admin/logout", post(routes::logout))
        .route("/admin/submissions", get(routes::list_submissions))
        .route("/admin/export/pdf", get(routes::export_pdf))
        .route("/admin/stats", get(routes::stats));

    Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api)
        .fallback(routes::not_found)
        .layer(from_fn_with_state(state.clone(), routes::global_rate_limit))
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(cors_layer(&server.cors_origins))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drop elapsed rate windows and expired sessions; returns how many entries went
pub fn sweep(state: &AppState, now: Instant) -> usize {
    let windows: usize = state.limiters().iter().map(|limiter| limiter.sweep(now)).sum();
    let sessions = state.sessions.purge_expired(Utc::now());

    if windows + sessions > 0 {
        info!(windows, sessions, "Swept expired state");
    }
    windows + sessions
}

/// Run [`sweep`] on the configured interval until the runtime shuts down
pub fn spawn_maintenance(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.rate_limit.sweep_interval_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep(&state, Instant::now());
        }
    })
}

/// Bind, serve until Ctrl+C or SIGTERM, then drain in-flight requests
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(
        address = %address,
        environment = %state.config.server.environment,
        origins = ?state.config.server.cors_origins,
        "Contact intake server listening"
    );

    let maintenance = spawn_maintenance(state.clone());
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    maintenance.abort();
    served.context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            },
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
