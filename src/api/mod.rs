use crate::api::handlers::{
    auth::{AuthConfig, AuthState, SessionStore, TokenVerifier, VerifierConfig},
    health,
    notes::NoteStore,
    root,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, options},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;

pub mod handlers;
// OpenAPI router wiring and route registration live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> utoipa_axum::router::OpenApiRouter {
    openapi::api_router()
}

/// Assemble the full application: documented routes, undocumented extras
/// and the shared middleware stack.
#[must_use]
pub fn app(auth_state: Arc<AuthState>, notes: Arc<NoteStore>) -> Router {
    let (router, _openapi) = router().split_for_parts();
    router
        .route("/", get(root::root))
        .route("/health", options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state))
                .layer(Extension(notes)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or to start the server
pub async fn new(
    port: u16,
    dsn: Option<String>,
    auth_config: AuthConfig,
    verifier_config: VerifierConfig,
) -> Result<()> {
    let ttl_seconds = auth_config.session_ttl_seconds();

    let (sessions, notes) = if let Some(dsn) = dsn {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(&dsn)
            .await
            .context("Failed to connect to database")?;
        (
            SessionStore::postgres(pool.clone(), ttl_seconds),
            NoteStore::postgres(pool),
        )
    } else {
        warn!("No DSN configured; sessions and notes are kept in memory");
        (SessionStore::memory(ttl_seconds), NoteStore::memory())
    };

    info!(verify_url = %verifier_config.verify_url(), "Using identity verification endpoint");
    let verifier = TokenVerifier::new(verifier_config)?;
    let auth_state = Arc::new(AuthState::new(auth_config, verifier, sessions));

    let app = app(auth_state, Arc::new(notes));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {err}");
                std::future::pending::<()>().await;
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
