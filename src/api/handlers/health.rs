use super::{auth::AuthState, notes::NoteStore};
use crate::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    sessions: String,
    notes: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Session and note stores are healthy", body = [Health]),
        (status = 503, description = "Session or note store is unhealthy", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(
    method: Method,
    auth_state: Extension<Arc<AuthState>>,
    notes: Extension<Arc<NoteStore>>,
) -> impl IntoResponse {
    let sessions_status = auth_state.sessions().status().await;
    let notes_status = notes.status().await;
    let is_healthy = sessions_status.is_healthy() && notes_status.is_healthy();

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: sessions_status.as_str().to_string(),
        notes: notes_status.as_str().to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    // Fall back to empty headers if the value could not be parsed
    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    if is_healthy {
        debug!("Stores are healthy");
        (StatusCode::OK, headers, body)
    } else {
        debug!("Stores are unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}
