//! Home view.
//!
//! Serves what a page needs to embed the sign-in widget plus the current
//! sign-in state. Sign-in and gate failures land here with an `error` flag.

use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::{session::authenticate_session, AuthState};

/// Error flags the home view recognises; anything else is dropped.
const KNOWN_ERRORS: [&str; 2] = ["sign_in_failed", "unauthorized"];

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HomeView {
    pub site_token: String,
    pub widget_src: String,
    pub persona_id: Option<String>,
    pub error: Option<String>,
}

pub async fn root(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<HomeQuery>,
) -> impl IntoResponse {
    // Lookup failures render the anonymous view; the gate reports them on protected routes.
    let persona_id = authenticate_session(&headers, &auth_state)
        .await
        .ok()
        .flatten()
        .map(|record| record.persona_id.into_inner());

    Json(HomeView {
        site_token: auth_state.config().site_token().to_string(),
        widget_src: auth_state.config().widget_src(),
        persona_id,
        error: query
            .error
            .filter(|flag| KNOWN_ERRORS.contains(&flag.as_str())),
    })
}
