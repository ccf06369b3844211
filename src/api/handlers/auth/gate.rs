//! Session gate for protected routes.
//!
//! Runs before every protected handler. It only reads the session store: no
//! network calls, no writes (expired in-memory records aside).

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{
    error::AuthorizationError, principal::Principal, session::authenticate_session,
    state::AuthState,
};

/// Forward the session's persona id to the handler or redirect anonymous callers.
pub async fn require_session(
    auth_state: Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate_session(request.headers(), &auth_state).await {
        Ok(Some(record)) => {
            request.extensions_mut().insert(Principal {
                persona_id: record.persona_id,
            });
            next.run(request).await
        }
        Ok(None) => {
            debug!(path = %request.uri().path(), "Rejected request without session");
            AuthorizationError.into_response()
        }
        Err(status) => status.into_response(),
    }
}
