//! Sign-in endpoint: widget token in, session cookie out.
//!
//! Flow Overview:
//! 1) Read the widget token from the form (or JSON) body.
//! 2) Exchange it for a persona id with the token verifier.
//! 3) Drop the caller's previous session, store the persona id under a fresh
//!    session token and set the cookie.
//!
//! Any failure redirects to `/?error=sign_in_failed` without touching the
//! caller's existing session or cookie.

use axum::{
    extract::{Extension, FromRequest, Request},
    http::{
        header::{CONTENT_TYPE, SET_COOKIE},
        HeaderMap,
    },
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::{
    error::{AuthenticationError, SIGN_IN_FAILED_REDIRECT},
    session::{end_session, start_session, HOME_PATH},
    state::AuthState,
    types::SignInRequest,
};

#[utoipa::path(
    post,
    path = "/sign-in",
    request_body(
        content(
            (SignInRequest = "application/x-www-form-urlencoded"),
            (SignInRequest = "application/json")
        )
    ),
    responses(
        (status = 303, description = "Redirect to `/` on success or to `/?error=sign_in_failed` on failure"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn sign_in(auth_state: Extension<Arc<AuthState>>, request: Request) -> Response {
    let request_headers = request.headers().clone();
    let token = match read_sign_in_request(request).await {
        Ok(payload) => payload.token,
        Err(err) => {
            warn!("Rejected sign-in payload: {err}");
            return AuthenticationError::EmptyToken.into_response();
        }
    };

    let persona_id = match auth_state.verifier().verify(&token).await {
        Ok(persona_id) => persona_id,
        Err(err) => {
            warn!("Sign-in failed: {err}");
            return err.into_response();
        }
    };

    // The previous session, if any, stops resolving once the new one is issued.
    end_session(&request_headers, &auth_state).await;

    match start_session(&auth_state, &persona_id).await {
        Ok(cookie) => {
            info!(persona_id = %persona_id, "Signed in");
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            (headers, Redirect::to(HOME_PATH)).into_response()
        }
        Err(err) => {
            error!("Failed to create session: {err:#}");
            Redirect::to(SIGN_IN_FAILED_REDIRECT).into_response()
        }
    }
}

/// Accept the widget token as a JSON body or, by default, as a form post.
async fn read_sign_in_request(request: Request) -> Result<SignInRequest, String> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        Json::<SignInRequest>::from_request(request, &())
            .await
            .map(|Json(payload)| payload)
            .map_err(|rejection| rejection.body_text())
    } else {
        Form::<SignInRequest>::from_request(request, &())
            .await
            .map(|Form(payload)| payload)
            .map_err(|rejection| rejection.body_text())
    }
}
