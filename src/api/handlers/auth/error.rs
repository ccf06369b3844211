//! Sign-in and session gate failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Redirect target used when the session gate turns a request away.
pub(crate) const UNAUTHORIZED_REDIRECT: &str = "/?error=unauthorized";
/// Redirect target used when a sign-in attempt fails for any reason.
pub(crate) const SIGN_IN_FAILED_REDIRECT: &str = "/?error=sign_in_failed";

/// The identity service did not vouch for the submitted token.
///
/// Variants only exist for server-side logging; users always see the same
/// generic `sign_in_failed` redirect.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("verification token is empty")]
    EmptyToken,
    #[error("verification request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("verification endpoint returned {0}")]
    Status(StatusCode),
    #[error("verification response is malformed")]
    Malformed,
}

impl IntoResponse for AuthenticationError {
    fn into_response(self) -> Response {
        Redirect::to(SIGN_IN_FAILED_REDIRECT).into_response()
    }
}

/// The request reached a protected route without an active session.
#[derive(Debug, Error)]
#[error("no active session")]
pub struct AuthorizationError;

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> Response {
        Redirect::to(UNAUTHORIZED_REDIRECT).into_response()
    }
}
