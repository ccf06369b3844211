//! Session cookie handling and the sign-out endpoint.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Redirect},
    Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::{
    principal::PersonaId,
    state::{AuthConfig, AuthState},
    storage::SessionRecord,
    types::SessionResponse,
    utils::{generate_session_token, hash_session_token},
};

pub(crate) const SESSION_COOKIE_NAME: &str = "passnote_session";
pub(crate) const HOME_PATH: &str = "/";

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match authenticate_session(&headers, &auth_state).await {
        Ok(Some(record)) => (
            StatusCode::OK,
            Json(SessionResponse {
                persona_id: record.persona_id.into_inner(),
                created_at_unix: record.created_at_unix,
            }),
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(status) => status.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/sign-out",
    responses(
        (status = 303, description = "Session cleared, redirect to the home view")
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn sign_out(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    end_session(&headers, &auth_state).await;

    // Always expire the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    info!("Signed out");
    (response_headers, Redirect::to(HOME_PATH)).into_response()
}

/// Resolve the session cookie into a live session record, if any.
///
/// Returns `Ok(None)` when the cookie is missing, unknown or expired.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Option<SessionRecord>, StatusCode> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    // Only the hash is stored; never compare raw tokens against the store.
    let token_hash = hash_session_token(&token);
    match auth_state.sessions().get(&token_hash).await {
        Ok(record) => Ok(record),
        Err(err) => {
            error!("Failed to lookup session: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Drop the session record the request's cookie points at, if any.
pub(super) async fn end_session(headers: &HeaderMap, auth_state: &AuthState) {
    if let Some(token) = extract_session_token(headers) {
        let token_hash = hash_session_token(&token);
        if let Err(err) = auth_state.sessions().clear(&token_hash).await {
            error!("Failed to delete session: {err}");
        }
    }
}

/// Issue a new session for a verified persona and return its cookie.
pub(super) async fn start_session(
    auth_state: &AuthState,
    persona_id: &PersonaId,
) -> anyhow::Result<HeaderValue> {
    let token = generate_session_token()?;
    auth_state
        .sessions()
        .set(hash_session_token(&token), persona_id)
        .await?;
    Ok(session_cookie(auth_state.config(), &token)?)
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    // Browsers may send several Cookie headers over HTTP/2.
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use url::Url;

    fn config(secure: bool) -> Result<AuthConfig> {
        Ok(AuthConfig::new(
            "site".to_string(),
            Url::parse("https://widget.identity.test/widget.js")?,
        )
        .with_session_ttl_seconds(3600)
        .with_session_cookie_secure(secure))
    }

    #[test]
    fn extract_session_token_finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; passnote_session=abc123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn extract_session_token_ignores_empty_and_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("passnote_session="));
        assert_eq!(extract_session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("malformed; other=1"));
        assert_eq!(extract_session_token(&headers), None);
    }

    #[test]
    fn extract_session_token_reads_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("passnote_session=xyz"));
        assert_eq!(extract_session_token(&headers), Some("xyz".to_string()));
    }

    #[test]
    fn session_cookie_attributes() -> Result<()> {
        let cookie = session_cookie(&config(false)?, "tok")?;
        assert_eq!(
            cookie.to_str()?,
            "passnote_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600"
        );

        let cookie = session_cookie(&config(true)?, "tok")?;
        assert!(cookie.to_str()?.ends_with("; Secure"));
        Ok(())
    }

    #[test]
    fn clear_session_cookie_expires_immediately() -> Result<()> {
        let cookie = clear_session_cookie(&config(false)?)?;
        assert!(cookie.to_str()?.contains("Max-Age=0"));
        assert!(cookie.to_str()?.starts_with("passnote_session=;"));
        Ok(())
    }
}
