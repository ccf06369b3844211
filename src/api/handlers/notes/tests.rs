//! Router-level tests for the notes API.

use crate::api::{
    app,
    handlers::auth::{
        hash_session_token, AuthConfig, AuthState, PersonaId, SessionStore, TokenVerifier,
        VerifierConfig,
    },
};
use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;

use super::{types::NoteResponse, NoteStore};

struct TestApp {
    router: Router,
    auth_state: Arc<AuthState>,
}

impl TestApp {
    fn new() -> Result<Self> {
        let verifier = TokenVerifier::new(VerifierConfig::new(
            Url::parse("http://127.0.0.1:9/verify")?,
            SecretString::from("api"),
        ))?;
        let auth_state = Arc::new(AuthState::new(
            AuthConfig::new(
                "site".to_string(),
                Url::parse("https://widget.identity.test/widget.js")?,
            ),
            verifier,
            SessionStore::memory(3600),
        ));
        let router = app(auth_state.clone(), Arc::new(NoteStore::memory()));
        Ok(Self { router, auth_state })
    }

    /// Create a session for `persona` and return the cookie header value.
    async fn sign_in_as(&self, persona: &str, token: &str) -> Result<String> {
        let persona = PersonaId::new(persona).context("persona id")?;
        self.auth_state
            .sessions()
            .set(hash_session_token(token), &persona)
            .await?;
        Ok(format!("passnote_session={token}"))
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Result<Response> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };
        Ok(self.router.clone().oneshot(request).await?)
    }
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = to_bytes(response.into_body(), 64 * 1024).await?;
    serde_json::from_slice(&bytes).context("decode response body")
}

#[tokio::test]
async fn anonymous_requests_are_redirected() -> Result<()> {
    let app = TestApp::new()?;

    for (method, uri) in [
        (Method::GET, "/notes"),
        (Method::POST, "/notes"),
        (Method::GET, "/notes/00000000-0000-0000-0000-000000000000"),
        (Method::DELETE, "/notes/00000000-0000-0000-0000-000000000000"),
    ] {
        let response = app.send(method, uri, None, None).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/?error=unauthorized")
        );
    }
    Ok(())
}

#[tokio::test]
async fn create_list_update_delete() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in_as("p_123", "tok-a").await?;

    let response = app
        .send(
            Method::POST,
            "/notes",
            Some(&cookie),
            Some(json!({"title": " Groceries ", "body": "milk"})),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: NoteResponse = json_body(response).await?;
    assert_eq!(created.title, "Groceries");

    let response = app.send(Method::GET, "/notes", Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<NoteResponse> = json_body(response).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);

    let uri = format!("/notes/{}", created.id);
    let response = app
        .send(
            Method::PATCH,
            &uri,
            Some(&cookie),
            Some(json!({"body": "milk, eggs"})),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: NoteResponse = json_body(response).await?;
    assert_eq!(updated.title, "Groceries");
    assert_eq!(updated.body, "milk, eggs");

    let response = app.send(Method::DELETE, &uri, Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.send(Method::GET, &uri, Some(&cookie), None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn notes_are_invisible_to_other_personas() -> Result<()> {
    let app = TestApp::new()?;
    let alice = app.sign_in_as("p_alice", "tok-alice").await?;
    let bob = app.sign_in_as("p_bob", "tok-bob").await?;

    let response = app
        .send(
            Method::POST,
            "/notes",
            Some(&alice),
            Some(json!({"title": "diary"})),
        )
        .await?;
    let note: NoteResponse = json_body(response).await?;
    let uri = format!("/notes/{}", note.id);

    let listed: Vec<NoteResponse> =
        json_body(app.send(Method::GET, "/notes", Some(&bob), None).await?).await?;
    assert!(listed.is_empty());

    for method in [Method::GET, Method::DELETE] {
        let response = app.send(method, &uri, Some(&bob), None).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    let response = app
        .send(
            Method::PATCH,
            &uri,
            Some(&bob),
            Some(json!({"title": "hijacked"})),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Alice still sees the original note.
    let response = app.send(Method::GET, &uri, Some(&alice), None).await?;
    let still: NoteResponse = json_body(response).await?;
    assert_eq!(still.title, "diary");
    Ok(())
}

#[tokio::test]
async fn invalid_notes_are_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in_as("p_123", "tok-a").await?;

    let response = app
        .send(
            Method::POST,
            "/notes",
            Some(&cookie),
            Some(json!({"title": "   "})),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors: Value = json_body(response).await?;
    assert_eq!(errors["errors"][0], "Title can't be blank.");

    let response = app
        .send(
            Method::POST,
            "/notes",
            Some(&cookie),
            Some(json!({"body": "x"})),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors: Value = json_body(response).await?;
    assert_eq!(errors["errors"], json!(["Title can't be blank."]));

    let created: NoteResponse = json_body(
        app.send(
            Method::POST,
            "/notes",
            Some(&cookie),
            Some(json!({"title": "ok"})),
        )
        .await?,
    )
    .await?;
    let response = app
        .send(
            Method::PATCH,
            &format!("/notes/{}", created.id),
            Some(&cookie),
            Some(json!({})),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn malformed_note_id_is_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in_as("p_123", "tok-a").await?;

    let response = app
        .send(Method::GET, "/notes/not-a-uuid", Some(&cookie), None)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
