//! Token verifier for the remote passwordless identity service.
//!
//! Flow Overview:
//! 1) The browser widget hands the user an opaque, single-use token.
//! 2) We `POST {"token": ...}` to the verification endpoint, authenticating
//!    with HTTP Basic (API token as the username, empty password).
//! 3) A `200` with `{"persona": {"id": ...}}` yields the verified persona id.
//!
//! Every other outcome is an `AuthenticationError`. Tokens are never cached,
//! retried or logged.

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{error::AuthenticationError, principal::PersonaId};

const DEFAULT_VERIFY_TIMEOUT_SECONDS: u64 = 10;

/// Connection settings for the verification endpoint.
#[derive(Clone)]
pub struct VerifierConfig {
    verify_url: Url,
    api_token: SecretString,
    timeout: Duration,
}

impl VerifierConfig {
    #[must_use]
    pub fn new(verify_url: Url, api_token: SecretString) -> Self {
        Self {
            verify_url,
            api_token,
            timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn verify_url(&self) -> &Url {
        &self.verify_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("verify_url", &self.verify_url.as_str())
            .field("api_token", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct VerificationRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct VerificationResponse {
    persona: PersonaBody,
}

#[derive(Deserialize)]
struct PersonaBody {
    id: String,
}

/// Exchanges widget tokens for verified persona ids.
pub struct TokenVerifier {
    client: Client,
    verify_url: Url,
    api_token: SecretString,
}

impl TokenVerifier {
    /// Build a verifier with its own HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context("Failed to build verification HTTP client")?;

        Ok(Self {
            client,
            verify_url: config.verify_url,
            api_token: config.api_token,
        })
    }

    /// Resolve a widget token into the persona id it was issued for.
    ///
    /// # Errors
    /// Returns `AuthenticationError` for blank tokens, transport failures,
    /// non-200 responses and bodies without a usable `persona.id`.
    #[instrument(skip_all, fields(verify_url = %self.verify_url))]
    pub async fn verify(&self, token: &str) -> Result<PersonaId, AuthenticationError> {
        // Whitespace only decides emptiness; the token is forwarded as received.
        if token.trim().is_empty() {
            return Err(AuthenticationError::EmptyToken);
        }

        let response = self
            .client
            .post(self.verify_url.clone())
            .basic_auth(self.api_token.expose_secret(), None::<&str>)
            .json(&VerificationRequest { token })
            .send()
            .await
            .map_err(|err| {
                warn!("Verification request failed: {err}");
                AuthenticationError::Transport(err)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Token verification rejected: {status}");
            return Err(AuthenticationError::Status(status));
        }

        let body = response.bytes().await.map_err(|err| {
            warn!("Failed to read verification response: {err}");
            AuthenticationError::Transport(err)
        })?;

        let persona_id = parse_persona_id(&body)?;
        debug!("Token verified");

        Ok(persona_id)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("verify_url", &self.verify_url.as_str())
            .field("api_token", &"***")
            .finish_non_exhaustive()
    }
}

fn parse_persona_id(body: &[u8]) -> Result<PersonaId, AuthenticationError> {
    let parsed: VerificationResponse = serde_json::from_slice(body).map_err(|err| {
        // Only the serde error category is logged; the body may carry user data.
        warn!("Malformed verification response: {:?}", err.classify());
        AuthenticationError::Malformed
    })?;
    PersonaId::new(parsed.persona.id).ok_or(AuthenticationError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use base64ct::{Base64, Encoding};
    use std::sync::Arc;
    use tokio::{net::TcpListener, sync::Mutex};

    /// Canned reply for the stub identity service.
    #[derive(Clone)]
    struct Reply {
        status: StatusCode,
        body: &'static str,
    }

    #[derive(Clone, Default)]
    struct Seen {
        authorization: Arc<Mutex<Vec<String>>>,
        bodies: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    async fn stub_verify(
        State((reply, seen)): State<(Reply, Seen)>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> impl IntoResponse {
        if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            seen.authorization.lock().await.push(value.to_string());
        }
        seen.bodies.lock().await.push(body);
        (reply.status, reply.body)
    }

    async fn spawn_stub(reply: Reply) -> Result<(Url, Seen)> {
        let seen = Seen::default();
        let app = Router::new()
            .route("/v1/verify", post(stub_verify))
            .with_state((reply, seen.clone()));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let url = Url::parse(&format!("http://{addr}/v1/verify"))?;
        Ok((url, seen))
    }

    fn verifier(url: Url) -> Result<TokenVerifier> {
        TokenVerifier::new(
            VerifierConfig::new(url, SecretString::from("api_secret"))
                .with_timeout(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn verify_returns_persona_id_on_200() -> Result<()> {
        let (url, seen) = spawn_stub(Reply {
            status: StatusCode::OK,
            body: r#"{"persona":{"id":"p_123","email":"a@example.com"}}"#,
        })
        .await?;

        let persona = verifier(url)?.verify("tok_valid").await?;
        assert_eq!(persona.as_str(), "p_123");

        let expected = format!("Basic {}", Base64::encode_string(b"api_secret:"));
        assert_eq!(*seen.authorization.lock().await, vec![expected]);
        assert_eq!(
            *seen.bodies.lock().await,
            vec![serde_json::json!({"token": "tok_valid"})]
        );
        Ok(())
    }

    #[tokio::test]
    async fn verify_forwards_token_as_received() -> Result<()> {
        let (url, seen) = spawn_stub(Reply {
            status: StatusCode::OK,
            body: r#"{"persona":{"id":"p_123"}}"#,
        })
        .await?;

        verifier(url)?.verify(" tok_valid\n").await?;
        assert_eq!(
            *seen.bodies.lock().await,
            vec![serde_json::json!({"token": " tok_valid\n"})]
        );
        Ok(())
    }

    #[tokio::test]
    async fn verify_rejects_non_200() -> Result<()> {
        let (url, _seen) = spawn_stub(Reply {
            status: StatusCode::UNAUTHORIZED,
            body: "{}",
        })
        .await?;

        let result = verifier(url)?.verify("tok_bad").await;
        assert!(matches!(
            result,
            Err(AuthenticationError::Status(StatusCode::UNAUTHORIZED))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn verify_rejects_200_without_persona() -> Result<()> {
        let (url, _seen) = spawn_stub(Reply {
            status: StatusCode::OK,
            body: r#"{"status":"ok"}"#,
        })
        .await?;

        let result = verifier(url)?.verify("tok_odd").await;
        assert!(matches!(result, Err(AuthenticationError::Malformed)));
        Ok(())
    }

    #[tokio::test]
    async fn verify_rejects_blank_token_without_calling_remote() -> Result<()> {
        let (url, seen) = spawn_stub(Reply {
            status: StatusCode::OK,
            body: r#"{"persona":{"id":"p_123"}}"#,
        })
        .await?;

        let result = verifier(url)?.verify("   ").await;
        assert!(matches!(result, Err(AuthenticationError::EmptyToken)));
        assert!(seen.bodies.lock().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn verify_maps_connection_errors() -> Result<()> {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/v1/verify"))?;
        let result = verifier(url)?.verify("tok_valid").await;
        assert!(matches!(result, Err(AuthenticationError::Transport(_))));
        Ok(())
    }

    #[test]
    fn parse_persona_id_handles_shapes() {
        assert_eq!(
            parse_persona_id(br#"{"persona":{"id":"p_1"}}"#)
                .ok()
                .map(PersonaId::into_inner),
            Some("p_1".to_string())
        );
        assert!(parse_persona_id(b"not json").is_err());
        assert!(parse_persona_id(br#"{"persona":{}}"#).is_err());
        assert!(parse_persona_id(br#"{"persona":{"id":42}}"#).is_err());
        assert!(parse_persona_id(br#"{"persona":{"id":""}}"#).is_err());
    }

    #[test]
    fn verifier_config_debug_hides_api_token() -> Result<()> {
        let config = VerifierConfig::new(
            Url::parse("https://identity.test/verify")?,
            SecretString::from("api_secret"),
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("api_secret"));
        assert_eq!(
            config.timeout(),
            Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECONDS)
        );
        Ok(())
    }
}
