//! Auth state and configuration.

use url::Url;

use super::{storage::SessionStore, verifier::TokenVerifier};

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    site_token: String,
    widget_script_url: Url,
    session_ttl_seconds: i64,
    session_cookie_secure: bool,
}

impl AuthConfig {
    /// `site_token` is public and ends up in the widget script URL.
    #[must_use]
    pub fn new(site_token: String, widget_script_url: Url) -> Self {
        Self {
            site_token,
            widget_script_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn site_token(&self) -> &str {
        &self.site_token
    }

    /// Widget script URL with the site token appended as `site_token`.
    #[must_use]
    pub fn widget_src(&self) -> String {
        let mut url = self.widget_script_url.clone();
        url.query_pairs_mut()
            .append_pair("site_token", &self.site_token);
        url.to_string()
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }
}

/// Everything the sign-in flow and the session gate share.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    verifier: TokenVerifier,
    sessions: SessionStore,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, verifier: TokenVerifier, sessions: SessionStore) -> Self {
        Self {
            config,
            verifier,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
