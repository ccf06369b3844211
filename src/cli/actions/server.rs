use crate::api::{
    self,
    handlers::auth::{AuthConfig, VerifierConfig},
};
use anyhow::Result;
use secrecy::SecretString;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub site_token: String,
    pub api_token: SecretString,
    pub verify_url: Url,
    pub widget_script_url: Url,
    pub verify_timeout_seconds: u64,
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.site_token, args.widget_script_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_cookie_secure(args.secure_cookies);

    let verifier_config = VerifierConfig::new(args.verify_url, args.api_token)
        .with_timeout(Duration::from_secs(args.verify_timeout_seconds));

    debug!("Auth config: {:?}", auth_config);
    debug!("Verifier config: {:?}", verifier_config);

    api::new(args.port, args.dsn, auth_config, verifier_config).await
}
