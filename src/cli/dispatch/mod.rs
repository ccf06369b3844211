//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run, currently always the
//! API server with its full configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{identity, session, ARG_DSN, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .filter(|dsn| !dsn.trim().is_empty());

    let identity_opts = identity::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        site_token: identity_opts.site_token,
        api_token: identity_opts.api_token,
        verify_url: identity_opts.verify_url,
        widget_script_url: identity_opts.widget_script_url,
        verify_timeout_seconds: identity_opts.verify_timeout_seconds,
        session_ttl_seconds: session_opts.ttl_seconds,
        secure_cookies: session_opts.secure_cookies,
    }))
}
