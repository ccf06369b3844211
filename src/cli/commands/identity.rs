//! Identity service arguments: widget, verification endpoint and credentials.

use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

pub const ARG_SITE_TOKEN: &str = "site-token";
pub const ARG_API_TOKEN: &str = "api-token";
pub const ARG_VERIFY_URL: &str = "verify-url";
pub const ARG_WIDGET_SCRIPT_URL: &str = "widget-script-url";
pub const ARG_VERIFY_TIMEOUT_SECONDS: &str = "verify-timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub site_token: String,
    pub api_token: SecretString,
    pub verify_url: Url,
    pub widget_script_url: Url,
    pub verify_timeout_seconds: u64,
}

impl Options {
    /// Parse identity service arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or a URL is invalid.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Env vars set to "" come through as present; treat them as missing.
        let required = |id: &str| -> anyhow::Result<String> {
            match matches.get_one::<String>(id) {
                Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
                _ => anyhow::bail!("missing required argument: --{id}"),
            }
        };
        let url = |id: &str| -> anyhow::Result<Url> {
            let raw = required(id)?;
            Url::parse(&raw).map_err(|err| anyhow::anyhow!("invalid --{id} '{raw}': {err}"))
        };

        Ok(Self {
            site_token: required(ARG_SITE_TOKEN)?,
            api_token: SecretString::from(required(ARG_API_TOKEN)?),
            verify_url: url(ARG_VERIFY_URL)?,
            widget_script_url: url(ARG_WIDGET_SCRIPT_URL)?,
            verify_timeout_seconds: matches
                .get_one::<u64>(ARG_VERIFY_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(10),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SITE_TOKEN)
                .long(ARG_SITE_TOKEN)
                .help("Public site token passed to the sign-in widget")
                .env("PASSNOTE_SITE_TOKEN"),
        )
        .arg(
            Arg::new(ARG_API_TOKEN)
                .long(ARG_API_TOKEN)
                .help("Secret API token used to call the verification endpoint")
                .long_help(
                    "Secret API token used as the HTTP Basic auth username (empty password) when calling the verification endpoint. Never sent to the browser.",
                )
                .env("PASSNOTE_API_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_VERIFY_URL)
                .long(ARG_VERIFY_URL)
                .help("Identity service token verification endpoint")
                .env("PASSNOTE_VERIFY_URL"),
        )
        .arg(
            Arg::new(ARG_WIDGET_SCRIPT_URL)
                .long(ARG_WIDGET_SCRIPT_URL)
                .help("Sign-in widget script URL")
                .env("PASSNOTE_WIDGET_SCRIPT_URL"),
        )
        .arg(
            Arg::new(ARG_VERIFY_TIMEOUT_SECONDS)
                .long(ARG_VERIFY_TIMEOUT_SECONDS)
                .help("Timeout for verification requests in seconds")
                .env("PASSNOTE_VERIFY_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
