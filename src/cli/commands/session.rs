use clap::{builder::FalseyValueParser, Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SECURE_COOKIES: &str = "secure-cookies";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(604_800),
            secure_cookies: matches.get_flag(ARG_SECURE_COOKIES),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("PASSNOTE_SESSION_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SECURE_COOKIES)
                .long(ARG_SECURE_COOKIES)
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("PASSNOTE_SECURE_COOKIES")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
}
