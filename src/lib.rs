//! # Passnote (notes with passwordless sign-in)
//!
//! `passnote` is a small notes service that delegates sign-in to a remote
//! passwordless identity service.
//!
//! ## Sign-in
//!
//! The browser loads the identity service widget (parameterized by the public
//! site token) and receives an opaque, single-use token. The token is posted to
//! `/sign-in`, where the server exchanges it for a persona id by calling the
//! verification endpoint with HTTP Basic auth (the secret API token as the
//! username, empty password). On success a server-side session is created and
//! the raw session token is handed to the browser in an `HttpOnly` cookie.
//!
//! A persona id stored in a session is trusted until the session is cleared or
//! expires; there is no local user table.
//!
//! ## Authorization
//!
//! Every `/notes` route sits behind the session gate. Requests without a
//! session are redirected to `/?error=unauthorized`; requests with a session
//! see only notes owned by their persona. Notes owned by someone else return
//! `404 Not Found`, the same as notes that do not exist.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
