//! Auth handlers and supporting modules.
//!
//! This module covers the passwordless sign-in exchange, server-side
//! sessions and the gate that protects note routes.
//!
//! ## Session lifecycle
//!
//! `Anonymous -> (sign-in ok) -> Authenticated -> (sign-out | expiry) -> Anonymous`.
//! A failed sign-in leaves the caller exactly where it was: no session is
//! created and an existing cookie is not touched.
//!
//! ## Failure responses
//!
//! - Verification failures redirect to `/?error=sign_in_failed`.
//! - Gate rejections redirect to `/?error=unauthorized`.
//!
//! Neither response carries details from the identity service.

mod error;
pub(crate) mod gate;
pub(crate) mod principal;
pub(crate) mod session;
pub(crate) mod sign_in;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
mod verifier;

pub use error::{AuthenticationError, AuthorizationError};
pub use principal::{PersonaId, Principal};
pub use state::{AuthConfig, AuthState};
pub use storage::{SessionRecord, SessionStore, StoreStatus};
pub use verifier::{TokenVerifier, VerifierConfig};

pub(crate) use utils::now_unix_seconds;
#[cfg(test)]
pub(crate) use utils::hash_session_token;
