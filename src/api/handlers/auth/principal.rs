//! Authenticated principal forwarded by the session gate.
//!
//! Flow Overview: the gate resolves the session cookie to a persona id and
//! stores a `Principal` in the request extensions. Handlers take `Principal`
//! as an extractor and never read the cookie themselves.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::AuthorizationError;

/// Persona identifier issued by the remote identity service.
///
/// Opaque to us; it is trusted once verified and compared byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaId(String);

impl PersonaId {
    /// Wrap a verified persona id. Returns `None` for blank input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated request context derived from the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub persona_id: PersonaId,
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthorizationError;

    // Only the gate inserts a principal; an unguarded route is treated as anonymous.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthorizationError)
    }
}
