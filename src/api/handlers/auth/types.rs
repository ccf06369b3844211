//! Request and response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form submitted by the identity widget.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    /// Opaque, single-use token produced by the widget.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub persona_id: String,
    pub created_at_unix: i64,
}
