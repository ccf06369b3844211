//! Server-side session storage.
//!
//! Sessions are keyed by the SHA-256 hash of the cookie token and hold exactly
//! one value: the persona id verified at sign-in. Two backends exist: an
//! in-memory map (default, also used by tests) and the `sessions` table in
//! `PostgreSQL`.

use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::{principal::PersonaId, utils::now_unix_seconds};

/// Result of a storage backend health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// In-process storage, nothing external to reach.
    Memory,
    /// Database answered a ping.
    Ok,
    /// Database is unreachable.
    Error,
}

impl StoreStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn is_healthy(self) -> bool {
        !matches!(self, Self::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub persona_id: PersonaId,
    pub created_at_unix: i64,
}

#[derive(Debug)]
enum SessionBackend {
    Memory(Mutex<HashMap<Vec<u8>, SessionRecord>>),
    Postgres(PgPool),
}

#[derive(Debug)]
pub struct SessionStore {
    backend: SessionBackend,
    ttl_seconds: i64,
}

impl SessionStore {
    #[must_use]
    pub fn memory(ttl_seconds: i64) -> Self {
        Self {
            backend: SessionBackend::Memory(Mutex::new(HashMap::new())),
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn postgres(pool: PgPool, ttl_seconds: i64) -> Self {
        Self {
            backend: SessionBackend::Postgres(pool),
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Look up a live session. Expired records are treated as missing.
    ///
    /// # Errors
    /// Returns a database error when the `PostgreSQL` backend fails.
    #[instrument(skip_all)]
    pub async fn get(&self, token_hash: &[u8]) -> Result<Option<SessionRecord>, sqlx::Error> {
        match &self.backend {
            SessionBackend::Memory(sessions) => {
                let mut sessions = sessions.lock().await;
                let now = now_unix_seconds();
                let found = sessions
                    .get(token_hash)
                    .map(|record| (self.is_live(record, now), record.clone()));
                match found {
                    Some((true, record)) => Ok(Some(record)),
                    Some((false, _)) => {
                        debug!("Dropping expired session");
                        sessions.remove(token_hash);
                        Ok(None)
                    }
                    None => Ok(None),
                }
            }
            SessionBackend::Postgres(pool) => {
                let row = sqlx::query(
                    r"
                    SELECT persona_id,
                        EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix
                    FROM sessions
                    WHERE token_hash = $1
                      AND expires_at > NOW()
                    ",
                )
                .bind(token_hash)
                .fetch_optional(pool)
                .await?;

                let Some(row) = row else {
                    return Ok(None);
                };
                let persona_id: String = row.try_get("persona_id")?;
                let created_at_unix: i64 = row.try_get("created_at_unix")?;
                // A blank id can only come from manual edits; treat it as no session.
                Ok(PersonaId::new(persona_id).map(|persona_id| SessionRecord {
                    persona_id,
                    created_at_unix,
                }))
            }
        }
    }

    /// Store the persona id under a freshly issued token hash.
    ///
    /// Expired records are pruned first on both backends.
    ///
    /// # Errors
    /// Returns a database error when the `PostgreSQL` backend fails.
    #[instrument(skip_all)]
    pub async fn set(&self, token_hash: Vec<u8>, persona_id: &PersonaId) -> Result<(), sqlx::Error> {
        match &self.backend {
            SessionBackend::Memory(sessions) => {
                let mut sessions = sessions.lock().await;
                let now = now_unix_seconds();
                sessions.retain(|_, record| self.is_live(record, now));
                sessions.insert(
                    token_hash,
                    SessionRecord {
                        persona_id: persona_id.clone(),
                        created_at_unix: now,
                    },
                );
                Ok(())
            }
            SessionBackend::Postgres(pool) => {
                let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
                    .execute(pool)
                    .await?
                    .rows_affected();
                if pruned > 0 {
                    debug!(pruned, "Dropped expired sessions");
                }

                sqlx::query(
                    r"
                    INSERT INTO sessions (token_hash, persona_id, expires_at)
                    VALUES ($1, $2, NOW() + make_interval(secs => $3::DOUBLE PRECISION))
                    ",
                )
                .bind(token_hash)
                .bind(persona_id.as_str())
                .bind(self.ttl_seconds)
                .execute(pool)
                .await?;
                Ok(())
            }
        }
    }

    /// Remove a session. Missing sessions are not an error.
    ///
    /// # Errors
    /// Returns a database error when the `PostgreSQL` backend fails.
    #[instrument(skip_all)]
    pub async fn clear(&self, token_hash: &[u8]) -> Result<(), sqlx::Error> {
        match &self.backend {
            SessionBackend::Memory(sessions) => {
                sessions.lock().await.remove(token_hash);
                Ok(())
            }
            SessionBackend::Postgres(pool) => {
                sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
                    .bind(token_hash)
                    .execute(pool)
                    .await?;
                Ok(())
            }
        }
    }

    /// Check the backend for `/health`.
    pub async fn status(&self) -> StoreStatus {
        match &self.backend {
            SessionBackend::Memory(_) => StoreStatus::Memory,
            SessionBackend::Postgres(pool) => match sqlx::query("SELECT 1").execute(pool).await {
                Ok(_) => StoreStatus::Ok,
                Err(err) => {
                    tracing::error!("Failed to ping database: {err}");
                    StoreStatus::Error
                }
            },
        }
    }

    fn is_live(&self, record: &SessionRecord, now: i64) -> bool {
        now - record.created_at_unix < self.ttl_seconds
    }
}
