//! Note storage scoped by owner persona.
//!
//! Every lookup filters by `persona_id`; a note owned by another persona is
//! reported exactly like a missing one.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::RwLock;
use tracing::{error, instrument};
use uuid::Uuid;

use super::types::{NewNote, NoteChanges, NoteResponse, ValidationErrors};
use crate::api::handlers::auth::{now_unix_seconds, PersonaId, StoreStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    id: Uuid,
    persona_id: String,
    title: String,
    body: String,
    created_at_unix: i64,
    updated_at_unix: i64,
}

impl NoteRecord {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn persona_id(&self) -> &str {
        &self.persona_id
    }

    pub(super) fn to_response(&self) -> NoteResponse {
        NoteResponse {
            id: self.id.to_string(),
            title: self.title.clone(),
            body: self.body.clone(),
            created_at_unix: self.created_at_unix,
            updated_at_unix: self.updated_at_unix,
        }
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            persona_id: row.try_get("persona_id")?,
            title: row.try_get("title")?,
            body: row.try_get("body")?,
            created_at_unix: row.try_get("created_at_unix")?,
            updated_at_unix: row.try_get("updated_at_unix")?,
        })
    }
}

#[derive(Debug)]
pub enum NoteError {
    Validation(Vec<String>),
    NotFound,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for NoteError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl IntoResponse for NoteError {
    /// Database errors are logged server-side and surfaced as `500` without details.
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationErrors { errors }),
            )
                .into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

const NOTE_COLUMNS: &str = r"
    id, persona_id, title, body,
    EXTRACT(EPOCH FROM created_at)::BIGINT AS created_at_unix,
    EXTRACT(EPOCH FROM updated_at)::BIGINT AS updated_at_unix
";

#[derive(Debug)]
enum NoteBackend {
    /// Insertion ordered; newest notes are at the end.
    Memory(RwLock<Vec<NoteRecord>>),
    Postgres(PgPool),
}

#[derive(Debug)]
pub struct NoteStore {
    backend: NoteBackend,
}

impl NoteStore {
    #[must_use]
    pub fn memory() -> Self {
        Self {
            backend: NoteBackend::Memory(RwLock::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            backend: NoteBackend::Postgres(pool),
        }
    }

    /// All notes owned by `owner`, newest first.
    #[instrument(skip_all)]
    pub(crate) async fn list(&self, owner: &PersonaId) -> Result<Vec<NoteRecord>, NoteError> {
        match &self.backend {
            NoteBackend::Memory(notes) => Ok(notes
                .read()
                .await
                .iter()
                .rev()
                .filter(|note| note.persona_id == owner.as_str())
                .cloned()
                .collect()),
            NoteBackend::Postgres(pool) => {
                let rows = sqlx::query(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes WHERE persona_id = $1 ORDER BY created_at DESC, id"
                ))
                .bind(owner.as_str())
                .fetch_all(pool)
                .await?;
                rows.iter()
                    .map(NoteRecord::from_row)
                    .collect::<Result<Vec<_>, sqlx::Error>>()
                    .map_err(NoteError::from)
            }
        }
    }

    /// Fetch one note, or `NotFound` when it is missing or owned by someone else.
    #[instrument(skip_all, fields(note_id = %id))]
    pub(crate) async fn get(&self, id: Uuid, owner: &PersonaId) -> Result<NoteRecord, NoteError> {
        match &self.backend {
            NoteBackend::Memory(notes) => notes
                .read()
                .await
                .iter()
                .find(|note| note.id == id && note.persona_id == owner.as_str())
                .cloned()
                .ok_or(NoteError::NotFound),
            NoteBackend::Postgres(pool) => {
                let row = sqlx::query(&format!(
                    "SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND persona_id = $2"
                ))
                .bind(id)
                .bind(owner.as_str())
                .fetch_optional(pool)
                .await?;
                row.as_ref()
                    .map(NoteRecord::from_row)
                    .transpose()?
                    .ok_or(NoteError::NotFound)
            }
        }
    }

    #[instrument(skip_all)]
    pub(crate) async fn create(
        &self,
        attrs: NewNote,
        owner: &PersonaId,
    ) -> Result<NoteRecord, NoteError> {
        match &self.backend {
            NoteBackend::Memory(notes) => {
                let now = now_unix_seconds();
                let record = NoteRecord {
                    id: Uuid::new_v4(),
                    persona_id: owner.as_str().to_string(),
                    title: attrs.title,
                    body: attrs.body,
                    created_at_unix: now,
                    updated_at_unix: now,
                };
                notes.write().await.push(record.clone());
                Ok(record)
            }
            NoteBackend::Postgres(pool) => {
                let row = sqlx::query(&format!(
                    "INSERT INTO notes (persona_id, title, body) VALUES ($1, $2, $3) RETURNING {NOTE_COLUMNS}"
                ))
                .bind(owner.as_str())
                .bind(&attrs.title)
                .bind(&attrs.body)
                .fetch_one(pool)
                .await?;
                Ok(NoteRecord::from_row(&row)?)
            }
        }
    }

    /// Apply `attrs` to a note previously loaded with `get`.
    #[instrument(skip_all, fields(note_id = %entity.id))]
    pub(crate) async fn update(
        &self,
        entity: &NoteRecord,
        attrs: NoteChanges,
    ) -> Result<NoteRecord, NoteError> {
        match &self.backend {
            NoteBackend::Memory(notes) => {
                let mut notes = notes.write().await;
                let note = notes
                    .iter_mut()
                    .find(|note| note.id == entity.id && note.persona_id == entity.persona_id)
                    .ok_or(NoteError::NotFound)?;
                if let Some(title) = attrs.title {
                    note.title = title;
                }
                if let Some(body) = attrs.body {
                    note.body = body;
                }
                note.updated_at_unix = now_unix_seconds();
                Ok(note.clone())
            }
            NoteBackend::Postgres(pool) => {
                let row = sqlx::query(&format!(
                    r"
                    UPDATE notes
                    SET title = COALESCE($3, title),
                        body = COALESCE($4, body),
                        updated_at = NOW()
                    WHERE id = $1 AND persona_id = $2
                    RETURNING {NOTE_COLUMNS}
                    "
                ))
                .bind(entity.id)
                .bind(&entity.persona_id)
                .bind(attrs.title)
                .bind(attrs.body)
                .fetch_optional(pool)
                .await?;
                row.as_ref()
                    .map(NoteRecord::from_row)
                    .transpose()?
                    .ok_or(NoteError::NotFound)
            }
        }
    }

    /// Delete a note previously loaded with `get`.
    #[instrument(skip_all, fields(note_id = %entity.id))]
    pub(crate) async fn delete(&self, entity: &NoteRecord) -> Result<(), NoteError> {
        match &self.backend {
            NoteBackend::Memory(notes) => {
                let mut notes = notes.write().await;
                let before = notes.len();
                notes.retain(|note| !(note.id == entity.id && note.persona_id == entity.persona_id));
                if notes.len() == before {
                    Err(NoteError::NotFound)
                } else {
                    Ok(())
                }
            }
            NoteBackend::Postgres(pool) => {
                let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND persona_id = $2")
                    .bind(entity.id)
                    .bind(&entity.persona_id)
                    .execute(pool)
                    .await?;
                if result.rows_affected() == 0 {
                    Err(NoteError::NotFound)
                } else {
                    Ok(())
                }
            }
        }
    }

    pub async fn status(&self) -> StoreStatus {
        match &self.backend {
            NoteBackend::Memory(_) => StoreStatus::Memory,
            NoteBackend::Postgres(pool) => match sqlx::query("SELECT 1").execute(pool).await {
                Ok(_) => StoreStatus::Ok,
                Err(err) => {
                    error!("Failed to ping database: {err}");
                    StoreStatus::Error
                }
            },
        }
    }
}
