//! Notes API: CRUD scoped to the signed-in persona.
//!
//! Flow Overview:
//! 1) The session gate resolves the cookie and forwards a `Principal`.
//! 2) Handlers validate input and call the note store with the persona id.
//! 3) Missing and foreign notes both return `404`.

mod storage;
#[cfg(test)]
mod tests;
pub(crate) mod types;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::auth::Principal;
pub use storage::{NoteError, NoteRecord, NoteStore};
use types::{CreateNoteRequest, NoteResponse, UpdateNoteRequest, ValidationErrors};

#[utoipa::path(
    get,
    path = "/notes",
    responses(
        (status = 200, description = "Notes owned by the signed-in persona, newest first.", body = [NoteResponse]),
        (status = 303, description = "No active session; redirect to `/?error=unauthorized`."),
    ),
    tag = "notes"
)]
pub async fn list_notes(
    principal: Principal,
    notes: Extension<Arc<NoteStore>>,
) -> Result<Json<Vec<NoteResponse>>, NoteError> {
    let records = notes.list(&principal.persona_id).await?;
    Ok(Json(records.iter().map(NoteRecord::to_response).collect()))
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created.", body = NoteResponse),
        (status = 303, description = "No active session; redirect to `/?error=unauthorized`."),
        (status = 422, description = "Invalid note attributes.", body = ValidationErrors),
    ),
    tag = "notes"
)]
pub async fn create_note(
    principal: Principal,
    notes: Extension<Arc<NoteStore>>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, NoteError> {
    let attrs = payload.validate().map_err(NoteError::Validation)?;
    let record = notes.create(attrs, &principal.persona_id).await?;
    info!(note_id = %record.id(), "Note created");
    Ok((StatusCode::CREATED, Json(record.to_response())))
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note.", body = NoteResponse),
        (status = 303, description = "No active session; redirect to `/?error=unauthorized`."),
        (status = 404, description = "Note is missing or owned by another persona."),
    ),
    tag = "notes"
)]
pub async fn get_note(
    principal: Principal,
    notes: Extension<Arc<NoteStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteResponse>, NoteError> {
    let record = notes.get(id, &principal.persona_id).await?;
    Ok(Json(record.to_response()))
}

#[utoipa::path(
    patch,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated.", body = NoteResponse),
        (status = 303, description = "No active session; redirect to `/?error=unauthorized`."),
        (status = 404, description = "Note is missing or owned by another persona."),
        (status = 422, description = "Invalid note attributes.", body = ValidationErrors),
    ),
    tag = "notes"
)]
pub async fn update_note(
    principal: Principal,
    notes: Extension<Arc<NoteStore>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, NoteError> {
    // Look the note up first so foreign ids 404 before validation runs.
    let entity = notes.get(id, &principal.persona_id).await?;
    let changes = payload.validate().map_err(NoteError::Validation)?;
    let record = notes.update(&entity, changes).await?;
    Ok(Json(record.to_response()))
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 204, description = "Note deleted."),
        (status = 303, description = "No active session; redirect to `/?error=unauthorized`."),
        (status = 404, description = "Note is missing or owned by another persona."),
    ),
    tag = "notes"
)]
pub async fn delete_note(
    principal: Principal,
    notes: Extension<Arc<NoteStore>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, NoteError> {
    let entity = notes.get(id, &principal.persona_id).await?;
    notes.delete(&entity).await?;
    info!(note_id = %id, "Note deleted");
    Ok(StatusCode::NO_CONTENT)
}
