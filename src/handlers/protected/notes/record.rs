// handlers/protected/notes/record.rs - /api/notes/:id handlers

use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::api::{ApiJson, NoteView};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::note_service::{parse_note_id, UpdateNoteRequest};
use crate::services::NoteService;
use crate::state::AppState;

pub async fn note_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<NoteView> {
    let note_id = parse_note_id(&id)?;
    let note = NoteService::new(&state).get(user.id, note_id).await?;
    Ok(ApiResponse::success(NoteView::from(note)))
}

/// PUT /api/notes/:id - Partial update; absent fields are left alone
pub async fn note_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateNoteRequest>,
) -> ApiResult<NoteView> {
    let note_id = parse_note_id(&id)?;
    let note = NoteService::new(&state).update(user.id, note_id, request).await?;
    Ok(ApiResponse::success(NoteView::from(note)).message("Note updated successfully"))
}

pub async fn note_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let note_id = parse_note_id(&id)?;
    NoteService::new(&state).delete(user.id, note_id).await?;
    Ok(ApiResponse::success(json!({ "id": note_id })).message("Note deleted successfully"))
}
