// handlers/protected/notes/collection.rs - /api/notes collection handlers

use axum::{extract::State, Extension};

use crate::api::{notes_to_views, ApiJson, ApiQuery, NoteView};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::note_service::{CreateNoteRequest, ListNotesQuery};
use crate::services::NoteService;
use crate::state::AppState;

/// GET /api/notes - The caller's notes, filtered and sorted
///
/// Query: `category`, `isPinned`, `search`, `sortBy` (title | created_at |
/// updated_at), `order` (asc | desc).
pub async fn notes_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListNotesQuery>,
) -> ApiResult<Vec<NoteView>> {
    let notes = notes_to_views(NoteService::new(&state).list(user.id, query).await?);
    let count = notes.len();
    Ok(ApiResponse::success(notes).count(count))
}

/// POST /api/notes - Create a note owned by the caller
pub async fn notes_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateNoteRequest>,
) -> ApiResult<NoteView> {
    let note = NoteService::new(&state).create(user.id, request).await?;
    Ok(ApiResponse::created(NoteView::from(note)).message("Note created successfully"))
}
