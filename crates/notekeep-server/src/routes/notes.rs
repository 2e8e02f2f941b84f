//! Note routes.
//!
//! Every handler except the public read takes the acting user from the
//! access token and hands it to the repository, which checks ownership
//! before touching storage.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use notekeep_core::{FullNoteUpdate, Note, NoteId, NotePreview};
use notekeep_store::NodeMove;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CreateNoteResponse {
    pub id: NoteId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateFullNoteResponse {
    pub rows_affected: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /note - Create a note with one blank text node.
async fn create_note(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<CreateNoteResponse>)> {
    let id = state.repo().create_note(user.user_id, &request.title).await?;
    tracing::info!(note_id = %id, user_id = %user.user_id, "Created note");
    Ok((StatusCode::CREATED, Json(CreateNoteResponse { id })))
}

/// GET /note/list - The user's notes, most recently updated first.
async fn list_notes(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<NotePreview>>> {
    Ok(Json(state.repo().list_notes(user.user_id).await?))
}

/// GET /note/{id}
async fn get_note(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> ApiResult<Json<Note>> {
    Ok(Json(state.repo().get_note(user.user_id, id).await?))
}

/// PUT /note/{id} - Replace the title and node contents in one transaction.
async fn update_full_note(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
    Json(update): Json<FullNoteUpdate>,
) -> ApiResult<Json<UpdateFullNoteResponse>> {
    let rows_affected = state.repo().update_full_note(user.user_id, id, &update).await?;
    if rows_affected < 1 + update.nodes.len() as u64 {
        tracing::warn!(
            note_id = %id,
            rows_affected,
            requested = update.nodes.len(),
            "Full note update skipped nodes outside the note"
        );
    }
    Ok(Json(UpdateFullNoteResponse { rows_affected }))
}

/// PATCH /note/{id} - Rename.
async fn update_title(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
    Json(request): Json<UpdateTitleRequest>,
) -> ApiResult<StatusCode> {
    state.repo().update_title(user.user_id, id, &request.title).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /note/{id}/order - Move one node to a new position.
async fn reorder_nodes(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
    Json(node_move): Json<NodeMove>,
) -> ApiResult<StatusCode> {
    state.repo().reorder_nodes(user.user_id, id, node_move).await?;
    tracing::info!(
        note_id = %id,
        old_order = node_move.old_order,
        new_order = node_move.new_order,
        "Reordered nodes"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /note/{id}/public
async fn make_public(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> ApiResult<StatusCode> {
    state.repo().make_public(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /note/{id}/private
async fn make_private(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> ApiResult<StatusCode> {
    state.repo().make_private(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /note/{id}/archive
async fn archive(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> ApiResult<StatusCode> {
    state.repo().archive(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /note/{id}/unarchive
async fn unarchive(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> ApiResult<StatusCode> {
    state.repo().unarchive(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /note/{id} - Delete the note and its nodes.
async fn delete_note(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NoteId>,
) -> ApiResult<StatusCode> {
    state.repo().delete_note(user.user_id, id).await?;
    tracing::info!(note_id = %id, user_id = %user.user_id, "Deleted note");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /public/{id} - Read a public note by its public id. No token needed.
async fn get_public_note(
    State(state): State<AppState>,
    Path(public_id): Path<Uuid>,
) -> ApiResult<Json<Note>> {
    Ok(Json(state.repo().get_public_note(public_id).await?))
}

/// Build note routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/note", post(create_note))
        .route("/note/list", get(list_notes))
        .route(
            "/note/{id}",
            get(get_note)
                .put(update_full_note)
                .patch(update_title)
                .delete(delete_note),
        )
        .route("/note/{id}/order", patch(reorder_nodes))
        .route("/note/{id}/public", patch(make_public))
        .route("/note/{id}/private", patch(make_private))
        .route("/note/{id}/archive", patch(archive))
        .route("/note/{id}/unarchive", patch(unarchive))
        .route("/public/{id}", get(get_public_note))
}
