//! Node routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
};
use notekeep_core::{ContentType, NodeId, NoteId};
use notekeep_store::NewNode;
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub note_id: NoteId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateNodeResponse {
    pub id: NodeId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub content: String,
}

/// POST /node - Append a node at the end of a note.
async fn create_node(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<CreateNodeResponse>)> {
    let node = NewNode {
        content_type: request.content_type,
        content: request.content,
    };
    let id = state
        .repo()
        .append_node(user.user_id, request.note_id, &node)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateNodeResponse { id })))
}

/// PATCH /node/{id} - Replace a node's content.
async fn update_node(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
    Json(request): Json<UpdateNodeRequest>,
) -> ApiResult<StatusCode> {
    state
        .repo()
        .update_node_content(user.user_id, id, &request.content)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /node/{id} - Delete a node; later siblings move up by one.
async fn delete_node(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<NodeId>,
) -> ApiResult<StatusCode> {
    let note_id = state.repo().delete_node(user.user_id, id).await?;
    tracing::info!(node_id = %id, note_id = %note_id, "Deleted node");
    Ok(StatusCode::NO_CONTENT)
}

/// Build node routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/node", post(create_node))
        .route("/node/{id}", patch(update_node).delete(delete_node))
}
