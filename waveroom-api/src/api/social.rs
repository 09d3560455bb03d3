//! Comments and likes

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use waveroom_common::db::{Comment, Project};

use crate::api::{AuthUser, MessageResponse};
use crate::db::{projects, social};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    /// Position in the track timeline, seconds
    #[serde(default)]
    pub timestamp: f64,
}

async fn require_readable(
    state: &AppState,
    project_id: &str,
    user_id: &str,
) -> ApiResult<Project> {
    let project = projects::fetch_project(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    if !project.can_read(user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }
    Ok(project)
}

/// POST /api/projects/:project_id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
    }
    let project = require_readable(&state, &project_id, &auth.user_id).await?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        project_id: project.id,
        user_id: auth.user_id,
        content: payload.content,
        timestamp: payload.timestamp,
        likes: 0,
        created_at: Utc::now(),
    };
    social::insert_comment(&state.db, &comment).await?;
    Ok(Json(comment))
}

/// GET /api/projects/:project_id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    let project = require_readable(&state, &project_id, &auth.user_id).await?;
    let comments = social::list_comments(&state.db, &project.id).await?;
    Ok(Json(comments))
}

/// POST /api/projects/:project_id/like
///
/// Toggles: a second like from the same user removes the first.
pub async fn toggle_like(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let project = require_readable(&state, &project_id, &auth.user_id).await?;
    let liked = social::toggle_like(&state.db, &project.id, &auth.user_id).await?;
    let message = if liked { "Project liked" } else { "Project unliked" };
    Ok(Json(MessageResponse::new(message)))
}
