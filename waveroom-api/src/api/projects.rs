//! Project and track CRUD
//!
//! Write access follows the membership rule shared with the audio
//! pipeline: the owner and listed collaborators may modify a project;
//! only the owner may delete it or grow the collaborator list.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use waveroom_common::db::{AudioClip, Project, Track};

use crate::api::{AuthUser, MessageResponse};
use crate::db::{projects, users};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub bpm: Option<i64>,
    pub time_signature: Option<String>,
    pub key: Option<String>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub genre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTrackRequest {
    pub name: String,
    #[serde(default)]
    pub instrument: String,
    pub volume: Option<f64>,
    pub pan: Option<f64>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTrackRequest {
    pub name: Option<String>,
    pub instrument: Option<String>,
    pub volume: Option<f64>,
    pub pan: Option<f64>,
    pub muted: Option<bool>,
    pub solo: Option<bool>,
    pub effects: Option<Vec<serde_json::Value>>,
    pub color: Option<String>,
    /// Whole-array clip replacement
    pub clips: Option<Vec<AudioClip>>,
    pub is_recording: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AddCollaboratorRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct PublicQuery {
    pub limit: Option<i64>,
}

/// Fetch a project or fail with 404
async fn require_project(state: &AppState, project_id: &str) -> ApiResult<Project> {
    projects::fetch_project(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<Json<Project>> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name cannot be empty".to_string()));
    }

    let mut project = Project::new(payload.name, auth.user_id);
    project.description = payload.description;
    project.is_public = payload.is_public;

    projects::insert_project(&state.db, &project).await?;
    info!("Created project {} ({})", project.name, project.id);
    Ok(Json(project))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = projects::list_for_user(&state.db, &auth.user_id).await?;
    Ok(Json(projects))
}

/// GET /api/projects/public
pub async fn list_public_projects(
    State(state): State<AppState>,
    Query(query): Query<PublicQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let projects = projects::list_public(&state.db, limit).await?;
    Ok(Json(projects))
}

/// GET /api/projects/:project_id
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<Project>> {
    let project = require_project(&state, &project_id).await?;
    if !project.can_read(&auth.user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }
    Ok(Json(project))
}

/// PUT /api/projects/:project_id
pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(payload): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let mut project = require_project(&state, &project_id).await?;
    if !project.can_write(&auth.user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }

    if let Some(name) = payload.name {
        project.name = name;
    }
    if let Some(description) = payload.description {
        project.description = Some(description);
    }
    if let Some(bpm) = payload.bpm {
        project.bpm = bpm;
    }
    if let Some(time_signature) = payload.time_signature {
        project.time_signature = time_signature;
    }
    if let Some(key) = payload.key {
        project.key = key;
    }
    if let Some(is_public) = payload.is_public {
        project.is_public = is_public;
    }
    if let Some(tags) = payload.tags {
        project.tags = tags;
    }
    if let Some(genre) = payload.genre {
        project.genre = Some(genre);
    }
    project.updated_at = Utc::now();

    projects::save_project(&state.db, &project).await?;
    Ok(Json(project))
}

/// DELETE /api/projects/:project_id
///
/// Owner only. Artifacts referenced by the project's clips are
/// removed best-effort; the document delete is what must succeed.
pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let project = require_project(&state, &project_id).await?;
    if project.owner_id != auth.user_id {
        return Err(ApiError::Forbidden("Only the owner may delete a project".to_string()));
    }

    for track in &project.tracks {
        for clip in &track.clips {
            if let Some(file_id) = clip.file_url.rsplit('/').next() {
                if file_id.is_empty() {
                    continue;
                }
                let path = state.uploads_dir.join(file_id);
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove artifact {}: {}", path.display(), e);
                    }
                }
            }
        }
    }

    projects::delete_project(&state.db, &project_id).await?;
    info!("Deleted project {}", project_id);
    Ok(Json(MessageResponse::new("Project deleted")))
}

/// POST /api/projects/:project_id/tracks
pub async fn create_track(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(payload): Json<CreateTrackRequest>,
) -> ApiResult<Json<Track>> {
    let mut project = require_project(&state, &project_id).await?;
    if !project.can_write(&auth.user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }

    let track = Track {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        instrument: payload.instrument,
        volume: payload.volume.unwrap_or(75.0),
        pan: payload.pan.unwrap_or(0.0),
        muted: false,
        solo: false,
        effects: Vec::new(),
        color: payload.color.unwrap_or_else(|| "#ef4444".to_string()),
        clips: Vec::new(),
        is_recording: false,
    };

    project.tracks.push(track.clone());
    project.updated_at = Utc::now();
    projects::save_project(&state.db, &project).await?;
    Ok(Json(track))
}

/// PUT /api/projects/:project_id/tracks/:track_id
///
/// Partial mixing-parameter update; a present `clips` field replaces
/// the track's whole clip list.
pub async fn update_track(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, track_id)): Path<(String, String)>,
    Json(payload): Json<UpdateTrackRequest>,
) -> ApiResult<Json<Track>> {
    let mut project = require_project(&state, &project_id).await?;
    if !project.can_write(&auth.user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }

    let track = project
        .track_mut(&track_id)
        .ok_or_else(|| ApiError::NotFound("Track not found".to_string()))?;

    if let Some(name) = payload.name {
        track.name = name;
    }
    if let Some(instrument) = payload.instrument {
        track.instrument = instrument;
    }
    if let Some(volume) = payload.volume {
        track.volume = volume;
    }
    if let Some(pan) = payload.pan {
        track.pan = pan;
    }
    if let Some(muted) = payload.muted {
        track.muted = muted;
    }
    if let Some(solo) = payload.solo {
        track.solo = solo;
    }
    if let Some(effects) = payload.effects {
        track.effects = effects;
    }
    if let Some(color) = payload.color {
        track.color = color;
    }
    if let Some(clips) = payload.clips {
        track.clips = clips;
    }
    if let Some(is_recording) = payload.is_recording {
        track.is_recording = is_recording;
    }
    let updated = track.clone();

    project.updated_at = Utc::now();
    projects::save_project(&state.db, &project).await?;
    Ok(Json(updated))
}

/// DELETE /api/projects/:project_id/tracks/:track_id
pub async fn delete_track(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, track_id)): Path<(String, String)>,
) -> ApiResult<Json<MessageResponse>> {
    let mut project = require_project(&state, &project_id).await?;
    if !project.can_write(&auth.user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }

    let before = project.tracks.len();
    project.tracks.retain(|t| t.id != track_id);
    if project.tracks.len() == before {
        return Err(ApiError::NotFound("Track not found".to_string()));
    }

    project.updated_at = Utc::now();
    projects::save_project(&state.db, &project).await?;
    Ok(Json(MessageResponse::new("Track deleted")))
}

/// POST /api/projects/:project_id/collaborators
///
/// Owner only. Adding the owner or an existing collaborator is a
/// no-op acknowledged with a message.
pub async fn add_collaborator(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(payload): Json<AddCollaboratorRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let mut project = require_project(&state, &project_id).await?;
    if project.owner_id != auth.user_id {
        return Err(ApiError::Forbidden(
            "Only the owner may add collaborators".to_string(),
        ));
    }

    let user = users::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.id == project.owner_id || project.collaborators.contains(&user.id) {
        return Ok(Json(MessageResponse::new("User is already a member")));
    }

    project.collaborators.push(user.id);
    project.updated_at = Utc::now();
    projects::save_project(&state.db, &project).await?;

    info!("Added collaborator {} to project {}", payload.username, project_id);
    Ok(Json(MessageResponse::new("Collaborator added")))
}
