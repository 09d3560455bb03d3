//! Audio upload, serve, and delete endpoints
//!
//! Upload validates before it spends: the declared content-type is
//! checked before any body bytes are read, the size ceiling is
//! enforced while streaming, project membership is checked before any
//! disk write, and the disk write completes before the clip record is
//! linked into the project document. A clip therefore never references
//! an artifact that is not fully on disk.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use waveroom_common::db::AudioClip;

use crate::api::{AuthUser, MessageResponse};
use crate::db::projects;
use crate::{ApiError, ApiResult, AppState};

/// Upload ceiling: 50 MiB
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Only declared audio media types are accepted; contents are not
/// sniffed.
const AUDIO_TYPE_PREFIX: &str = "audio/";

/// Extension used when the original filename has none
const DEFAULT_EXTENSION: &str = "wav";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub clip: AudioClip,
    pub file_id: String,
}

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// POST /api/audio/upload
///
/// Multipart form: `file` (binary), `project_id`, `track_id`.
///
/// **Response:** `{"message", "clip", "file_id"}`
///
/// **Errors:**
/// - 400 Bad Request: missing field, or content-type not `audio/*`
/// - 413 Payload Too Large: file exceeds 50 MiB
/// - 404 Not Found: unknown project or track
/// - 403 Forbidden: caller is neither owner nor collaborator
pub async fn upload_audio(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file: Option<UploadedFile> = None;
    let mut project_id: Option<String> = None;
    let mut track_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart form: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => file = Some(read_audio_field(field).await?),
            Some("project_id") => project_id = Some(read_text_field(field).await?),
            Some("track_id") => track_id = Some(read_text_field(field).await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("Missing file field".to_string()))?;
    let project_id =
        project_id.ok_or_else(|| ApiError::BadRequest("Missing project_id field".to_string()))?;
    let track_id =
        track_id.ok_or_else(|| ApiError::BadRequest("Missing track_id field".to_string()))?;

    // Membership check runs after size validation and before any disk
    // write: no bytes land on disk for a caller without access
    let project = projects::fetch_project(&state.db, &project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;
    if !project.can_write(&auth.user_id) {
        return Err(ApiError::Forbidden("Not a member of this project".to_string()));
    }
    if project.track(&track_id).is_none() {
        return Err(ApiError::NotFound("Track not found".to_string()));
    }

    // Fresh server-side identifier; callers never choose file names
    let file_id = format!(
        "{}.{}",
        Uuid::new_v4(),
        file_extension(&file.filename)
    );
    let path = state.uploads_dir.join(&file_id);
    write_artifact(&path, &file.data).await?;

    let clip = AudioClip {
        id: Uuid::new_v4().to_string(),
        name: file.filename,
        file_path: path.display().to_string(),
        file_size: file.data.len() as i64,
        duration: 0.0,
        start_time: 0.0,
        track_id: track_id.clone(),
        created_at: Utc::now(),
        file_url: format!("/api/audio/file/{}", file_id),
    };

    // Single document update matched on project id and nested track id
    let linked = projects::append_clip(&state.db, &project.id, &track_id, &clip).await?;
    if !linked {
        // Track vanished between the check and the append; do not keep
        // an unreferenced artifact
        let _ = tokio::fs::remove_file(&path).await;
        return Err(ApiError::NotFound("Track not found".to_string()));
    }

    info!(
        "Uploaded {} ({} bytes) to project {} track {}",
        file_id, clip.file_size, project.id, track_id
    );

    Ok(Json(UploadResponse {
        message: "Audio uploaded".to_string(),
        clip,
        file_id,
    }))
}

/// Read the `file` field in chunks, gating on declared content-type
/// first and on accumulated size while streaming.
async fn read_audio_field(mut field: Field<'_>) -> ApiResult<UploadedFile> {
    // Type gate before any body bytes are read
    match field.content_type() {
        Some(ct) if ct.starts_with(AUDIO_TYPE_PREFIX) => {}
        _ => {
            return Err(ApiError::BadRequest(
                "File must have an audio content type".to_string(),
            ))
        }
    }

    let filename = field.file_name().unwrap_or("clip").to_string();

    let mut data: Vec<u8> = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds maximum upload size of {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }
        data.extend_from_slice(&chunk);
    }

    Ok(UploadedFile { filename, data })
}

async fn read_text_field(field: Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid form field: {}", e)))
}

/// Write the buffered upload; a failed write leaves no partial file
/// visible to later reads.
async fn write_artifact(path: &std::path::Path, data: &[u8]) -> ApiResult<()> {
    if let Err(e) = tokio::fs::write(path, data).await {
        let _ = tokio::fs::remove_file(path).await;
        warn!("Failed to persist upload {}: {}", path.display(), e);
        return Err(ApiError::Io(e));
    }
    Ok(())
}

/// GET /api/audio/file/:file_id
///
/// No authentication: the identifier's unguessability is the only
/// protection on reads.
pub async fn serve_audio_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<Response> {
    if !is_valid_file_id(&file_id) {
        return Err(ApiError::NotFound("Audio file not found".to_string()));
    }

    let path = state.uploads_dir.join(&file_id);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("Audio file not found".to_string()))
        }
        Err(e) => return Err(ApiError::Io(e)),
    };

    let headers = [
        (CONTENT_TYPE, content_type_for(&file_id).to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename={}", file_id),
        ),
    ];
    Ok((headers, bytes).into_response())
}

/// DELETE /api/audio/file/:file_id
///
/// Idempotent on the artifact: deleting a missing file still succeeds.
/// Clip detachment is best-effort and scoped to projects the caller
/// can write to.
pub async fn delete_audio_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if is_valid_file_id(&file_id) {
        let path = state.uploads_dir.join(&file_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Deleted audio file {}", file_id),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ApiError::Io(e)),
        }
    }

    // Detach clip records referencing the artifact
    let file_url = format!("/api/audio/file/{}", file_id);
    let candidates = projects::find_referencing_file(&state.db, &file_url).await?;
    for mut project in candidates {
        if !project.can_write(&auth.user_id) {
            continue;
        }
        let mut changed = false;
        for track in &mut project.tracks {
            let before = track.clips.len();
            track.clips.retain(|c| c.file_url != file_url);
            changed |= track.clips.len() != before;
        }
        if changed {
            project.updated_at = Utc::now();
            projects::save_project(&state.db, &project).await?;
            info!("Detached clips for {} from project {}", file_id, project.id);
        }
    }

    Ok(Json(MessageResponse::new("Audio file deleted")))
}

/// Derive a storage extension from the client filename. Unknown or
/// hostile input falls back to the default audio extension.
fn file_extension(filename: &str) -> String {
    let ext: String = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect::<String>()
            .to_ascii_lowercase(),
        _ => String::new(),
    };
    if ext.is_empty() {
        DEFAULT_EXTENSION.to_string()
    } else {
        ext
    }
}

/// A file id is a generated `{uuid}.{ext}` name; anything that could
/// escape the uploads directory is rejected outright.
fn is_valid_file_id(file_id: &str) -> bool {
    !file_id.is_empty()
        && !file_id.starts_with('.')
        && file_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !file_id.contains("..")
}

/// Map a stored extension back to a content type for serving
fn content_type_for(file_id: &str) -> &'static str {
    let ext = file_id.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
    match ext {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        "webm" => "audio/webm",
        "aac" | "m4a" | "mp4" => "audio/aac",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}
