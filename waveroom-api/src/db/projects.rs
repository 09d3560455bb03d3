//! Project document queries
//!
//! A project row is the unit of update: tracks (with their embedded
//! clip lists), collaborators, and tags travel as JSON columns, so
//! every write below touches exactly one row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use waveroom_common::db::{AudioClip, Project};
use waveroom_common::Result;

#[derive(sqlx::FromRow)]
struct ProjectRow {
    guid: String,
    name: String,
    description: Option<String>,
    owner_id: String,
    collaborators: String,
    tracks: String,
    bpm: i64,
    time_signature: String,
    key_signature: String,
    is_public: i64,
    tags: String,
    genre: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self) -> Result<Project> {
        Ok(Project {
            id: self.guid,
            name: self.name,
            description: self.description,
            owner_id: self.owner_id,
            collaborators: serde_json::from_str(&self.collaborators)?,
            tracks: serde_json::from_str(&self.tracks)?,
            bpm: self.bpm,
            time_signature: self.time_signature,
            key: self.key_signature,
            is_public: self.is_public != 0,
            tags: serde_json::from_str(&self.tags)?,
            genre: self.genre,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const PROJECT_COLUMNS: &str = "guid, name, description, owner_id, collaborators, tracks, \
     bpm, time_signature, key_signature, is_public, tags, genre, created_at, updated_at";

pub async fn insert_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        "INSERT INTO projects (guid, name, description, owner_id, collaborators, tracks, \
         bpm, time_signature, key_signature, is_public, tags, genre, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&project.id)
    .bind(&project.name)
    .bind(&project.description)
    .bind(&project.owner_id)
    .bind(serde_json::to_string(&project.collaborators)?)
    .bind(serde_json::to_string(&project.tracks)?)
    .bind(project.bpm)
    .bind(&project.time_signature)
    .bind(&project.key)
    .bind(project.is_public as i64)
    .bind(serde_json::to_string(&project.tags)?)
    .bind(&project.genre)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_project(pool: &SqlitePool, id: &str) -> Result<Option<Project>> {
    let row: Option<ProjectRow> = sqlx::query_as(&format!(
        "SELECT {} FROM projects WHERE guid = ?",
        PROJECT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(ProjectRow::into_project).transpose()
}

/// Projects where the user is owner or listed as a collaborator,
/// most recently updated first
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Project>> {
    let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
        "SELECT {} FROM projects \
         WHERE owner_id = ?1 \
            OR EXISTS (SELECT 1 FROM json_each(projects.collaborators) \
                       WHERE json_each.value = ?1) \
         ORDER BY updated_at DESC",
        PROJECT_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProjectRow::into_project).collect()
}

pub async fn list_public(pool: &SqlitePool, limit: i64) -> Result<Vec<Project>> {
    let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
        "SELECT {} FROM projects WHERE is_public = 1 \
         ORDER BY updated_at DESC LIMIT ?",
        PROJECT_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProjectRow::into_project).collect()
}

/// Persist every mutable column of the project document.
/// owner_id and created_at are immutable.
pub async fn save_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        "UPDATE projects SET name = ?, description = ?, collaborators = ?, tracks = ?, \
         bpm = ?, time_signature = ?, key_signature = ?, is_public = ?, tags = ?, \
         genre = ?, updated_at = ? WHERE guid = ?",
    )
    .bind(&project.name)
    .bind(&project.description)
    .bind(serde_json::to_string(&project.collaborators)?)
    .bind(serde_json::to_string(&project.tracks)?)
    .bind(project.bpm)
    .bind(&project.time_signature)
    .bind(&project.key)
    .bind(project.is_public as i64)
    .bind(serde_json::to_string(&project.tags)?)
    .bind(&project.genre)
    .bind(project.updated_at)
    .bind(&project.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_project(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE guid = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Append a clip to one track's clip list in a single UPDATE matched
/// on both the project id and the nested track id.
///
/// Concurrent appends to the same project serialize on the row write;
/// the statement rewrites only the matching track's clip array.
/// Returns false when the track id is not present in the project.
pub async fn append_clip(
    pool: &SqlitePool,
    project_id: &str,
    track_id: &str,
    clip: &AudioClip,
) -> Result<bool> {
    let clip_json = serde_json::to_string(clip)?;
    let result = sqlx::query(
        "UPDATE projects SET \
             tracks = (\
                 SELECT json_group_array(json(\
                     CASE WHEN json_extract(value, '$.id') = ?2 \
                          THEN json_set(value, '$.clips[#]', json(?3)) \
                          ELSE value END)) \
                 FROM json_each(projects.tracks)), \
             updated_at = ?4 \
         WHERE guid = ?1 \
           AND EXISTS (SELECT 1 FROM json_each(projects.tracks) \
                       WHERE json_extract(value, '$.id') = ?2)",
    )
    .bind(project_id)
    .bind(track_id)
    .bind(clip_json)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Projects whose serialized tracks mention the given retrieval path.
/// Coarse prefilter for clip detachment; callers re-check the parsed
/// clip lists.
pub async fn find_referencing_file(pool: &SqlitePool, file_url: &str) -> Result<Vec<Project>> {
    let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
        "SELECT {} FROM projects WHERE tracks LIKE '%' || ? || '%'",
        PROJECT_COLUMNS
    ))
    .bind(file_url)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(ProjectRow::into_project).collect()
}
