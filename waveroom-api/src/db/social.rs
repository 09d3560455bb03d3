//! Comment and like queries

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;
use waveroom_common::db::Comment;
use waveroom_common::Result;

#[derive(sqlx::FromRow)]
struct CommentRow {
    guid: String,
    project_id: String,
    user_id: String,
    content: String,
    position: f64,
    likes: i64,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: self.guid,
            project_id: self.project_id,
            user_id: self.user_id,
            content: self.content,
            timestamp: self.position,
            likes: self.likes,
            created_at: self.created_at,
        }
    }
}

pub async fn insert_comment(pool: &SqlitePool, comment: &Comment) -> Result<()> {
    sqlx::query(
        "INSERT INTO comments (guid, project_id, user_id, content, position, likes, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&comment.id)
    .bind(&comment.project_id)
    .bind(&comment.user_id)
    .bind(&comment.content)
    .bind(comment.timestamp)
    .bind(comment.likes)
    .bind(comment.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Comments for a project, oldest first
pub async fn list_comments(pool: &SqlitePool, project_id: &str) -> Result<Vec<Comment>> {
    let rows: Vec<CommentRow> = sqlx::query_as(
        "SELECT guid, project_id, user_id, content, position, likes, created_at \
         FROM comments WHERE project_id = ? ORDER BY created_at ASC",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(CommentRow::into_comment).collect())
}

/// Toggle a user's like on a project. Returns true when the project
/// is liked after the call, false when the like was removed.
pub async fn toggle_like(pool: &SqlitePool, project_id: &str, user_id: &str) -> Result<bool> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT guid FROM likes WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    match existing {
        Some((guid,)) => {
            sqlx::query("DELETE FROM likes WHERE guid = ?")
                .bind(guid)
                .execute(pool)
                .await?;
            Ok(false)
        }
        None => {
            sqlx::query(
                "INSERT INTO likes (guid, project_id, user_id, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(project_id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(pool)
            .await?;
            Ok(true)
        }
    }
}
