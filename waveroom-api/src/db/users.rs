//! User account queries

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use waveroom_common::db::User;
use waveroom_common::Result;

#[derive(sqlx::FromRow)]
struct UserRow {
    guid: String,
    username: String,
    email: String,
    password_hash: String,
    display_name: String,
    avatar: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    followers: i64,
    following: i64,
    verified: i64,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.guid,
            username: self.username,
            email: self.email,
            display_name: self.display_name,
            avatar: self.avatar,
            bio: self.bio,
            location: self.location,
            followers: self.followers,
            following: self.following,
            verified: self.verified != 0,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str = "guid, username, email, password_hash, display_name, \
     avatar, bio, location, followers, following, verified, created_at";

pub async fn insert_user(pool: &SqlitePool, user: &User, password_hash: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (guid, username, email, password_hash, display_name, \
         avatar, bio, location, followers, following, verified, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(password_hash)
    .bind(&user.display_name)
    .bind(&user.avatar)
    .bind(&user.bio)
    .bind(&user.location)
    .bind(user.followers)
    .bind(user.following)
    .bind(user.verified as i64)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE guid = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(UserRow::into_user))
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(UserRow::into_user))
}

/// Fetch a user together with the stored password hash, for login
pub async fn credentials_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<(User, String)>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| {
        let hash = r.password_hash.clone();
        (r.into_user(), hash)
    }))
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool> {
    let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Persist profile fields a user may edit about themselves
pub async fn update_profile(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        "UPDATE users SET display_name = ?, avatar = ?, bio = ?, location = ? \
         WHERE guid = ?",
    )
    .bind(&user.display_name)
    .bind(&user.avatar)
    .bind(&user.bio)
    .bind(&user.location)
    .bind(&user.id)
    .execute(pool)
    .await?;
    Ok(())
}
