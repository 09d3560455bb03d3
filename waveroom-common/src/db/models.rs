//! Database models
//!
//! Projects embed their tracks, and tracks embed their clips; both
//! collections are serialized as JSON columns on the project row so a
//! project updates as one document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account. The password hash is stored in its own
/// column and never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, display_name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            display_name,
            avatar: None,
            bio: None,
            location: None,
            followers: 0,
            following: 0,
            verified: false,
            created_at: Utc::now(),
        }
    }
}

/// One uploaded audio segment attached to a track.
///
/// Created exactly once per successful upload; afterwards mutated only
/// by whole-array replacement when a track's clip list is rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: String,
    /// Display name, taken from the original filename at upload
    pub name: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub file_size: i64,
    /// Placement metadata, populated by the client after upload
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub track_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Retrieval path (`/api/audio/file/{file_id}`)
    #[serde(default)]
    pub file_url: String,
}

/// An ordered channel within a project holding clips and mixing
/// parameters. The mixing parameters are opaque to the audio pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub instrument: String,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub pan: f64,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub solo: bool,
    #[serde(default)]
    pub effects: Vec<serde_json::Value>,
    #[serde(default = "default_track_color")]
    pub color: String,
    #[serde(default)]
    pub clips: Vec<AudioClip>,
    #[serde(default)]
    pub is_recording: bool,
}

fn default_volume() -> f64 {
    75.0
}

fn default_track_color() -> String {
    "#ef4444".to_string()
}

/// The top-level collaborative document owning tracks, membership,
/// and musical metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Set at creation, never changes
    pub owner_id: String,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    pub bpm: i64,
    pub time_signature: String,
    pub key: String,
    pub is_public: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub genre: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: String, owner_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: None,
            owner_id,
            collaborators: Vec::new(),
            tracks: Vec::new(),
            bpm: 120,
            time_signature: "4/4".to_string(),
            key: "C Major".to_string(),
            is_public: false,
            tags: Vec::new(),
            genre: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Owner and collaborators may write
    pub fn can_write(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.collaborators.iter().any(|c| c == user_id)
    }

    /// Members may read anything; everyone may read public projects
    pub fn can_read(&self, user_id: &str) -> bool {
        self.is_public || self.can_write(user_id)
    }

    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    pub fn track_mut(&mut self, track_id: &str) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.id == track_id)
    }
}

/// A comment left on a project, optionally anchored to a position in
/// the timeline (seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: f64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_collaborators_can_write() {
        let mut project = Project::new("Demo".to_string(), "owner-1".to_string());
        project.collaborators.push("collab-1".to_string());

        assert!(project.can_write("owner-1"));
        assert!(project.can_write("collab-1"));
        assert!(!project.can_write("stranger"));
    }

    #[test]
    fn public_projects_are_readable_by_anyone() {
        let mut project = Project::new("Demo".to_string(), "owner-1".to_string());
        assert!(!project.can_read("stranger"));

        project.is_public = true;
        assert!(project.can_read("stranger"));
    }

    #[test]
    fn partial_track_json_gets_defaults() {
        // Clients send sparse track/clip objects on whole-array updates
        let track: Track =
            serde_json::from_str(r#"{"id": "t1", "name": "Vocals"}"#).unwrap();
        assert_eq!(track.volume, 75.0);
        assert_eq!(track.color, "#ef4444");
        assert!(track.clips.is_empty());
        assert!(!track.muted);
    }
}
