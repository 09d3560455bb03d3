//! HTTP API handlers for waveroom-api

pub mod audio;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod projects;
pub mod social;

pub use auth::AuthUser;
pub use health::health_routes;

use serde::Serialize;

/// Plain acknowledgement body used by delete-style endpoints
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
