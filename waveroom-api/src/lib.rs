//! waveroom-api library interface
//!
//! Exposes the application state and router for the binary and for
//! integration tests.

pub mod api;
pub mod db;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use waveroom_common::catalog::Catalog;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Directory holding uploaded audio artifacts
    pub uploads_dir: PathBuf,
    /// Secret used to sign and verify session tokens
    pub signing_secret: String,
    /// Immutable effect/instrument/sample catalog
    pub catalog: &'static Catalog,
}

impl AppState {
    pub fn new(db: SqlitePool, uploads_dir: PathBuf, signing_secret: String) -> Self {
        Self {
            db,
            uploads_dir,
            signing_secret,
            catalog: Catalog::builtin(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Credential & session service
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route(
            "/auth/me",
            get(api::auth::current_user).put(api::auth::update_profile),
        )
        // Project/track store
        .route(
            "/projects",
            get(api::projects::list_projects).post(api::projects::create_project),
        )
        .route("/projects/public", get(api::projects::list_public_projects))
        .route(
            "/projects/:project_id",
            get(api::projects::get_project)
                .put(api::projects::update_project)
                .delete(api::projects::delete_project),
        )
        .route(
            "/projects/:project_id/tracks",
            post(api::projects::create_track),
        )
        .route(
            "/projects/:project_id/tracks/:track_id",
            axum::routing::put(api::projects::update_track)
                .delete(api::projects::delete_track),
        )
        .route(
            "/projects/:project_id/collaborators",
            post(api::projects::add_collaborator),
        )
        // Social surface
        .route(
            "/projects/:project_id/comments",
            get(api::social::list_comments).post(api::social::create_comment),
        )
        .route("/projects/:project_id/like", post(api::social::toggle_like))
        // Static catalogs
        .route("/effects", get(api::catalog::list_effects))
        .route("/instruments", get(api::catalog::list_instruments))
        .route("/samples/packs", get(api::catalog::list_sample_packs))
        // Audio pipeline
        .route("/audio/upload", post(api::audio::upload_audio))
        .route(
            "/audio/file/:file_id",
            get(api::audio::serve_audio_file).delete(api::audio::delete_audio_file),
        );

    Router::new()
        .nest("/api", api)
        .merge(api::health_routes())
        // Slack above the upload ceiling so the pipeline's own size
        // check fires before the transport limit
        .layer(DefaultBodyLimit::max(api::audio::MAX_UPLOAD_BYTES + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
