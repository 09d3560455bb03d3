//! Static catalog endpoints
//!
//! The catalog is loaded once at startup and never mutated, so these
//! handlers only clone out of shared state. No authentication.

use axum::{extract::State, Json};
use waveroom_common::catalog::{Effect, Instrument, SamplePack};

use crate::AppState;

/// GET /api/effects
pub async fn list_effects(State(state): State<AppState>) -> Json<Vec<Effect>> {
    Json(state.catalog.effects.clone())
}

/// GET /api/instruments
pub async fn list_instruments(State(state): State<AppState>) -> Json<Vec<Instrument>> {
    Json(state.catalog.instruments.clone())
}

/// GET /api/samples/packs
pub async fn list_sample_packs(State(state): State<AppState>) -> Json<Vec<SamplePack>> {
    Json(state.catalog.sample_packs.clone())
}
