//! Duel API Endpoints
//!
//! Initiation, voting, resolution, and administrative cancellation.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error_response;
use crate::duel::{Duel, DuelEngine, DuelSide};

/// API state for duel endpoints
#[derive(Clone)]
pub struct DuelApiState {
    pub duels: Arc<DuelEngine>,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub initiator_id: String,
    pub content_id: i64,
    /// Explicit opponent content; omitted means random matching
    pub opponent_content_id: Option<i64>,
    /// Defaults to a publicly listed duel
    pub public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub voter_id: String,
    pub side: DuelSide,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub actor_id: String,
    pub reason: Option<String>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct ActiveDuelsResponse {
    pub total: usize,
    pub duels: Vec<Duel>,
}

// Endpoints

/// POST /duels - Open a new duel
pub async fn initiate_duel(
    State(state): State<DuelApiState>,
    Json(payload): Json<InitiateRequest>,
) -> Result<(StatusCode, Json<Duel>), (StatusCode, String)> {
    let duel = state
        .duels
        .initiate(
            &payload.initiator_id,
            payload.content_id,
            payload.opponent_content_id,
            payload.public.unwrap_or(true),
        )
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(duel)))
}

/// GET /duels/active - Publicly listed active duels
pub async fn active_duels(State(state): State<DuelApiState>) -> Json<ActiveDuelsResponse> {
    let duels: Vec<Duel> = state
        .duels
        .list_active()
        .await
        .into_iter()
        .filter(|duel| duel.public)
        .collect();

    Json(ActiveDuelsResponse {
        total: duels.len(),
        duels,
    })
}

/// GET /duels/:duel_id - Fetch one duel
pub async fn get_duel(
    State(state): State<DuelApiState>,
    Path(duel_id): Path<i64>,
) -> Result<Json<Duel>, (StatusCode, String)> {
    let duel = state.duels.get(duel_id).await.map_err(error_response)?;
    Ok(Json(duel))
}

/// POST /duels/:duel_id/vote - Cast a vote; one per voter per duel
pub async fn cast_vote(
    State(state): State<DuelApiState>,
    Path(duel_id): Path<i64>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<Duel>, (StatusCode, String)> {
    let duel = state
        .duels
        .cast_vote(duel_id, &payload.voter_id, payload.side)
        .await
        .map_err(error_response)?;

    Ok(Json(duel))
}

/// POST /duels/:duel_id/resolve - Resolve once the deadline has passed
pub async fn resolve_duel(
    State(state): State<DuelApiState>,
    Path(duel_id): Path<i64>,
) -> Result<Json<Duel>, (StatusCode, String)> {
    let duel = state.duels.resolve(duel_id).await.map_err(error_response)?;
    Ok(Json(duel))
}

/// POST /duels/:duel_id/cancel - Administrative withdrawal before any votes
pub async fn cancel_duel(
    State(state): State<DuelApiState>,
    Path(duel_id): Path<i64>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Duel>, (StatusCode, String)> {
    let duel = state
        .duels
        .cancel(duel_id, &payload.actor_id, payload.reason)
        .await
        .map_err(error_response)?;

    Ok(Json(duel))
}

/// Create the duel API router
pub fn create_router(state: DuelApiState) -> Router {
    Router::new()
        .route("/", post(initiate_duel))
        .route("/active", get(active_duels))
        .route("/{duel_id}", get(get_duel))
        .route("/{duel_id}/vote", post(cast_vote))
        .route("/{duel_id}/resolve", post(resolve_duel))
        .route("/{duel_id}/cancel", post(cancel_duel))
        .with_state(state)
}
