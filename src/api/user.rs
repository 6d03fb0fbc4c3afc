//! User API Endpoints
//!
//! Balance, award history, and the leaderboard.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error_response;
use crate::ledger::{Ledger, LedgerEntry, UserAccount};

/// API state for user endpoints
#[derive(Clone)]
pub struct UserApiState {
    pub ledger: Arc<Ledger>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub total: usize,
    pub entries: Vec<LedgerEntry>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub total: usize,
    pub users: Vec<UserAccount>,
}

/// GET /users/:user_id - Current balance, rank, and counters
pub async fn get_balance(
    State(state): State<UserApiState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserAccount>, (StatusCode, String)> {
    let account = state.ledger.balance(&user_id).await.map_err(error_response)?;
    Ok(Json(account))
}

/// GET /users/:user_id/history - Award audit trail, oldest first
pub async fn get_history(
    State(state): State<UserApiState>,
    Path(user_id): Path<String>,
) -> Json<HistoryResponse> {
    let entries = state.ledger.history(&user_id).await;
    Json(HistoryResponse {
        user_id,
        total: entries.len(),
        entries,
    })
}

/// GET /users/leaderboard - Top accounts by points
pub async fn leaderboard(
    State(state): State<UserApiState>,
    Query(query): Query<LeaderboardQuery>,
) -> Json<LeaderboardResponse> {
    let users = state.ledger.leaderboard(query.limit.unwrap_or(10)).await;
    Json(LeaderboardResponse {
        total: users.len(),
        users,
    })
}

/// Create the user API router
pub fn create_router(state: UserApiState) -> Router {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/{user_id}", get(get_balance))
        .route("/{user_id}/history", get(get_history))
        .with_state(state)
}
