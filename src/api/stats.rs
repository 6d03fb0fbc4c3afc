//! Stats API Endpoints
//!
//! Read-only reporting: the aggregate snapshot and the admin action audit.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::audit::{AdminAction, AuditLog};
use crate::stats::{EngineStats, StatsCollector};

/// API state for stats endpoints
#[derive(Clone)]
pub struct StatsApiState {
    pub stats: Arc<StatsCollector>,
    pub audit: Arc<AuditLog>,
}

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AdminActionsResponse {
    pub total: usize,
    pub actions: Vec<AdminAction>,
}

/// GET /stats - Aggregate engine snapshot
pub async fn get_stats(State(state): State<StatsApiState>) -> Json<EngineStats> {
    Json(state.stats.snapshot().await)
}

/// GET /stats/admin-actions - Most recent administrative actions
pub async fn admin_actions(
    State(state): State<StatsApiState>,
    Query(query): Query<AuditQuery>,
) -> Json<AdminActionsResponse> {
    let actions = state.audit.recent(query.limit.unwrap_or(50)).await;
    Json(AdminActionsResponse {
        total: actions.len(),
        actions,
    })
}

/// Create the stats API router
pub fn create_router(state: StatsApiState) -> Router {
    Router::new()
        .route("/", get(get_stats))
        .route("/admin-actions", get(admin_actions))
        .with_state(state)
}
