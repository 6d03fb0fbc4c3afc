//! Content API Endpoints
//!
//! Submission, the moderation queue and decisions, and reactions.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error_response;
use crate::content::{
    ContentItem, ContentKind, ContentStore, ModerationEngine, ModerationOutcome, RatingEngine,
    RatingEvent, ReactionKind,
};

/// API state for content endpoints
#[derive(Clone)]
pub struct ContentApiState {
    pub content: Arc<ContentStore>,
    pub moderation: Arc<ModerationEngine>,
    pub rating: Arc<RatingEngine>,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub author_id: String,
    pub kind: ContentKind,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub moderator_id: String,
    pub outcome: ModerationOutcome,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub user_id: String,
    pub kind: ReactionKind,
}

// Response types

#[derive(Debug, Serialize)]
pub struct PendingQueueResponse {
    pub total: usize,
    pub items: Vec<ContentItem>,
}

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub content_id: i64,
    pub kind: ReactionKind,
    pub points_awarded: i64,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub content_id: i64,
    pub total: usize,
    pub events: Vec<RatingEvent>,
}

// Endpoints

/// POST /content - Submit a new item into the moderation queue
pub async fn submit_content(
    State(state): State<ContentApiState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<ContentItem>), (StatusCode, String)> {
    let item = state
        .content
        .submit(&payload.author_id, payload.kind, &payload.body)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /content/pending - The moderation queue, oldest first
pub async fn pending_queue(
    State(state): State<ContentApiState>,
) -> Json<PendingQueueResponse> {
    let items = state.content.list_pending().await;
    Json(PendingQueueResponse {
        total: items.len(),
        items,
    })
}

/// GET /content/:content_id - Fetch one item
pub async fn get_content(
    State(state): State<ContentApiState>,
    Path(content_id): Path<i64>,
) -> Result<Json<ContentItem>, (StatusCode, String)> {
    let item = state.content.get(content_id).await.map_err(error_response)?;
    Ok(Json(item))
}

/// POST /content/:content_id/decision - Apply the one-time moderation decision
pub async fn decide_content(
    State(state): State<ContentApiState>,
    Path(content_id): Path<i64>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<ContentItem>, (StatusCode, String)> {
    let item = state
        .moderation
        .decide(content_id, &payload.moderator_id, payload.outcome, payload.comment)
        .await
        .map_err(error_response)?;

    Ok(Json(item))
}

/// POST /content/:content_id/reaction - React to approved content
pub async fn react_to_content(
    State(state): State<ContentApiState>,
    Path(content_id): Path<i64>,
    Json(payload): Json<ReactionRequest>,
) -> Result<Json<ReactionResponse>, (StatusCode, String)> {
    let event = state
        .rating
        .react(&payload.user_id, content_id, payload.kind)
        .await
        .map_err(error_response)?;

    Ok(Json(ReactionResponse {
        content_id,
        kind: payload.kind,
        points_awarded: event.map(|event| event.points_awarded).unwrap_or(0),
    }))
}

/// GET /content/:content_id/events - Reaction audit trail for one item
pub async fn content_events(
    State(state): State<ContentApiState>,
    Path(content_id): Path<i64>,
) -> Json<EventsResponse> {
    let events = state.rating.events_for(content_id).await;
    Json(EventsResponse {
        content_id,
        total: events.len(),
        events,
    })
}

/// Create the content API router
pub fn create_router(state: ContentApiState) -> Router {
    Router::new()
        .route("/", post(submit_content))
        .route("/pending", get(pending_queue))
        .route("/{content_id}", get(get_content))
        .route("/{content_id}/decision", post(decide_content))
        .route("/{content_id}/reaction", post(react_to_content))
        .route("/{content_id}/events", get(content_events))
        .with_state(state)
}
