//! HTTP API endpoints for the engagement engine
//!
//! Provides REST APIs for:
//! - Content (submission, moderation queue, decisions, reactions)
//! - Duels (initiation, voting, resolution, cancellation)
//! - Users (balance, award history, leaderboard)
//! - Stats (aggregate snapshot, admin action audit)

pub mod content;
pub mod duel;
pub mod stats;
pub mod user;

pub use content::{ContentApiState, create_router as create_content_router};
pub use duel::{DuelApiState, create_router as create_duel_router};
pub use stats::{StatsApiState, create_router as create_stats_router};
pub use user::{UserApiState, create_router as create_user_router};

use crate::error::EngineError;
use axum::http::StatusCode;

/// Map an engine error onto an HTTP status plus message
pub(crate) fn error_response(err: EngineError) -> (StatusCode, String) {
    let status = match &err {
        EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::InvalidState(_) => StatusCode::CONFLICT,
        EngineError::DuplicateVote { .. } => StatusCode::CONFLICT,
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::NoOpponentAvailable => StatusCode::CONFLICT,
        EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(EngineError::not_found("duel", 1));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(EngineError::DuplicateVote {
            duel_id: 1,
            voter_id: "v".to_string(),
        });
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = error_response(EngineError::Validation("empty body".to_string()));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
