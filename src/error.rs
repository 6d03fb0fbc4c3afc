//! Engine Error Taxonomy
//!
//! Every fallible core operation returns one of these variants. All failures
//! are per-request; nothing here terminates the process.

use serde::Serialize;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the core engines
#[derive(Debug, Clone, Error, Serialize)]
pub enum EngineError {
    /// Unknown user, content item, or duel
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The target is in a status that forbids the operation
    /// (moderating twice, voting on a finished duel, reacting to
    /// unapproved content)
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Voter already has a recorded vote in this duel
    #[error("user {voter_id} already voted in duel {duel_id}")]
    DuplicateVote { duel_id: i64, voter_id: String },

    /// Malformed input: empty body, oversized text, negative point amount,
    /// unknown action kind
    #[error("validation failed: {0}")]
    Validation(String),

    /// Automatic duel matching found no eligible opponent content
    #[error("no eligible opponent content available")]
    NoOpponentAvailable,

    /// The persistence layer rejected the operation; in-memory state was
    /// left untouched
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable tag for API responses and audit records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::DuplicateVote { .. } => "duplicate_vote",
            Self::Validation(_) => "validation",
            Self::NoOpponentAvailable => "no_opponent_available",
            Self::Storage(_) => "storage",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = EngineError::not_found("duel", 42);
        assert_eq!(err.to_string(), "duel 42 not found");

        let err = EngineError::DuplicateVote {
            duel_id: 7,
            voter_id: "user_1".to_string(),
        };
        assert_eq!(err.to_string(), "user user_1 already voted in duel 7");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(EngineError::NoOpponentAvailable.kind(), "no_opponent_available");
        assert_eq!(
            EngineError::Validation("empty body".to_string()).kind(),
            "validation"
        );
    }
}
