//! Duel Data Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelStatus {
    /// Voting window open
    Active,
    /// Voting finished; winner may or may not exist
    Completed,
    /// Administratively withdrawn before any vote was cast
    Cancelled,
}

impl DuelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelStatus::Active => "active",
            DuelStatus::Completed => "completed",
            DuelStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(DuelStatus::Active),
            "completed" => Some(DuelStatus::Completed),
            "cancelled" => Some(DuelStatus::Cancelled),
            _ => None,
        }
    }
}

/// Which of the two items a vote supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelSide {
    Initiator,
    Opponent,
}

impl DuelSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuelSide::Initiator => "initiator",
            DuelSide::Opponent => "opponent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initiator" => Some(DuelSide::Initiator),
            "opponent" => Some(DuelSide::Opponent),
            _ => None,
        }
    }
}

/// A timed two-sided voting contest between two approved items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duel {
    pub id: i64,

    /// Author of the initiator-side content
    pub initiator_id: String,
    /// Author of the opponent-side content
    pub opponent_id: String,

    pub initiator_content_id: i64,
    pub opponent_content_id: i64,

    pub status: DuelStatus,

    /// Vote counters; `total_votes` is always the sum of the two sides
    pub initiator_votes: u32,
    pub opponent_votes: u32,
    pub total_votes: u32,

    /// End of the public voting window
    pub voting_ends_at: DateTime<Utc>,

    /// Winning author, set only on resolution with a clear winner
    pub winner_id: Option<String>,

    /// Whether the duel is listed publicly
    pub public: bool,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Duel {
    pub fn new(
        id: i64,
        initiator_id: String,
        opponent_id: String,
        initiator_content_id: i64,
        opponent_content_id: i64,
        voting_ends_at: DateTime<Utc>,
        public: bool,
    ) -> Self {
        Self {
            id,
            initiator_id,
            opponent_id,
            initiator_content_id,
            opponent_content_id,
            status: DuelStatus::Active,
            initiator_votes: 0,
            opponent_votes: 0,
            total_votes: 0,
            voting_ends_at,
            winner_id: None,
            public,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The single place vote counters change, keeping
    /// `total_votes == initiator_votes + opponent_votes`
    pub fn apply_vote(&mut self, side: DuelSide) {
        match side {
            DuelSide::Initiator => self.initiator_votes += 1,
            DuelSide::Opponent => self.opponent_votes += 1,
        }
        self.total_votes += 1;
    }

    /// Winning side under the turnout threshold: strictly more votes and at
    /// least `min_votes` total; ties and low turnout produce no winner.
    pub fn winning_side(&self, min_votes: u32) -> Option<DuelSide> {
        if self.total_votes < min_votes {
            return None;
        }
        match self.initiator_votes.cmp(&self.opponent_votes) {
            std::cmp::Ordering::Greater => Some(DuelSide::Initiator),
            std::cmp::Ordering::Less => Some(DuelSide::Opponent),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// One voter's choice in one duel; at most one per (duel, voter)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelVote {
    pub duel_id: i64,
    pub voter_id: String,
    pub side: DuelSide,
    pub created_at: DateTime<Utc>,
}
