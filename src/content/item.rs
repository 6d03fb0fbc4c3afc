//! Content Item Types
//!
//! Status and kind are closed enums; every transition site matches
//! exhaustively, so a value outside the declared set cannot be represented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of submitted content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Short-form text
    Joke,
    /// Media reference (file id or URL)
    Meme,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Joke => "joke",
            ContentKind::Meme => "meme",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "joke" => Some(ContentKind::Joke),
            "meme" => Some(ContentKind::Meme),
            _ => None,
        }
    }
}

/// Moderation status of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    /// Awaiting a moderator decision
    Pending,
    /// Visible and eligible for ratings and duels
    Approved,
    /// Declined; retained for audit
    Rejected,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Pending => "pending",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ContentStatus::Pending),
            "approved" => Some(ContentStatus::Approved),
            "rejected" => Some(ContentStatus::Rejected),
            _ => None,
        }
    }
}

/// A submitted content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: i64,
    pub kind: ContentKind,
    pub body: String,
    pub status: ContentStatus,

    /// Submitting user
    pub author_id: String,

    /// Set by the moderation decision, never before
    pub moderator_id: Option<String>,
    pub moderator_comment: Option<String>,

    /// Engagement counters (monotonic, approved content only)
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,

    pub created_at: DateTime<Utc>,
    pub moderated_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn new(id: i64, author_id: String, kind: ContentKind, body: String) -> Self {
        Self {
            id,
            kind,
            body,
            status: ContentStatus::Pending,
            author_id,
            moderator_id: None,
            moderator_comment: None,
            views: 0,
            likes: 0,
            dislikes: 0,
            created_at: Utc::now(),
            moderated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_is_pending() {
        let item = ContentItem::new(1, "user_1".to_string(), ContentKind::Joke, "text".to_string());
        assert_eq!(item.status, ContentStatus::Pending);
        assert!(item.moderator_id.is_none());
        assert_eq!(item.views, 0);
    }

    #[test]
    fn test_kind_round_trip() {
        assert_eq!(ContentKind::parse("joke"), Some(ContentKind::Joke));
        assert_eq!(ContentKind::parse(ContentKind::Meme.as_str()), Some(ContentKind::Meme));
        assert_eq!(ContentKind::parse("video"), None);
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!(ContentStatus::parse("archived"), None);
    }
}
