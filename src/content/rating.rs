//! Rating Engine
//!
//! Records reactions (like / dislike / view) against approved content.
//! Likes and dislikes pay the reacting user and append a RatingEvent;
//! views only bump the counter.
//!
//! The schema carries no (user, content) uniqueness for reactions, so the
//! same user may react to the same item repeatedly; each reaction counts
//! and pays. A future one-reaction-per-user policy would slot in as a
//! single guard at the top of `react`.

use crate::config::PointsConfig;
use crate::content::{ContentItem, ContentStore};
use crate::database::DatabasePool;
use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A user engagement action on approved content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
    View,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
            ReactionKind::View => "view",
        }
    }
}

/// Append-only audit record of a point-bearing reaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingEvent {
    pub id: Uuid,
    pub user_id: String,
    pub content_id: i64,
    pub kind: ReactionKind,
    pub points_awarded: i64,
    pub created_at: DateTime<Utc>,
}

/// Applies reactions and their ledger side effects
pub struct RatingEngine {
    db: Option<Arc<DatabasePool>>,
    content: Arc<ContentStore>,
    ledger: Arc<Ledger>,
    points: PointsConfig,

    /// Append-only reaction audit trail
    events: RwLock<Vec<RatingEvent>>,
}

impl RatingEngine {
    pub fn new(content: Arc<ContentStore>, ledger: Arc<Ledger>, points: &PointsConfig) -> Self {
        Self {
            db: None,
            content,
            ledger,
            points: points.clone(),
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn with_database(mut self, db: Arc<DatabasePool>) -> Self {
        self.db = Some(db);
        self
    }

    /// React to approved content. Returns the appended RatingEvent for
    /// point-bearing reactions, None for views.
    pub async fn react(
        &self,
        user_id: &str,
        content_id: i64,
        kind: ReactionKind,
    ) -> EngineResult<Option<RatingEvent>> {
        let item: ContentItem = match kind {
            ReactionKind::View => self.content.record_view(content_id).await?,
            ReactionKind::Like => self.content.record_like(content_id).await?,
            ReactionKind::Dislike => self.content.record_dislike(content_id).await?,
        };

        if kind == ReactionKind::View {
            return Ok(None);
        }

        // Points go to the reacting user, not the author
        self.ledger
            .award(user_id, self.points.reaction, "reaction")
            .await?;
        self.ledger.record_reaction_given(user_id).await?;

        let event = RatingEvent {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            content_id,
            kind,
            points_awarded: self.points.reaction,
            created_at: Utc::now(),
        };

        if let Some(ref db) = self.db {
            db.ratings()
                .insert_event(&event)
                .await
                .map_err(EngineError::Storage)?;
        }

        self.events.write().await.push(event.clone());

        debug!(
            user_id = %user_id,
            content_id,
            kind = kind.as_str(),
            author_id = %item.author_id,
            "Reaction recorded"
        );

        Ok(Some(event))
    }

    /// Reactions recorded against one item, oldest first
    pub async fn events_for(&self, content_id: i64) -> Vec<RatingEvent> {
        let events = self.events.read().await;
        events
            .iter()
            .filter(|event| event.content_id == content_id)
            .cloned()
            .collect()
    }
}
