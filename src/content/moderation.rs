//! Moderation Engine
//!
//! Applies a moderator's one-time decision to a pending item. The status
//! gate itself lives in `ContentStore::apply_decision`; this engine layers
//! the point award, the author's per-kind approved counter, and the audit
//! record on top.

use crate::audit::{AdminAction, AdminActionKind, AuditLog};
use crate::config::PointsConfig;
use crate::content::{ContentItem, ContentStatus, ContentStore};
use crate::error::EngineResult;
use crate::ledger::Ledger;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// A moderator's verdict on a pending item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationOutcome {
    Approve,
    Reject,
}

/// Applies moderator decisions and their side effects
pub struct ModerationEngine {
    content: Arc<ContentStore>,
    ledger: Arc<Ledger>,
    audit: Arc<AuditLog>,
    points: PointsConfig,
}

impl ModerationEngine {
    pub fn new(
        content: Arc<ContentStore>,
        ledger: Arc<Ledger>,
        audit: Arc<AuditLog>,
        points: &PointsConfig,
    ) -> Self {
        Self {
            content,
            ledger,
            audit,
            points: points.clone(),
        }
    }

    /// Decide a pending item exactly once. Approval pays the author and
    /// bumps their per-kind approved counter; rejection stores the comment.
    /// Either way an AdminAction is recorded. A second call on the same
    /// item fails with InvalidState and awards nothing.
    pub async fn decide(
        &self,
        content_id: i64,
        moderator_id: &str,
        outcome: ModerationOutcome,
        comment: Option<String>,
    ) -> EngineResult<ContentItem> {
        let item = self
            .content
            .apply_decision(content_id, moderator_id, outcome, comment.clone(), Utc::now())
            .await?;

        if item.status == ContentStatus::Approved {
            self.ledger
                .award(&item.author_id, self.points.content_approved, "content-approved")
                .await?;
            self.ledger.record_approval(&item.author_id, item.kind).await?;
        }

        let action_kind = match outcome {
            ModerationOutcome::Approve => AdminActionKind::ContentApproved,
            ModerationOutcome::Reject => AdminActionKind::ContentRejected,
        };
        self.audit
            .record(AdminAction::new(
                moderator_id,
                action_kind,
                format!("content:{content_id}"),
                comment,
            ))
            .await?;

        info!(
            content_id,
            moderator_id = %moderator_id,
            outcome = ?outcome,
            author_id = %item.author_id,
            "Moderation decision applied"
        );

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, RanksConfig};
    use crate::content::ContentKind;
    use crate::error::EngineError;

    fn engine() -> (ModerationEngine, Arc<ContentStore>, Arc<Ledger>) {
        let ledger = Arc::new(Ledger::new(&RanksConfig::default()));
        let content = Arc::new(ContentStore::new(&ContentConfig::default(), ledger.clone()));
        let audit = Arc::new(AuditLog::new());
        let engine = ModerationEngine::new(content.clone(), ledger.clone(), audit, &PointsConfig::default());
        (engine, content, ledger)
    }

    #[tokio::test]
    async fn test_approval_awards_author() {
        let (engine, content, ledger) = engine();
        let item = content.submit("author", ContentKind::Joke, "a joke").await.unwrap();

        engine
            .decide(item.id, "mod_1", ModerationOutcome::Approve, None)
            .await
            .unwrap();

        let account = ledger.balance("author").await.unwrap();
        assert_eq!(account.points, PointsConfig::default().content_approved);
        assert_eq!(account.jokes_approved, 1);
    }

    #[tokio::test]
    async fn test_rejection_awards_nothing() {
        let (engine, content, ledger) = engine();
        let item = content.submit("author", ContentKind::Joke, "a joke").await.unwrap();

        let decided = engine
            .decide(item.id, "mod_1", ModerationOutcome::Reject, Some("seen it".to_string()))
            .await
            .unwrap();

        assert_eq!(decided.status, ContentStatus::Rejected);
        assert_eq!(decided.moderator_comment.as_deref(), Some("seen it"));
        assert_eq!(ledger.balance("author").await.unwrap().points, 0);
    }

    #[tokio::test]
    async fn test_second_decision_fails_without_double_award() {
        let (engine, content, ledger) = engine();
        let item = content.submit("author", ContentKind::Joke, "a joke").await.unwrap();

        engine
            .decide(item.id, "mod_1", ModerationOutcome::Approve, None)
            .await
            .unwrap();
        let err = engine
            .decide(item.id, "mod_2", ModerationOutcome::Approve, None)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(
            ledger.balance("author").await.unwrap().points,
            PointsConfig::default().content_approved
        );
    }
}
