//! Engine Statistics Rollup
//!
//! Thin read-only reporting over the engines; populated by the daily
//! rollup task and the stats endpoint. No mutation logic lives here.

use crate::content::ContentStore;
use crate::duel::DuelEngine;
use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Point-in-time aggregate snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub total_users: usize,
    pub points_in_circulation: i64,

    pub total_content: usize,
    pub pending_content: usize,
    pub approved_content: usize,
    pub rejected_content: usize,

    pub active_duels: usize,
    pub completed_duels: usize,
    pub cancelled_duels: usize,
    pub votes_cast: u64,

    pub generated_at: DateTime<Utc>,
}

/// Assembles snapshots from the live engines
pub struct StatsCollector {
    ledger: Arc<Ledger>,
    content: Arc<ContentStore>,
    duels: Arc<DuelEngine>,
}

impl StatsCollector {
    pub fn new(ledger: Arc<Ledger>, content: Arc<ContentStore>, duels: Arc<DuelEngine>) -> Self {
        Self { ledger, content, duels }
    }

    pub async fn snapshot(&self) -> EngineStats {
        let content = self.content.counts().await;
        let duels = self.duels.counts().await;

        EngineStats {
            total_users: self.ledger.total_users().await,
            points_in_circulation: self.ledger.points_in_circulation().await,
            total_content: content.total,
            pending_content: content.pending,
            approved_content: content.approved,
            rejected_content: content.rejected,
            active_duels: duels.active,
            completed_duels: duels.completed,
            cancelled_duels: duels.cancelled,
            votes_cast: duels.votes_cast,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::config::{ContentConfig, DuelConfig, PointsConfig, RanksConfig};
    use crate::content::{ContentKind, ModerationOutcome};

    #[tokio::test]
    async fn test_snapshot_reflects_engine_state() {
        let ledger = Arc::new(Ledger::new(&RanksConfig::default()));
        let content = Arc::new(ContentStore::new(&ContentConfig::default(), ledger.clone()));
        let audit = Arc::new(AuditLog::new());
        let duels = Arc::new(DuelEngine::new(
            content.clone(),
            ledger.clone(),
            audit,
            &DuelConfig::default(),
            &PointsConfig::default(),
        ));

        let item = content.submit("author", ContentKind::Joke, "a joke").await.unwrap();
        content
            .apply_decision(item.id, "mod_1", ModerationOutcome::Approve, None, Utc::now())
            .await
            .unwrap();
        content.submit("author", ContentKind::Meme, "file_ref").await.unwrap();

        let stats = StatsCollector::new(ledger, content, duels).snapshot().await;
        assert_eq!(stats.total_content, 2);
        assert_eq!(stats.pending_content, 1);
        assert_eq!(stats.approved_content, 1);
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.active_duels, 0);
    }
}
