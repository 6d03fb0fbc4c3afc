//! Content Store
//!
//! Owns every submitted item, its engagement counters, and the one-shot
//! PENDING -> APPROVED/REJECTED transition. Engines never mutate items
//! directly; every state change funnels through here so the moderation
//! invariant has a single enforcement site.

use crate::config::ContentConfig;
use crate::content::moderation::ModerationOutcome;
use crate::content::{ContentItem, ContentKind, ContentStatus};
use crate::database::DatabasePool;
use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Aggregate item counts for reporting
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContentCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// In-memory authoritative item store with optional persistence
pub struct ContentStore {
    db: Option<Arc<DatabasePool>>,
    limits: ContentConfig,
    ledger: Arc<Ledger>,
    next_id: AtomicI64,
    items: RwLock<HashMap<i64, ContentItem>>,
}

impl ContentStore {
    pub fn new(limits: &ContentConfig, ledger: Arc<Ledger>) -> Self {
        Self {
            db: None,
            limits: limits.clone(),
            ledger,
            next_id: AtomicI64::new(1),
            items: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_database(mut self, db: Arc<DatabasePool>) -> Self {
        self.db = Some(db);
        self
    }

    /// Continue the id sequence after the highest persisted item. Called
    /// once at startup when a database is attached.
    pub async fn sync_sequence(&self) -> EngineResult<()> {
        if let Some(ref db) = self.db {
            let max_id = db
                .content()
                .max_item_id()
                .await
                .map_err(EngineError::Storage)?;
            self.next_id.store(max_id + 1, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Accept a new submission into PENDING and bump the author's
    /// submission counter. No points are awarded at submission time.
    pub async fn submit(
        &self,
        author_id: &str,
        kind: ContentKind,
        body: &str,
    ) -> EngineResult<ContentItem> {
        let body = body.trim();
        if body.is_empty() {
            return Err(EngineError::Validation(
                "submission body must not be empty".to_string(),
            ));
        }

        let max_len = match kind {
            ContentKind::Joke => self.limits.max_joke_len,
            ContentKind::Meme => self.limits.max_meme_len,
        };
        if body.chars().count() > max_len {
            return Err(EngineError::Validation(format!(
                "{} body exceeds the {max_len} character limit",
                kind.as_str()
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = ContentItem::new(id, author_id.to_string(), kind, body.to_string());

        if let Some(ref db) = self.db {
            db.content()
                .upsert_item(&item)
                .await
                .map_err(EngineError::Storage)?;
        }

        self.items.write().await.insert(id, item.clone());
        self.ledger.record_submission(author_id).await?;

        info!(
            content_id = id,
            author_id = %author_id,
            kind = kind.as_str(),
            "Content submitted"
        );

        Ok(item)
    }

    /// Look an item up: cache, then database, then NotFound
    pub async fn get(&self, content_id: i64) -> EngineResult<ContentItem> {
        {
            let items = self.items.read().await;
            if let Some(item) = items.get(&content_id) {
                return Ok(item.clone());
            }
        }

        if let Some(ref db) = self.db {
            if let Some(item) = db
                .content()
                .load_item(content_id)
                .await
                .map_err(EngineError::Storage)?
            {
                self.items.write().await.insert(content_id, item.clone());
                return Ok(item);
            }
        }

        Err(EngineError::not_found("content", content_id))
    }

    pub async fn record_view(&self, content_id: i64) -> EngineResult<ContentItem> {
        self.bump_engagement(content_id, |item| item.views += 1).await
    }

    pub async fn record_like(&self, content_id: i64) -> EngineResult<ContentItem> {
        self.bump_engagement(content_id, |item| item.likes += 1).await
    }

    pub async fn record_dislike(&self, content_id: i64) -> EngineResult<ContentItem> {
        self.bump_engagement(content_id, |item| item.dislikes += 1).await
    }

    /// The one-shot moderation transition. Only `ModerationEngine` calls
    /// this; a second decision on the same item always fails.
    pub(crate) async fn apply_decision(
        &self,
        content_id: i64,
        moderator_id: &str,
        outcome: ModerationOutcome,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<ContentItem> {
        let mut items = self.items.write().await;

        let current = match items.get(&content_id) {
            Some(item) => item.clone(),
            None => return Err(EngineError::not_found("content", content_id)),
        };

        match current.status {
            ContentStatus::Pending => {}
            ContentStatus::Approved | ContentStatus::Rejected => {
                return Err(EngineError::InvalidState(format!(
                    "content {content_id} already moderated"
                )));
            }
        }

        let mut updated = current;
        updated.status = match outcome {
            ModerationOutcome::Approve => ContentStatus::Approved,
            ModerationOutcome::Reject => ContentStatus::Rejected,
        };
        updated.moderator_id = Some(moderator_id.to_string());
        updated.moderator_comment = comment;
        updated.moderated_at = Some(now);

        if let Some(ref db) = self.db {
            db.content()
                .upsert_item(&updated)
                .await
                .map_err(EngineError::Storage)?;
        }

        items.insert(content_id, updated.clone());
        Ok(updated)
    }

    /// Moderation queue, oldest first
    pub async fn list_pending(&self) -> Vec<ContentItem> {
        let items = self.items.read().await;
        let mut pending: Vec<ContentItem> = items
            .values()
            .filter(|item| item.status == ContentStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|item| (item.created_at, item.id));
        pending
    }

    /// Approved items by other authors; the duel matching pool
    pub async fn approved_candidates(&self, exclude_author: &str) -> Vec<ContentItem> {
        let items = self.items.read().await;
        items
            .values()
            .filter(|item| item.status == ContentStatus::Approved && item.author_id != exclude_author)
            .cloned()
            .collect()
    }

    pub async fn counts(&self) -> ContentCounts {
        let items = self.items.read().await;
        let mut counts = ContentCounts {
            total: items.len(),
            pending: 0,
            approved: 0,
            rejected: 0,
        };
        for item in items.values() {
            match item.status {
                ContentStatus::Pending => counts.pending += 1,
                ContentStatus::Approved => counts.approved += 1,
                ContentStatus::Rejected => counts.rejected += 1,
            }
        }
        counts
    }

    /// Read-modify-write on one item's engagement counters. Only approved
    /// content accrues public engagement.
    async fn bump_engagement<F>(&self, content_id: i64, apply: F) -> EngineResult<ContentItem>
    where
        F: FnOnce(&mut ContentItem),
    {
        let mut items = self.items.write().await;

        let current = match items.get(&content_id) {
            Some(item) => item.clone(),
            None => return Err(EngineError::not_found("content", content_id)),
        };

        match current.status {
            ContentStatus::Approved => {}
            ContentStatus::Pending | ContentStatus::Rejected => {
                return Err(EngineError::InvalidState(format!(
                    "content {content_id} is {} and does not accept engagement",
                    current.status.as_str()
                )));
            }
        }

        let mut updated = current;
        apply(&mut updated);

        if let Some(ref db) = self.db {
            db.content()
                .upsert_item(&updated)
                .await
                .map_err(EngineError::Storage)?;
        }

        items.insert(content_id, updated.clone());
        debug!(content_id, "Engagement recorded");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RanksConfig;

    fn store() -> ContentStore {
        let ledger = Arc::new(Ledger::new(&RanksConfig::default()));
        ContentStore::new(&ContentConfig::default(), ledger)
    }

    #[tokio::test]
    async fn test_submit_creates_pending() {
        let store = store();

        let item = store
            .submit("author", ContentKind::Joke, "why did the crab cross the road")
            .await
            .unwrap();

        assert_eq!(item.id, 1);
        assert_eq!(item.status, ContentStatus::Pending);
        assert_eq!(store.get(item.id).await.unwrap().author_id, "author");
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_body() {
        let store = store();

        let err = store.submit("author", ContentKind::Joke, "   ").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_rejects_oversized_body() {
        let ledger = Arc::new(Ledger::new(&RanksConfig::default()));
        let store = ContentStore::new(
            &ContentConfig { max_joke_len: 10, max_meme_len: 10 },
            ledger,
        );

        let err = store
            .submit("author", ContentKind::Joke, "a joke that runs far past ten characters")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_engagement_requires_approved() {
        let store = store();
        let item = store.submit("author", ContentKind::Joke, "setup, punchline").await.unwrap();

        let err = store.record_like(item.id).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));

        store
            .apply_decision(item.id, "mod_1", ModerationOutcome::Approve, None, Utc::now())
            .await
            .unwrap();

        let updated = store.record_like(item.id).await.unwrap();
        assert_eq!(updated.likes, 1);
    }

    #[tokio::test]
    async fn test_engagement_on_missing_item() {
        let store = store();
        let err = store.record_view(404).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_decision_is_one_shot() {
        let store = store();
        let item = store.submit("author", ContentKind::Meme, "file_abc123").await.unwrap();

        store
            .apply_decision(item.id, "mod_1", ModerationOutcome::Reject, Some("off-topic".to_string()), Utc::now())
            .await
            .unwrap();

        let err = store
            .apply_decision(item.id, "mod_2", ModerationOutcome::Approve, None, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));

        // First decision stands
        let item = store.get(item.id).await.unwrap();
        assert_eq!(item.status, ContentStatus::Rejected);
        assert_eq!(item.moderator_id.as_deref(), Some("mod_1"));
    }

    #[tokio::test]
    async fn test_candidate_pool_excludes_author() {
        let store = store();

        let mine = store.submit("me", ContentKind::Joke, "my joke").await.unwrap();
        let theirs = store.submit("them", ContentKind::Joke, "their joke").await.unwrap();
        for id in [mine.id, theirs.id] {
            store
                .apply_decision(id, "mod_1", ModerationOutcome::Approve, None, Utc::now())
                .await
                .unwrap();
        }

        let pool = store.approved_candidates("me").await;
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].author_id, "them");
    }
}
