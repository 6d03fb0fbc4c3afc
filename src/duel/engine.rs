//! Duel Engine
//!
//! All duel mutations run under one write lock over the board (duels plus
//! votes), so the (duel, voter) uniqueness check, the counter increments,
//! and the status compare-and-set are each a single atomic unit. When a
//! database is attached, `UNIQUE(duel_id, voter_id)` and a status-guarded
//! UPDATE back the same invariants in storage.

use crate::audit::{AdminAction, AdminActionKind, AuditLog};
use crate::config::{DuelConfig, PointsConfig};
use crate::content::{ContentStatus, ContentStore};
use crate::database::DatabasePool;
use crate::duel::{Duel, DuelSide, DuelStatus, DuelVote};
use crate::error::{EngineError, EngineResult};
use crate::ledger::Ledger;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Aggregate duel counts for reporting
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DuelCounts {
    pub active: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub votes_cast: u64,
}

/// Duels and their votes, guarded together so vote uniqueness and counter
/// updates cannot be separated
#[derive(Default)]
struct DuelBoard {
    duels: HashMap<i64, Duel>,
    votes: HashMap<i64, HashMap<String, DuelVote>>,
}

/// Creates, tracks, and resolves duels
pub struct DuelEngine {
    db: Option<Arc<DatabasePool>>,
    config: DuelConfig,
    points: PointsConfig,
    content: Arc<ContentStore>,
    ledger: Arc<Ledger>,
    audit: Arc<AuditLog>,
    next_id: AtomicI64,
    board: RwLock<DuelBoard>,
}

impl DuelEngine {
    pub fn new(
        content: Arc<ContentStore>,
        ledger: Arc<Ledger>,
        audit: Arc<AuditLog>,
        config: &DuelConfig,
        points: &PointsConfig,
    ) -> Self {
        Self {
            db: None,
            config: config.clone(),
            points: points.clone(),
            content,
            ledger,
            audit,
            next_id: AtomicI64::new(1),
            board: RwLock::new(DuelBoard::default()),
        }
    }

    pub fn with_database(mut self, db: Arc<DatabasePool>) -> Self {
        self.db = Some(db);
        self
    }

    /// Continue the id sequence after the highest persisted duel. Called
    /// once at startup when a database is attached.
    pub async fn sync_sequence(&self) -> EngineResult<()> {
        if let Some(ref db) = self.db {
            let max_id = db.duels().max_duel_id().await.map_err(EngineError::Storage)?;
            self.next_id.store(max_id + 1, Ordering::SeqCst);
        }
        Ok(())
    }

    /// Open a new duel. The initiator's content must be approved and their
    /// own; with no opponent content supplied, an approved item by another
    /// author is drawn uniformly at random.
    pub async fn initiate(
        &self,
        initiator_id: &str,
        initiator_content_id: i64,
        opponent_content_id: Option<i64>,
        public: bool,
    ) -> EngineResult<Duel> {
        let own = self.content.get(initiator_content_id).await?;
        if own.status != ContentStatus::Approved {
            return Err(EngineError::InvalidState(format!(
                "content {initiator_content_id} is {} and cannot enter a duel",
                own.status.as_str()
            )));
        }
        if own.author_id != initiator_id {
            return Err(EngineError::Validation(format!(
                "content {initiator_content_id} is not authored by {initiator_id}"
            )));
        }

        let opponent_item = match opponent_content_id {
            Some(id) => {
                if id == initiator_content_id {
                    return Err(EngineError::Validation(
                        "a duel needs two distinct content items".to_string(),
                    ));
                }
                let item = self.content.get(id).await?;
                if item.status != ContentStatus::Approved {
                    return Err(EngineError::InvalidState(format!(
                        "content {id} is {} and cannot enter a duel",
                        item.status.as_str()
                    )));
                }
                if item.author_id == initiator_id {
                    return Err(EngineError::Validation(
                        "cannot duel against your own content".to_string(),
                    ));
                }
                item
            }
            None => {
                let pool = self.content.approved_candidates(initiator_id).await;
                match pool.choose(&mut rand::thread_rng()).cloned() {
                    Some(item) => item,
                    None => return Err(EngineError::NoOpponentAvailable),
                }
            }
        };

        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let duel = Duel::new(
            id,
            initiator_id.to_string(),
            opponent_item.author_id.clone(),
            initiator_content_id,
            opponent_item.id,
            now + Duration::seconds(self.config.voting_window_secs),
            public,
        );

        if let Some(ref db) = self.db {
            db.duels()
                .upsert_duel(&duel)
                .await
                .map_err(EngineError::Storage)?;
        }

        self.board.write().await.duels.insert(id, duel.clone());

        info!(
            duel_id = id,
            initiator_id = %duel.initiator_id,
            opponent_id = %duel.opponent_id,
            voting_ends_at = %duel.voting_ends_at,
            "Duel initiated"
        );

        Ok(duel)
    }

    /// Cast a vote using the wall clock
    pub async fn cast_vote(&self, duel_id: i64, voter_id: &str, side: DuelSide) -> EngineResult<Duel> {
        self.cast_vote_at(duel_id, voter_id, side, Utc::now()).await
    }

    /// Cast a vote at an explicit instant. The uniqueness check and the
    /// counter increments happen under one held write lock: of two
    /// concurrent votes by the same voter, exactly one counts and the other
    /// gets DuplicateVote with counters untouched.
    pub async fn cast_vote_at(
        &self,
        duel_id: i64,
        voter_id: &str,
        side: DuelSide,
        now: DateTime<Utc>,
    ) -> EngineResult<Duel> {
        let mut board = self.board.write().await;

        let current = match board.duels.get(&duel_id) {
            Some(duel) => duel.clone(),
            None => return Err(EngineError::not_found("duel", duel_id)),
        };

        match current.status {
            DuelStatus::Active => {}
            DuelStatus::Completed | DuelStatus::Cancelled => {
                return Err(EngineError::InvalidState(format!(
                    "duel {duel_id} is {}; voting is closed",
                    current.status.as_str()
                )));
            }
        }

        if now >= current.voting_ends_at {
            return Err(EngineError::InvalidState(format!(
                "voting window for duel {duel_id} has closed"
            )));
        }

        let already_voted = board
            .votes
            .get(&duel_id)
            .is_some_and(|votes| votes.contains_key(voter_id));
        if already_voted {
            return Err(EngineError::DuplicateVote {
                duel_id,
                voter_id: voter_id.to_string(),
            });
        }

        let vote = DuelVote {
            duel_id,
            voter_id: voter_id.to_string(),
            side,
            created_at: now,
        };
        let mut updated = current;
        updated.apply_vote(side);

        if let Some(ref db) = self.db {
            // The schema's UNIQUE(duel_id, voter_id) is the second line of
            // defense, covering votes persisted before this process started
            let inserted = db
                .duels()
                .insert_vote(&vote)
                .await
                .map_err(EngineError::Storage)?;
            if !inserted {
                return Err(EngineError::DuplicateVote {
                    duel_id,
                    voter_id: voter_id.to_string(),
                });
            }
            db.duels()
                .upsert_duel(&updated)
                .await
                .map_err(EngineError::Storage)?;
        }

        board
            .votes
            .entry(duel_id)
            .or_default()
            .insert(voter_id.to_string(), vote);
        board.duels.insert(duel_id, updated.clone());

        debug!(
            duel_id,
            voter_id = %voter_id,
            side = side.as_str(),
            total_votes = updated.total_votes,
            "Vote cast"
        );

        Ok(updated)
    }

    /// Resolve using the wall clock
    pub async fn resolve(&self, duel_id: i64) -> EngineResult<Duel> {
        self.resolve_at(duel_id, Utc::now()).await
    }

    /// Resolve a duel whose window has elapsed. Already-terminal duels are
    /// a no-op returning the final state; the ACTIVE -> COMPLETED step is a
    /// compare-and-set under the write lock, so racing resolvers apply the
    /// point award and counters exactly once.
    pub async fn resolve_at(&self, duel_id: i64, now: DateTime<Utc>) -> EngineResult<Duel> {
        let mut board = self.board.write().await;

        let current = match board.duels.get(&duel_id) {
            Some(duel) => duel.clone(),
            None => return Err(EngineError::not_found("duel", duel_id)),
        };

        match current.status {
            // The loser of the race observes the terminal state and
            // returns without side effects
            DuelStatus::Completed | DuelStatus::Cancelled => return Ok(current),
            DuelStatus::Active => {}
        }

        if now < current.voting_ends_at {
            return Err(EngineError::InvalidState(format!(
                "duel {duel_id} voting window is still open"
            )));
        }

        let mut updated = current;
        updated.status = DuelStatus::Completed;
        updated.completed_at = Some(now);

        let winning = updated.winning_side(self.config.min_votes);
        let outcome = match winning {
            Some(DuelSide::Initiator) => {
                Some((updated.initiator_id.clone(), updated.opponent_id.clone()))
            }
            Some(DuelSide::Opponent) => {
                Some((updated.opponent_id.clone(), updated.initiator_id.clone()))
            }
            None => None,
        };
        updated.winner_id = outcome.as_ref().map(|(winner, _)| winner.clone());

        if let Some(ref db) = self.db {
            let applied = db
                .duels()
                .finalize_duel(&updated)
                .await
                .map_err(EngineError::Storage)?;
            if !applied {
                warn!(duel_id, "Duel was already finalized in storage");
            }
        }

        board.duels.insert(duel_id, updated.clone());

        match outcome {
            Some((winner_id, loser_id)) => {
                self.ledger
                    .award(&winner_id, self.points.duel_win, "duel-won")
                    .await?;
                self.ledger.record_duel_result(&winner_id, &loser_id).await?;
                info!(
                    duel_id,
                    winner_id = %winner_id,
                    initiator_votes = updated.initiator_votes,
                    opponent_votes = updated.opponent_votes,
                    "Duel resolved with a winner"
                );
            }
            None => {
                info!(
                    duel_id,
                    total_votes = updated.total_votes,
                    min_votes = self.config.min_votes,
                    "Duel resolved without a winner"
                );
            }
        }

        Ok(updated)
    }

    /// Sweep for the external scheduler: resolve every active duel whose
    /// deadline has passed and return the resolved duels
    pub async fn resolve_expired(&self, now: DateTime<Utc>) -> Vec<Duel> {
        let expired: Vec<i64> = {
            let board = self.board.read().await;
            board
                .duels
                .values()
                .filter(|duel| duel.status == DuelStatus::Active && duel.voting_ends_at <= now)
                .map(|duel| duel.id)
                .collect()
        };

        let mut resolved = Vec::new();
        for duel_id in expired {
            match self.resolve_at(duel_id, now).await {
                Ok(duel) => resolved.push(duel),
                Err(err) => warn!(duel_id, error = %err, "Failed to resolve expired duel"),
            }
        }
        resolved
    }

    /// Administrative withdrawal; only an active duel with no votes yet
    pub async fn cancel(
        &self,
        duel_id: i64,
        actor_id: &str,
        reason: Option<String>,
    ) -> EngineResult<Duel> {
        let updated = {
            let mut board = self.board.write().await;

            let current = match board.duels.get(&duel_id) {
                Some(duel) => duel.clone(),
                None => return Err(EngineError::not_found("duel", duel_id)),
            };

            match current.status {
                DuelStatus::Active => {}
                DuelStatus::Completed | DuelStatus::Cancelled => {
                    return Err(EngineError::InvalidState(format!(
                        "duel {duel_id} is already {}",
                        current.status.as_str()
                    )));
                }
            }

            if current.total_votes > 0 {
                return Err(EngineError::InvalidState(format!(
                    "duel {duel_id} has recorded votes and can no longer be cancelled"
                )));
            }

            let mut updated = current;
            updated.status = DuelStatus::Cancelled;
            updated.completed_at = Some(Utc::now());

            if let Some(ref db) = self.db {
                let applied = db
                    .duels()
                    .finalize_duel(&updated)
                    .await
                    .map_err(EngineError::Storage)?;
                if !applied {
                    warn!(duel_id, "Duel was already finalized in storage");
                }
            }

            board.duels.insert(duel_id, updated.clone());
            updated
        };

        self.audit
            .record(AdminAction::new(
                actor_id,
                AdminActionKind::DuelCancelled,
                format!("duel:{duel_id}"),
                reason,
            ))
            .await?;

        info!(duel_id, actor_id = %actor_id, "Duel cancelled");
        Ok(updated)
    }

    /// Look a duel up: cache, then database, then NotFound
    pub async fn get(&self, duel_id: i64) -> EngineResult<Duel> {
        {
            let board = self.board.read().await;
            if let Some(duel) = board.duels.get(&duel_id) {
                return Ok(duel.clone());
            }
        }

        if let Some(ref db) = self.db {
            if let Some(duel) = db
                .duels()
                .load_duel(duel_id)
                .await
                .map_err(EngineError::Storage)?
            {
                // Hydrate the vote index too, so the in-memory uniqueness
                // check covers votes persisted before this process started
                let votes = db
                    .duels()
                    .load_votes(duel_id)
                    .await
                    .map_err(EngineError::Storage)?;

                let mut board = self.board.write().await;
                board.duels.insert(duel_id, duel.clone());
                let index = board.votes.entry(duel_id).or_default();
                for vote in votes {
                    index.insert(vote.voter_id.clone(), vote);
                }
                return Ok(duel);
            }
        }

        Err(EngineError::not_found("duel", duel_id))
    }

    /// Currently active duels, oldest first
    pub async fn list_active(&self) -> Vec<Duel> {
        let board = self.board.read().await;
        let mut active: Vec<Duel> = board
            .duels
            .values()
            .filter(|duel| duel.status == DuelStatus::Active)
            .cloned()
            .collect();
        active.sort_by_key(|duel| duel.id);
        active
    }

    pub async fn counts(&self) -> DuelCounts {
        let board = self.board.read().await;
        let mut counts = DuelCounts {
            active: 0,
            completed: 0,
            cancelled: 0,
            votes_cast: 0,
        };
        for duel in board.duels.values() {
            match duel.status {
                DuelStatus::Active => counts.active += 1,
                DuelStatus::Completed => counts.completed += 1,
                DuelStatus::Cancelled => counts.cancelled += 1,
            }
            counts.votes_cast += u64::from(duel.total_votes);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, RanksConfig};
    use crate::content::{ContentKind, ModerationOutcome};

    struct Fixture {
        engine: DuelEngine,
        content: Arc<ContentStore>,
        ledger: Arc<Ledger>,
    }

    async fn fixture() -> Fixture {
        let ledger = Arc::new(Ledger::new(&RanksConfig::default()));
        let content = Arc::new(ContentStore::new(&ContentConfig::default(), ledger.clone()));
        let audit = Arc::new(AuditLog::new());
        let engine = DuelEngine::new(
            content.clone(),
            ledger.clone(),
            audit,
            &DuelConfig::default(),
            &PointsConfig::default(),
        );
        Fixture { engine, content, ledger }
    }

    async fn approved_item(fixture: &Fixture, author: &str, body: &str) -> i64 {
        let item = fixture
            .content
            .submit(author, ContentKind::Joke, body)
            .await
            .unwrap();
        fixture
            .content
            .apply_decision(item.id, "mod_1", ModerationOutcome::Approve, None, Utc::now())
            .await
            .unwrap();
        item.id
    }

    #[tokio::test]
    async fn test_initiate_with_explicit_opponent() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;

        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        assert_eq!(duel.status, DuelStatus::Active);
        assert_eq!(duel.opponent_id, "bob");
        assert_eq!(duel.total_votes, 0);
        assert!(duel.voting_ends_at > duel.created_at);
    }

    #[tokio::test]
    async fn test_initiate_requires_own_approved_content() {
        let fx = fixture().await;
        let theirs = approved_item(&fx, "bob", "joke b").await;

        // Not the author
        let err = fx.engine.initiate("alice", theirs, None, true).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // Pending content
        let pending = fx.content.submit("alice", ContentKind::Joke, "draft").await.unwrap();
        let err = fx.engine.initiate("alice", pending.id, None, true).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_auto_match_excludes_own_content() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;

        let duel = fx.engine.initiate("alice", mine, None, true).await.unwrap();
        assert_eq!(duel.opponent_content_id, theirs);
        assert_eq!(duel.opponent_id, "bob");
    }

    #[tokio::test]
    async fn test_no_opponent_available() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;

        let err = fx.engine.initiate("alice", mine, None, true).await.unwrap_err();
        assert!(matches!(err, EngineError::NoOpponentAvailable));
    }

    #[tokio::test]
    async fn test_duplicate_vote_rejected_with_counters_unchanged() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        fx.engine.cast_vote(duel.id, "voter_1", DuelSide::Initiator).await.unwrap();
        let err = fx
            .engine
            .cast_vote(duel.id, "voter_1", DuelSide::Opponent)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateVote { .. }));

        let current = fx.engine.get(duel.id).await.unwrap();
        assert_eq!(current.total_votes, 1);
        assert_eq!(current.initiator_votes, 1);
        assert_eq!(current.opponent_votes, 0);
    }

    #[tokio::test]
    async fn test_vote_after_deadline_rejected() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let err = fx
            .engine
            .cast_vote_at(duel.id, "voter_1", DuelSide::Initiator, after_deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_resolve_before_deadline_rejected() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        let err = fx.engine.resolve(duel.id).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_resolve_with_clear_winner() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        fx.engine.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();
        fx.engine.cast_vote(duel.id, "v2", DuelSide::Initiator).await.unwrap();
        fx.engine.cast_vote(duel.id, "v3", DuelSide::Opponent).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let resolved = fx.engine.resolve_at(duel.id, after_deadline).await.unwrap();

        assert_eq!(resolved.status, DuelStatus::Completed);
        assert_eq!(resolved.winner_id.as_deref(), Some("alice"));

        let winner = fx.ledger.balance("alice").await.unwrap();
        let loser = fx.ledger.balance("bob").await.unwrap();
        assert_eq!(winner.duels_won, 1);
        assert_eq!(loser.duels_lost, 1);
        // Approval points plus the win bonus
        assert_eq!(
            winner.points,
            PointsConfig::default().content_approved + PointsConfig::default().duel_win
        );
    }

    #[tokio::test]
    async fn test_resolve_below_turnout_has_no_winner() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        fx.engine.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let resolved = fx.engine.resolve_at(duel.id, after_deadline).await.unwrap();

        assert_eq!(resolved.status, DuelStatus::Completed);
        assert!(resolved.winner_id.is_none());
        assert_eq!(fx.ledger.balance("alice").await.unwrap().duels_won, 0);
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        for id in ["v1", "v2", "v3"] {
            fx.engine.cast_vote(duel.id, id, DuelSide::Initiator).await.unwrap();
        }

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        fx.engine.resolve_at(duel.id, after_deadline).await.unwrap();
        // Second resolution observes the terminal state, no second award
        fx.engine.resolve_at(duel.id, after_deadline).await.unwrap();

        let winner = fx.ledger.balance("alice").await.unwrap();
        assert_eq!(winner.duels_won, 1);
        assert_eq!(
            winner.points,
            PointsConfig::default().content_approved + PointsConfig::default().duel_win
        );
    }

    #[tokio::test]
    async fn test_cancel_only_before_votes() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;

        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();
        let cancelled = fx.engine.cancel(duel.id, "admin", None).await.unwrap();
        assert_eq!(cancelled.status, DuelStatus::Cancelled);

        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();
        fx.engine.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();
        let err = fx.engine.cancel(duel.id, "admin", None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_resolve_expired_sweep() {
        let fx = fixture().await;
        let mine = approved_item(&fx, "alice", "joke a").await;
        let theirs = approved_item(&fx, "bob", "joke b").await;
        let duel = fx.engine.initiate("alice", mine, Some(theirs), true).await.unwrap();

        // Nothing expired yet
        assert!(fx.engine.resolve_expired(Utc::now()).await.is_empty());

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let resolved = fx.engine.resolve_expired(after_deadline).await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].status, DuelStatus::Completed);
    }
}
