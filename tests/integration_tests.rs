//! Integration tests for the engagement engine
//!
//! These tests verify end-to-end functionality of the core subsystem:
//! moderation awards, reaction flows, duel lifecycle and resolution,
//! vote uniqueness under concurrency, and rank derivation.

use chrono::Duration;
use std::sync::Arc;

use banter_arena::config::{ContentConfig, DuelConfig, PointsConfig, RanksConfig};
use banter_arena::{
    AuditLog, ContentKind, ContentStatus, ContentStore, DuelEngine, DuelSide, DuelStatus,
    EngineError, Ledger, ModerationEngine, ModerationOutcome, RatingEngine, ReactionKind,
    StatsCollector,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Engines {
    ledger: Arc<Ledger>,
    content: Arc<ContentStore>,
    moderation: Arc<ModerationEngine>,
    rating: Arc<RatingEngine>,
    duels: Arc<DuelEngine>,
}

/// Build the full engine stack with default configuration, in-memory only
fn create_engines() -> Engines {
    let points = PointsConfig::default();
    let ledger = Arc::new(Ledger::new(&RanksConfig::default()));
    let audit = Arc::new(AuditLog::new());
    let content = Arc::new(ContentStore::new(&ContentConfig::default(), ledger.clone()));
    let moderation = Arc::new(ModerationEngine::new(
        content.clone(),
        ledger.clone(),
        audit.clone(),
        &points,
    ));
    let rating = Arc::new(RatingEngine::new(content.clone(), ledger.clone(), &points));
    let duels = Arc::new(DuelEngine::new(
        content.clone(),
        ledger.clone(),
        audit,
        &DuelConfig::default(),
        &points,
    ));

    Engines {
        ledger,
        content,
        moderation,
        rating,
        duels,
    }
}

/// Submit and approve one item, returning its id
async fn submit_approved(engines: &Engines, author: &str, body: &str) -> i64 {
    let item = engines
        .content
        .submit(author, ContentKind::Joke, body)
        .await
        .unwrap();
    engines
        .moderation
        .decide(item.id, "moderator", ModerationOutcome::Approve, None)
        .await
        .unwrap();
    item.id
}

// ============================================================================
// Moderation and Points Flow
// ============================================================================

mod moderation_flow {
    use super::*;

    #[tokio::test]
    async fn test_approval_awards_points_and_updates_rank() {
        let engines = create_engines();
        let approval_points = PointsConfig::default().content_approved;

        let item = engines
            .content
            .submit("user_a", ContentKind::Joke, "first joke")
            .await
            .unwrap();
        assert_eq!(item.status, ContentStatus::Pending);

        engines
            .moderation
            .decide(item.id, "moderator", ModerationOutcome::Approve, None)
            .await
            .unwrap();

        let account = engines.ledger.balance("user_a").await.unwrap();
        assert_eq!(account.points, approval_points);
        assert_eq!(account.submissions, 1);
        assert_eq!(account.jokes_approved, 1);
        assert_eq!(account.rank, "Newcomer");

        // Two more approvals cross the 50-point threshold
        for body in ["second joke", "third joke"] {
            submit_approved(&engines, "user_a", body).await;
        }

        let account = engines.ledger.balance("user_a").await.unwrap();
        assert_eq!(account.points, approval_points * 3);
        assert_eq!(account.rank, "Joker");
    }

    #[tokio::test]
    async fn test_rejection_stores_comment_without_points() {
        let engines = create_engines();

        let item = engines
            .content
            .submit("user_a", ContentKind::Meme, "file_ref_1")
            .await
            .unwrap();
        let decided = engines
            .moderation
            .decide(
                item.id,
                "moderator",
                ModerationOutcome::Reject,
                Some("duplicate of an older submission".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(decided.status, ContentStatus::Rejected);
        assert!(decided.moderator_comment.is_some());
        assert_eq!(engines.ledger.balance("user_a").await.unwrap().points, 0);
    }

    #[tokio::test]
    async fn test_second_decision_fails_and_never_double_awards() {
        let engines = create_engines();
        let item = engines
            .content
            .submit("user_a", ContentKind::Joke, "a joke")
            .await
            .unwrap();

        engines
            .moderation
            .decide(item.id, "mod_1", ModerationOutcome::Approve, None)
            .await
            .unwrap();

        for outcome in [ModerationOutcome::Approve, ModerationOutcome::Reject] {
            let err = engines
                .moderation
                .decide(item.id, "mod_2", outcome, None)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidState(_)));
        }

        assert_eq!(
            engines.ledger.balance("user_a").await.unwrap().points,
            PointsConfig::default().content_approved
        );
    }
}

// ============================================================================
// Reaction Flow
// ============================================================================

mod rating_flow {
    use super::*;

    #[tokio::test]
    async fn test_reactions_update_counters_and_pay_the_reactor() {
        let engines = create_engines();
        let content_id = submit_approved(&engines, "author", "an approved joke").await;

        engines
            .rating
            .react("reader_1", content_id, ReactionKind::Like)
            .await
            .unwrap();
        engines
            .rating
            .react("reader_2", content_id, ReactionKind::Dislike)
            .await
            .unwrap();
        engines
            .rating
            .react("reader_3", content_id, ReactionKind::View)
            .await
            .unwrap();

        let item = engines.content.get(content_id).await.unwrap();
        assert_eq!(item.likes, 1);
        assert_eq!(item.dislikes, 1);
        assert_eq!(item.views, 1);

        let reaction_points = PointsConfig::default().reaction;
        assert_eq!(
            engines.ledger.balance("reader_1").await.unwrap().points,
            reaction_points
        );
        // Views pay nothing
        assert_eq!(engines.ledger.balance("reader_3").await.unwrap().points, 0);
    }

    #[tokio::test]
    async fn test_unapproved_content_accepts_no_engagement() {
        let engines = create_engines();
        let pending = engines
            .content
            .submit("author", ContentKind::Joke, "still pending")
            .await
            .unwrap();

        let err = engines
            .rating
            .react("reader", pending.id, ReactionKind::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));

        let err = engines
            .rating
            .react("reader", 9999, ReactionKind::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}

// ============================================================================
// Duel Lifecycle
// ============================================================================

mod duel_flow {
    use super::*;

    #[tokio::test]
    async fn test_full_duel_scenario_with_winner() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;

        let duel = engines
            .duels
            .initiate("user_a", c1, Some(c2), true)
            .await
            .unwrap();
        assert_eq!(duel.status, DuelStatus::Active);

        // Two votes for the initiator's item, one for the opponent's
        engines.duels.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();
        engines.duels.cast_vote(duel.id, "v2", DuelSide::Initiator).await.unwrap();
        engines.duels.cast_vote(duel.id, "v3", DuelSide::Opponent).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let resolved = engines.duels.resolve_at(duel.id, after_deadline).await.unwrap();

        assert_eq!(resolved.status, DuelStatus::Completed);
        assert_eq!(resolved.winner_id.as_deref(), Some("user_a"));
        assert_eq!(resolved.total_votes, 3);

        let winner = engines.ledger.balance("user_a").await.unwrap();
        let loser = engines.ledger.balance("user_b").await.unwrap();
        assert_eq!(winner.duels_won, 1);
        assert_eq!(loser.duels_lost, 1);

        let defaults = PointsConfig::default();
        assert_eq!(winner.points, defaults.content_approved + defaults.duel_win);
        assert_eq!(loser.points, defaults.content_approved);
    }

    #[tokio::test]
    async fn test_below_turnout_completes_without_winner() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;

        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();
        engines.duels.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let resolved = engines.duels.resolve_at(duel.id, after_deadline).await.unwrap();

        // Voting happened, so the duel completes rather than cancels, but
        // one vote is below the minimum of three
        assert_eq!(resolved.status, DuelStatus::Completed);
        assert!(resolved.winner_id.is_none());
        assert_eq!(engines.ledger.balance("user_a").await.unwrap().duels_won, 0);
        assert_eq!(
            engines.ledger.balance("user_a").await.unwrap().points,
            PointsConfig::default().content_approved
        );
    }

    #[tokio::test]
    async fn test_tie_completes_without_winner() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;

        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();
        engines.duels.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();
        engines.duels.cast_vote(duel.id, "v2", DuelSide::Initiator).await.unwrap();
        engines.duels.cast_vote(duel.id, "v3", DuelSide::Opponent).await.unwrap();
        engines.duels.cast_vote(duel.id, "v4", DuelSide::Opponent).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let resolved = engines.duels.resolve_at(duel.id, after_deadline).await.unwrap();

        assert_eq!(resolved.status, DuelStatus::Completed);
        assert!(resolved.winner_id.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_vote_leaves_counters_unchanged() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();

        engines.duels.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();

        // A second vote by the same voter always fails, whichever side
        let err = engines
            .duels
            .cast_vote(duel.id, "v1", DuelSide::Opponent)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateVote { .. }));

        let current = engines.duels.get(duel.id).await.unwrap();
        assert_eq!(current.total_votes, 1);
        assert_eq!(current.initiator_votes + current.opponent_votes, current.total_votes);
    }

    #[tokio::test]
    async fn test_voting_on_resolved_duel_fails() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();

        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        engines.duels.resolve_at(duel.id, after_deadline).await.unwrap();

        let err = engines
            .duels
            .cast_vote(duel.id, "late_voter", DuelSide::Initiator)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_random_matching_needs_an_eligible_opponent() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "the only approved joke").await;

        let err = engines.duels.initiate("user_a", c1, None, true).await.unwrap_err();
        assert!(matches!(err, EngineError::NoOpponentAvailable));

        // Once someone else has approved content, matching succeeds
        let c2 = submit_approved(&engines, "user_b", "competition arrives").await;
        let duel = engines.duels.initiate("user_a", c1, None, true).await.unwrap();
        assert_eq!(duel.opponent_content_id, c2);
    }

    #[tokio::test]
    async fn test_expiry_sweep_resolves_all_overdue_duels() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        let c3 = submit_approved(&engines, "user_c", "joke by c").await;

        let d1 = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();
        let d2 = engines.duels.initiate("user_b", c2, Some(c3), true).await.unwrap();

        let after_deadline = d2.voting_ends_at + Duration::seconds(1);
        let resolved = engines.duels.resolve_expired(after_deadline).await;

        assert_eq!(resolved.len(), 2);
        for duel in [d1.id, d2.id] {
            let current = engines.duels.get(duel).await.unwrap();
            assert_eq!(current.status, DuelStatus::Completed);
        }
        assert!(engines.duels.list_active().await.is_empty());
    }
}

// ============================================================================
// Concurrency Properties
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn test_n_distinct_voters_yield_exactly_n_votes() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let duels = engines.duels.clone();
            let duel_id = duel.id;
            handles.push(tokio::spawn(async move {
                let side = if i % 2 == 0 { DuelSide::Initiator } else { DuelSide::Opponent };
                duels.cast_vote(duel_id, &format!("voter_{i}"), side).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let current = engines.duels.get(duel.id).await.unwrap();
        assert_eq!(current.total_votes, 20);
        assert_eq!(current.initiator_votes + current.opponent_votes, current.total_votes);
    }

    #[tokio::test]
    async fn test_concurrent_votes_by_one_voter_count_once() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let duels = engines.duels.clone();
            let duel_id = duel.id;
            handles.push(tokio::spawn(async move {
                duels.cast_vote(duel_id, "eager_voter", DuelSide::Initiator).await
            }));
        }

        let mut accepted = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(EngineError::DuplicateVote { .. }) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(rejected, 7);
        assert_eq!(engines.duels.get(duel.id).await.unwrap().total_votes, 1);
    }

    #[tokio::test]
    async fn test_racing_resolvers_apply_side_effects_once() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();

        for i in 0..3 {
            engines
                .duels
                .cast_vote(duel.id, &format!("v{i}"), DuelSide::Initiator)
                .await
                .unwrap();
        }

        // A deadline sweep and an explicit resolve race each other
        let after_deadline = duel.voting_ends_at + Duration::seconds(1);
        let mut handles = Vec::new();
        for _ in 0..4 {
            let duels = engines.duels.clone();
            let duel_id = duel.id;
            handles.push(tokio::spawn(async move { duels.resolve_at(duel_id, after_deadline).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let winner = engines.ledger.balance("user_a").await.unwrap();
        assert_eq!(winner.duels_won, 1);
        let defaults = PointsConfig::default();
        assert_eq!(winner.points, defaults.content_approved + defaults.duel_win);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_get_distinct_ids() {
        let engines = create_engines();

        let mut handles = Vec::new();
        for i in 0..10 {
            let content = engines.content.clone();
            handles.push(tokio::spawn(async move {
                content
                    .submit(&format!("user_{i}"), ContentKind::Joke, &format!("joke {i}"))
                    .await
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let item = handle.await.unwrap().unwrap();
            assert!(ids.insert(item.id), "duplicate content id issued");
        }
        assert_eq!(ids.len(), 10);
    }
}

// ============================================================================
// Reporting
// ============================================================================

mod reporting {
    use super::*;

    #[tokio::test]
    async fn test_stats_snapshot_tracks_the_whole_flow() {
        let engines = create_engines();
        let c1 = submit_approved(&engines, "user_a", "joke by a").await;
        let c2 = submit_approved(&engines, "user_b", "joke by b").await;
        engines
            .content
            .submit("user_c", ContentKind::Meme, "file_ref")
            .await
            .unwrap();

        let duel = engines.duels.initiate("user_a", c1, Some(c2), true).await.unwrap();
        engines.duels.cast_vote(duel.id, "v1", DuelSide::Initiator).await.unwrap();

        let stats = StatsCollector::new(
            engines.ledger.clone(),
            engines.content.clone(),
            engines.duels.clone(),
        )
        .snapshot()
        .await;

        assert_eq!(stats.total_content, 3);
        assert_eq!(stats.pending_content, 1);
        assert_eq!(stats.approved_content, 2);
        assert_eq!(stats.active_duels, 1);
        assert_eq!(stats.votes_cast, 1);
        // user_a, user_b, user_c have accounts; voting alone creates none
        assert_eq!(stats.total_users, 3);
    }

    #[tokio::test]
    async fn test_leaderboard_and_history() {
        let engines = create_engines();
        submit_approved(&engines, "user_a", "joke one").await;
        submit_approved(&engines, "user_a", "joke two").await;
        submit_approved(&engines, "user_b", "joke three").await;

        let top = engines.ledger.leaderboard(10).await;
        assert_eq!(top[0].user_id, "user_a");

        let history = engines.ledger.history("user_a").await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|entry| entry.reason == "content-approved"));
    }
}
