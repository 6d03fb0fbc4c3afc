//! User Accounts and the Point Audit Trail
//!
//! An account is created on a user's first interaction and soft-retained
//! forever. The point total only grows; corrections happen through explicit
//! compensating entries, never by rewriting history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user point balance, rank, and activity counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    /// Stable external id supplied by the caller
    pub user_id: String,

    /// Current point total (never negative)
    pub points: i64,

    /// Rank label derived from the point total
    pub rank: String,

    /// Activity counters
    pub submissions: u64,
    pub jokes_approved: u64,
    pub memes_approved: u64,
    pub reactions_given: u64,
    pub duels_won: u64,
    pub duels_lost: u64,

    /// Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(user_id: String, rank: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            points: 0,
            rank,
            submissions: 0,
            jokes_approved: 0,
            memes_approved: 0,
            reactions_given: 0,
            duels_won: 0,
            duels_lost: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One recorded point award
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique id for this entry
    pub id: Uuid,

    /// User the points went to
    pub user_id: String,

    /// Points awarded by this entry
    pub amount: i64,

    /// Why the award happened ("content-approved", "reaction", "duel-won")
    pub reason: String,

    /// When the award was applied
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(user_id: String, amount: i64, reason: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            reason,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_starts_empty() {
        let account = UserAccount::new("user_1".to_string(), "Newcomer".to_string());
        assert_eq!(account.points, 0);
        assert_eq!(account.submissions, 0);
        assert_eq!(account.duels_won, 0);
        assert_eq!(account.rank, "Newcomer");
    }

    #[test]
    fn test_entry_records_reason() {
        let entry = LedgerEntry::new("user_1".to_string(), 20, "content-approved".to_string());
        assert_eq!(entry.amount, 20);
        assert_eq!(entry.reason, "content-approved");
    }
}
