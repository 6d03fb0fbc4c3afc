//! Ledger - Point Accounting Orchestrator
//!
//! All point awards and activity counters flow through here. In-memory
//! state is authoritative for invariants; when a database pool is attached
//! the persist step runs before the in-memory commit, so a storage failure
//! leaves the ledger unchanged.

use crate::config::RanksConfig;
use crate::content::ContentKind;
use crate::database::DatabasePool;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{LedgerEntry, RankTable, UserAccount};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Main point ledger
pub struct Ledger {
    db: Option<Arc<DatabasePool>>,
    ranks: RankTable,

    /// Accounts by user id (authoritative)
    accounts: RwLock<HashMap<String, UserAccount>>,

    /// Append-only award audit trail
    entries: RwLock<Vec<LedgerEntry>>,
}

impl Ledger {
    pub fn new(ranks: &RanksConfig) -> Self {
        Self {
            db: None,
            ranks: RankTable::from_config(ranks),
            accounts: RwLock::new(HashMap::new()),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn with_database(mut self, db: Arc<DatabasePool>) -> Self {
        self.db = Some(db);
        self
    }

    /// Add `amount` points to the user, append an audit entry, and
    /// recompute the rank. Negative amounts are a validation error; zero is
    /// allowed and still audited.
    pub async fn award(&self, user_id: &str, amount: i64, reason: &str) -> EngineResult<UserAccount> {
        if amount < 0 {
            return Err(EngineError::Validation(format!(
                "award amount must not be negative (got {amount})"
            )));
        }

        let mut accounts = self.accounts.write().await;
        let mut account = self.load_or_create(&mut accounts, user_id).await?;

        account.points += amount;
        account.rank = self.ranks.label_for(account.points).to_string();
        account.updated_at = Utc::now();

        let entry = LedgerEntry::new(user_id.to_string(), amount, reason.to_string());

        if let Some(ref db) = self.db {
            db.users()
                .upsert_account(&account)
                .await
                .map_err(EngineError::Storage)?;
            db.users()
                .insert_entry(&entry)
                .await
                .map_err(EngineError::Storage)?;
        }

        accounts.insert(user_id.to_string(), account.clone());
        self.entries.write().await.push(entry);

        debug!(
            user_id = %user_id,
            amount,
            reason = %reason,
            total = account.points,
            rank = %account.rank,
            "Points awarded"
        );

        Ok(account)
    }

    /// Current total, rank, and counters. Creates a zero-balance account on
    /// first sight rather than failing, to tolerate first-time interaction.
    pub async fn balance(&self, user_id: &str) -> EngineResult<UserAccount> {
        {
            let accounts = self.accounts.read().await;
            if let Some(account) = accounts.get(user_id) {
                return Ok(account.clone());
            }
        }

        let mut accounts = self.accounts.write().await;
        let account = self.load_or_create(&mut accounts, user_id).await?;
        accounts
            .entry(user_id.to_string())
            .or_insert_with(|| account.clone());
        Ok(account)
    }

    /// Counter-only bookkeeping: a new submission (no points)
    pub async fn record_submission(&self, user_id: &str) -> EngineResult<()> {
        self.update_counters(user_id, |account| account.submissions += 1)
            .await
    }

    /// Counter-only bookkeeping: an approval for the matching content kind
    pub async fn record_approval(&self, user_id: &str, kind: ContentKind) -> EngineResult<()> {
        self.update_counters(user_id, |account| match kind {
            ContentKind::Joke => account.jokes_approved += 1,
            ContentKind::Meme => account.memes_approved += 1,
        })
        .await
    }

    /// Counter-only bookkeeping: the user reacted to some content
    pub async fn record_reaction_given(&self, user_id: &str) -> EngineResult<()> {
        self.update_counters(user_id, |account| account.reactions_given += 1)
            .await
    }

    /// Record a decided duel on both authors' counters as one atomic unit
    pub async fn record_duel_result(&self, winner_id: &str, loser_id: &str) -> EngineResult<()> {
        let now = Utc::now();
        let mut accounts = self.accounts.write().await;

        let mut winner = self.load_or_create(&mut accounts, winner_id).await?;
        let mut loser = self.load_or_create(&mut accounts, loser_id).await?;

        winner.duels_won += 1;
        winner.updated_at = now;
        loser.duels_lost += 1;
        loser.updated_at = now;

        if let Some(ref db) = self.db {
            db.users()
                .upsert_account(&winner)
                .await
                .map_err(EngineError::Storage)?;
            db.users()
                .upsert_account(&loser)
                .await
                .map_err(EngineError::Storage)?;
        }

        accounts.insert(winner_id.to_string(), winner);
        accounts.insert(loser_id.to_string(), loser);
        Ok(())
    }

    /// The user's award history, oldest first
    pub async fn history(&self, user_id: &str) -> Vec<LedgerEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Top accounts by points. Ties break on user id so the order is stable.
    pub async fn leaderboard(&self, limit: usize) -> Vec<UserAccount> {
        let accounts = self.accounts.read().await;
        let mut ranked: Vec<UserAccount> = accounts.values().cloned().collect();
        ranked.sort_by(|a, b| b.points.cmp(&a.points).then(a.user_id.cmp(&b.user_id)));
        ranked.truncate(limit);
        ranked
    }

    /// Number of known accounts
    pub async fn total_users(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Sum of all point balances
    pub async fn points_in_circulation(&self) -> i64 {
        let accounts = self.accounts.read().await;
        accounts.values().map(|account| account.points).sum()
    }

    /// Read-modify-write on one account under the held write lock
    async fn update_counters<F>(&self, user_id: &str, apply: F) -> EngineResult<()>
    where
        F: FnOnce(&mut UserAccount),
    {
        let mut accounts = self.accounts.write().await;
        let mut account = self.load_or_create(&mut accounts, user_id).await?;

        apply(&mut account);
        account.updated_at = Utc::now();

        if let Some(ref db) = self.db {
            db.users()
                .upsert_account(&account)
                .await
                .map_err(EngineError::Storage)?;
        }

        accounts.insert(user_id.to_string(), account);
        Ok(())
    }

    /// Cache -> database -> fresh zero-balance account. Callers hold the
    /// write lock, so concurrent first-time interactions serialize here.
    async fn load_or_create(
        &self,
        accounts: &mut HashMap<String, UserAccount>,
        user_id: &str,
    ) -> EngineResult<UserAccount> {
        if let Some(account) = accounts.get(user_id) {
            return Ok(account.clone());
        }

        if let Some(ref db) = self.db {
            if let Some(account) = db
                .users()
                .load_account(user_id)
                .await
                .map_err(EngineError::Storage)?
            {
                accounts.insert(user_id.to_string(), account.clone());
                return Ok(account);
            }
        }

        Ok(UserAccount::new(
            user_id.to_string(),
            self.ranks.base_label().to_string(),
        ))
    }
}
