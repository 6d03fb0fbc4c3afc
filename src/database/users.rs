//! User Repository - PostgreSQL operations for accounts and ledger entries using sqlx

use crate::ledger::{LedgerEntry, UserAccount};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize account and ledger tables
    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing accounts schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts.users (
                user_id VARCHAR(255) PRIMARY KEY,
                points BIGINT NOT NULL DEFAULT 0,
                rank VARCHAR(64) NOT NULL,
                submissions BIGINT NOT NULL DEFAULT 0,
                jokes_approved BIGINT NOT NULL DEFAULT 0,
                memes_approved BIGINT NOT NULL DEFAULT 0,
                reactions_given BIGINT NOT NULL DEFAULT 0,
                duels_won BIGINT NOT NULL DEFAULT 0,
                duels_lost BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create users table: {}", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts.ledger (
                id UUID PRIMARY KEY,
                user_id VARCHAR(255) NOT NULL REFERENCES accounts.users(user_id),
                amount BIGINT NOT NULL,
                reason VARCHAR(64) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create ledger table: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_ledger_user ON accounts.ledger(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create ledger index: {}", e))?;

        Ok(())
    }

    pub async fn upsert_account(&self, account: &UserAccount) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO accounts.users
            (user_id, points, rank, submissions, jokes_approved, memes_approved,
             reactions_given, duels_won, duels_lost, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (user_id) DO UPDATE SET
                points = EXCLUDED.points,
                rank = EXCLUDED.rank,
                submissions = EXCLUDED.submissions,
                jokes_approved = EXCLUDED.jokes_approved,
                memes_approved = EXCLUDED.memes_approved,
                reactions_given = EXCLUDED.reactions_given,
                duels_won = EXCLUDED.duels_won,
                duels_lost = EXCLUDED.duels_lost,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&account.user_id)
        .bind(account.points)
        .bind(&account.rank)
        .bind(account.submissions as i64)
        .bind(account.jokes_approved as i64)
        .bind(account.memes_approved as i64)
        .bind(account.reactions_given as i64)
        .bind(account.duels_won as i64)
        .bind(account.duels_lost as i64)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to upsert account: {}", e))?;

        Ok(())
    }

    pub async fn load_account(&self, user_id: &str) -> Result<Option<UserAccount>, String> {
        let row = sqlx::query(
            r#"
            SELECT user_id, points, rank, submissions, jokes_approved, memes_approved,
                   reactions_given, duels_won, duels_lost, created_at, updated_at
            FROM accounts.users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to load account: {}", e))?;

        Ok(row.map(|row| UserAccount {
            user_id: row.get("user_id"),
            points: row.get("points"),
            rank: row.get("rank"),
            submissions: row.get::<i64, _>("submissions") as u64,
            jokes_approved: row.get::<i64, _>("jokes_approved") as u64,
            memes_approved: row.get::<i64, _>("memes_approved") as u64,
            reactions_given: row.get::<i64, _>("reactions_given") as u64,
            duels_won: row.get::<i64, _>("duels_won") as u64,
            duels_lost: row.get::<i64, _>("duels_lost") as u64,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    pub async fn insert_entry(&self, entry: &LedgerEntry) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO accounts.ledger (id, user_id, amount, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(entry.amount)
        .bind(&entry.reason)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert ledger entry: {}", e))?;

        debug!(user_id = %entry.user_id, amount = entry.amount, "Ledger entry persisted");
        Ok(())
    }
}
