//! Duel Repository - PostgreSQL operations for duels and votes using sqlx
//!
//! The votes table carries the system's core uniqueness constraint,
//! UNIQUE(duel_id, voter_id), and duel finalization is a status-guarded
//! UPDATE so storage can never record two resolutions.

use crate::duel::{Duel, DuelSide, DuelStatus, DuelVote};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

pub struct DuelRepository {
    pool: PgPool,
}

impl DuelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize duel and vote tables
    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing duels schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS duels.contests (
                id BIGINT PRIMARY KEY,
                initiator_id VARCHAR(255) NOT NULL,
                opponent_id VARCHAR(255) NOT NULL,
                initiator_content_id BIGINT NOT NULL REFERENCES content.items(id),
                opponent_content_id BIGINT NOT NULL REFERENCES content.items(id),
                status VARCHAR(16) NOT NULL,
                initiator_votes INTEGER NOT NULL DEFAULT 0,
                opponent_votes INTEGER NOT NULL DEFAULT 0,
                total_votes INTEGER NOT NULL DEFAULT 0,
                voting_ends_at TIMESTAMP WITH TIME ZONE NOT NULL,
                winner_id VARCHAR(255),
                public BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                completed_at TIMESTAMP WITH TIME ZONE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create contests table: {}", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS duels.votes (
                id BIGSERIAL PRIMARY KEY,
                duel_id BIGINT NOT NULL REFERENCES duels.contests(id),
                voter_id VARCHAR(255) NOT NULL,
                side VARCHAR(16) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                UNIQUE(duel_id, voter_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create votes table: {}", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_contests_status_deadline ON duels.contests(status, voting_ends_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create contests index: {}", e))?;

        Ok(())
    }

    pub async fn upsert_duel(&self, duel: &Duel) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO duels.contests
            (id, initiator_id, opponent_id, initiator_content_id, opponent_content_id,
             status, initiator_votes, opponent_votes, total_votes, voting_ends_at,
             winner_id, public, created_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                initiator_votes = EXCLUDED.initiator_votes,
                opponent_votes = EXCLUDED.opponent_votes,
                total_votes = EXCLUDED.total_votes,
                winner_id = EXCLUDED.winner_id,
                completed_at = EXCLUDED.completed_at
            "#,
        )
        .bind(duel.id)
        .bind(&duel.initiator_id)
        .bind(&duel.opponent_id)
        .bind(duel.initiator_content_id)
        .bind(duel.opponent_content_id)
        .bind(duel.status.as_str())
        .bind(duel.initiator_votes as i32)
        .bind(duel.opponent_votes as i32)
        .bind(duel.total_votes as i32)
        .bind(duel.voting_ends_at)
        .bind(&duel.winner_id)
        .bind(duel.public)
        .bind(duel.created_at)
        .bind(duel.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to upsert duel: {}", e))?;

        Ok(())
    }

    /// Insert a vote under the (duel_id, voter_id) uniqueness constraint.
    /// Returns false when the voter already has a vote recorded.
    pub async fn insert_vote(&self, vote: &DuelVote) -> Result<bool, String> {
        let result = sqlx::query(
            r#"
            INSERT INTO duels.votes (duel_id, voter_id, side, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (duel_id, voter_id) DO NOTHING
            "#,
        )
        .bind(vote.duel_id)
        .bind(&vote.voter_id)
        .bind(vote.side.as_str())
        .bind(vote.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert vote: {}", e))?;

        Ok(result.rows_affected() == 1)
    }

    /// Status-guarded finalization: only an ACTIVE row transitions. Returns
    /// false when another resolver already finalized the duel.
    pub async fn finalize_duel(&self, duel: &Duel) -> Result<bool, String> {
        let result = sqlx::query(
            r#"
            UPDATE duels.contests
            SET status = $2,
                initiator_votes = $3,
                opponent_votes = $4,
                total_votes = $5,
                winner_id = $6,
                completed_at = $7
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(duel.id)
        .bind(duel.status.as_str())
        .bind(duel.initiator_votes as i32)
        .bind(duel.opponent_votes as i32)
        .bind(duel.total_votes as i32)
        .bind(&duel.winner_id)
        .bind(duel.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to finalize duel: {}", e))?;

        let applied = result.rows_affected() == 1;
        debug!(duel_id = duel.id, applied, "Duel finalization persisted");
        Ok(applied)
    }

    pub async fn load_duel(&self, duel_id: i64) -> Result<Option<Duel>, String> {
        let row = sqlx::query(
            r#"
            SELECT id, initiator_id, opponent_id, initiator_content_id, opponent_content_id,
                   status, initiator_votes, opponent_votes, total_votes, voting_ends_at,
                   winner_id, public, created_at, completed_at
            FROM duels.contests
            WHERE id = $1
            "#,
        )
        .bind(duel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to load duel: {}", e))?;

        match row {
            Some(row) => {
                let status_raw: String = row.get("status");
                let status = DuelStatus::parse(&status_raw)
                    .ok_or_else(|| format!("Unknown duel status in storage: {}", status_raw))?;

                Ok(Some(Duel {
                    id: row.get("id"),
                    initiator_id: row.get("initiator_id"),
                    opponent_id: row.get("opponent_id"),
                    initiator_content_id: row.get("initiator_content_id"),
                    opponent_content_id: row.get("opponent_content_id"),
                    status,
                    initiator_votes: row.get::<i32, _>("initiator_votes") as u32,
                    opponent_votes: row.get::<i32, _>("opponent_votes") as u32,
                    total_votes: row.get::<i32, _>("total_votes") as u32,
                    voting_ends_at: row.get("voting_ends_at"),
                    winner_id: row.get("winner_id"),
                    public: row.get("public"),
                    created_at: row.get("created_at"),
                    completed_at: row.get("completed_at"),
                }))
            }
            None => Ok(None),
        }
    }

    /// Votes recorded for one duel, oldest first
    pub async fn load_votes(&self, duel_id: i64) -> Result<Vec<DuelVote>, String> {
        let rows = sqlx::query(
            r#"
            SELECT duel_id, voter_id, side, created_at
            FROM duels.votes
            WHERE duel_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(duel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| format!("Failed to load votes: {}", e))?;

        rows.into_iter()
            .map(|row| {
                let side_raw: String = row.get("side");
                let side = DuelSide::parse(&side_raw)
                    .ok_or_else(|| format!("Unknown vote side in storage: {}", side_raw))?;
                Ok(DuelVote {
                    duel_id: row.get("duel_id"),
                    voter_id: row.get("voter_id"),
                    side,
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }

    pub async fn max_duel_id(&self) -> Result<i64, String> {
        let row = sqlx::query("SELECT COALESCE(MAX(id), 0) AS max_id FROM duels.contests")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| format!("Failed to read max duel id: {}", e))?;

        Ok(row.get("max_id"))
    }
}
