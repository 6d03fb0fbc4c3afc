//! Rating Repository - PostgreSQL operations for reaction events using sqlx
//!
//! Deliberately append-only: events are inserted and never updated, and
//! there is no uniqueness on (user_id, content_id) — repeated reactions are
//! permitted by policy.

use crate::content::RatingEvent;
use sqlx::PgPool;
use tracing::info;

pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the events table
    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing ratings schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ratings.events (
                id UUID PRIMARY KEY,
                user_id VARCHAR(255) NOT NULL,
                content_id BIGINT NOT NULL REFERENCES content.items(id),
                kind VARCHAR(16) NOT NULL,
                points_awarded BIGINT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create events table: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_content ON ratings.events(content_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create events index: {}", e))?;

        Ok(())
    }

    pub async fn insert_event(&self, event: &RatingEvent) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO ratings.events (id, user_id, content_id, kind, points_awarded, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(&event.user_id)
        .bind(event.content_id)
        .bind(event.kind.as_str())
        .bind(event.points_awarded)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert rating event: {}", e))?;

        Ok(())
    }
}
