//! Audit Repository - PostgreSQL operations for administrative actions using sqlx

use crate::audit::AdminAction;
use sqlx::PgPool;
use tracing::info;

pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the actions table
    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing admin schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admin.actions (
                id UUID PRIMARY KEY,
                actor_id VARCHAR(255) NOT NULL,
                action VARCHAR(32) NOT NULL,
                target VARCHAR(255) NOT NULL,
                comment TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create actions table: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_actions_actor ON admin.actions(actor_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create actions index: {}", e))?;

        Ok(())
    }

    pub async fn insert_action(&self, action: &AdminAction) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO admin.actions (id, actor_id, action, target, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(action.id)
        .bind(&action.actor_id)
        .bind(action.action.as_str())
        .bind(&action.target)
        .bind(&action.comment)
        .bind(action.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to insert admin action: {}", e))?;

        Ok(())
    }
}
