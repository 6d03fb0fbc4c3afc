//! Content Repository - PostgreSQL operations for submitted items using sqlx

use crate::content::{ContentItem, ContentKind, ContentStatus};
use sqlx::{PgPool, Row};
use tracing::info;

pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize the items table
    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing content schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS content.items (
                id BIGINT PRIMARY KEY,
                kind VARCHAR(16) NOT NULL,
                body TEXT NOT NULL,
                status VARCHAR(16) NOT NULL,
                author_id VARCHAR(255) NOT NULL,
                moderator_id VARCHAR(255),
                moderator_comment TEXT,
                views BIGINT NOT NULL DEFAULT 0,
                likes BIGINT NOT NULL DEFAULT 0,
                dislikes BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
                moderated_at TIMESTAMP WITH TIME ZONE
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create items table: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_status ON content.items(status)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create items status index: {}", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_author ON content.items(author_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create items author index: {}", e))?;

        Ok(())
    }

    pub async fn upsert_item(&self, item: &ContentItem) -> Result<(), String> {
        sqlx::query(
            r#"
            INSERT INTO content.items
            (id, kind, body, status, author_id, moderator_id, moderator_comment,
             views, likes, dislikes, created_at, moderated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                moderator_id = EXCLUDED.moderator_id,
                moderator_comment = EXCLUDED.moderator_comment,
                views = EXCLUDED.views,
                likes = EXCLUDED.likes,
                dislikes = EXCLUDED.dislikes,
                moderated_at = EXCLUDED.moderated_at
            "#,
        )
        .bind(item.id)
        .bind(item.kind.as_str())
        .bind(&item.body)
        .bind(item.status.as_str())
        .bind(&item.author_id)
        .bind(&item.moderator_id)
        .bind(&item.moderator_comment)
        .bind(item.views as i64)
        .bind(item.likes as i64)
        .bind(item.dislikes as i64)
        .bind(item.created_at)
        .bind(item.moderated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to upsert content item: {}", e))?;

        Ok(())
    }

    pub async fn load_item(&self, content_id: i64) -> Result<Option<ContentItem>, String> {
        let row = sqlx::query(
            r#"
            SELECT id, kind, body, status, author_id, moderator_id, moderator_comment,
                   views, likes, dislikes, created_at, moderated_at
            FROM content.items
            WHERE id = $1
            "#,
        )
        .bind(content_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to load content item: {}", e))?;

        match row {
            Some(row) => {
                let kind_raw: String = row.get("kind");
                let status_raw: String = row.get("status");
                let kind = ContentKind::parse(&kind_raw)
                    .ok_or_else(|| format!("Unknown content kind in storage: {}", kind_raw))?;
                let status = ContentStatus::parse(&status_raw)
                    .ok_or_else(|| format!("Unknown content status in storage: {}", status_raw))?;

                Ok(Some(ContentItem {
                    id: row.get("id"),
                    kind,
                    body: row.get("body"),
                    status,
                    author_id: row.get("author_id"),
                    moderator_id: row.get("moderator_id"),
                    moderator_comment: row.get("moderator_comment"),
                    views: row.get::<i64, _>("views") as u64,
                    likes: row.get::<i64, _>("likes") as u64,
                    dislikes: row.get::<i64, _>("dislikes") as u64,
                    created_at: row.get("created_at"),
                    moderated_at: row.get("moderated_at"),
                }))
            }
            None => Ok(None),
        }
    }

    pub async fn max_item_id(&self) -> Result<i64, String> {
        let row = sqlx::query("SELECT COALESCE(MAX(id), 0) AS max_id FROM content.items")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| format!("Failed to read max item id: {}", e))?;

        Ok(row.get("max_id"))
    }
}
