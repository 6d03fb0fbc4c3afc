//! Database Connection Pool using sqlx

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::database::audit::AuditRepository;
use crate::database::content::ContentRepository;
use crate::database::duels::DuelRepository;
use crate::database::ratings::RatingRepository;
use crate::database::users::UserRepository;

pub struct DatabasePool {
    pool: PgPool,
    users: UserRepository,
    content: ContentRepository,
    duels: DuelRepository,
    ratings: RatingRepository,
    audit: AuditRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str) -> Result<Self, String> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(connection_string)
            .await
            .map_err(|e| format!("Failed to connect to PostgreSQL: {}", e))?;

        info!("Connected to PostgreSQL");

        let users = UserRepository::new(pool.clone());
        let content = ContentRepository::new(pool.clone());
        let duels = DuelRepository::new(pool.clone());
        let ratings = RatingRepository::new(pool.clone());
        let audit = AuditRepository::new(pool.clone());

        Ok(Self {
            pool,
            users,
            content,
            duels,
            ratings,
            audit,
        })
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing database schema...");

        for schema in ["accounts", "content", "duels", "ratings", "admin"] {
            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
                .execute(&self.pool)
                .await
                .map_err(|e| format!("Failed to create {} schema: {}", schema, e))?;
        }

        self.users.init_schema().await?;
        self.content.init_schema().await?;
        self.duels.init_schema().await?;
        self.ratings.init_schema().await?;
        self.audit.init_schema().await?;

        info!("Database schema initialized");
        Ok(())
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn content(&self) -> &ContentRepository {
        &self.content
    }

    pub fn duels(&self) -> &DuelRepository {
        &self.duels
    }

    pub fn ratings(&self) -> &RatingRepository {
        &self.ratings
    }

    pub fn audit(&self) -> &AuditRepository {
        &self.audit
    }
}
