//! Administrative Action Audit Log
//!
//! Append-only record of moderator and administrative operations. The core
//! only ever writes here; readers are reporting endpoints.

use crate::database::DatabasePool;
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Kinds of audited administrative operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionKind {
    ContentApproved,
    ContentRejected,
    DuelCancelled,
}

impl AdminActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminActionKind::ContentApproved => "content_approved",
            AdminActionKind::ContentRejected => "content_rejected",
            AdminActionKind::DuelCancelled => "duel_cancelled",
        }
    }
}

/// One audited administrative operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAction {
    pub id: Uuid,
    /// Moderator or administrator who acted
    pub actor_id: String,
    pub action: AdminActionKind,
    /// What was acted on ("content:17", "duel:4")
    pub target: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AdminAction {
    pub fn new(actor_id: &str, action: AdminActionKind, target: String, comment: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: actor_id.to_string(),
            action,
            target,
            comment,
            created_at: Utc::now(),
        }
    }
}

/// In-memory audit buffer with optional persistence
pub struct AuditLog {
    db: Option<Arc<DatabasePool>>,
    actions: RwLock<VecDeque<AdminAction>>,
    max_entries: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            db: None,
            actions: RwLock::new(VecDeque::new()),
            max_entries: 100_000,
        }
    }

    pub fn with_database(mut self, db: Arc<DatabasePool>) -> Self {
        self.db = Some(db);
        self
    }

    /// Append an action. The in-memory buffer keeps the most recent
    /// `max_entries`; the database keeps everything.
    pub async fn record(&self, action: AdminAction) -> EngineResult<()> {
        if let Some(ref db) = self.db {
            db.audit()
                .insert_action(&action)
                .await
                .map_err(EngineError::Storage)?;
        }

        tracing::info!(
            actor_id = %action.actor_id,
            action = action.action.as_str(),
            target = %action.target,
            "Admin action recorded"
        );

        let mut actions = self.actions.write().await;
        if actions.len() >= self.max_entries {
            actions.pop_front();
        }
        actions.push_back(action);
        Ok(())
    }

    /// Most recent actions, newest first
    pub async fn recent(&self, limit: usize) -> Vec<AdminAction> {
        let actions = self.actions.read().await;
        actions.iter().rev().take(limit).cloned().collect()
    }
}
