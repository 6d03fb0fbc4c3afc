//! PostgreSQL Database Module
//!
//! Provides durable storage for accounts, content, duels, ratings, and the
//! admin audit trail. In-memory engine state stays authoritative for
//! invariants; these repositories give durability and restart recovery.

pub mod audit;
pub mod content;
pub mod duels;
pub mod pool;
pub mod ratings;
pub mod users;

pub use audit::AuditRepository;
pub use content::ContentRepository;
pub use duels::DuelRepository;
pub use pool::DatabasePool;
pub use ratings::RatingRepository;
pub use users::UserRepository;
