//! Banter Arena
//!
//! Community content-engagement engine: users submit short humorous items,
//! moderators approve or reject them, other users react and vote, and a
//! pairwise "duel" mechanism pits two approved items against each other for
//! timed public voting. A points/rank economy rewards participation.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Engine error taxonomy
//! ├── ledger/        - Points, ranks, and the award audit trail
//! │   ├── account.rs - User accounts and ledger entries
//! │   ├── rank.rs    - Points -> label derivation
//! │   └── manager.rs - Award / balance / counter orchestrator
//! ├── content/       - Item lifecycle and engagement
//! │   ├── item.rs    - Content types and closed status enums
//! │   ├── store.rs   - Item store; the one-shot moderation gate
//! │   ├── moderation.rs - Moderator decisions and their side effects
//! │   └── rating.rs  - Reactions and the rating audit trail
//! ├── duel/          - Timed two-sided voting contests
//! │   ├── types.rs   - Duel, vote, and status types
//! │   └── engine.rs  - Initiate / vote / resolve state machine
//! ├── audit.rs       - Administrative action audit log
//! ├── stats.rs       - Read-only aggregate reporting
//! ├── api/           - HTTP API endpoints
//! │   ├── content.rs - Submission, moderation, reactions
//! │   ├── duel.rs    - Duel lifecycle endpoints
//! │   ├── user.rs    - Balance, history, leaderboard
//! │   └── stats.rs   - Snapshot and admin audit endpoints
//! └── database/      - PostgreSQL persistence
//!     ├── pool.rs    - Connection pool and schema init
//!     ├── users.rs   - Accounts and ledger entries
//!     ├── content.rs - Content items
//!     ├── duels.rs   - Duels and votes (UNIQUE(duel_id, voter_id))
//!     ├── ratings.rs - Reaction events
//!     └── audit.rs   - Admin actions
//! ```

pub mod api;
pub mod audit;
pub mod config;
pub mod content;
pub mod database;
pub mod duel;
pub mod error;
pub mod ledger;
pub mod stats;

// Re-export main types for convenience
pub use audit::{AdminAction, AdminActionKind, AuditLog};
pub use config::EngineConfig;
pub use content::{
    ContentItem, ContentKind, ContentStatus, ContentStore, ModerationEngine, ModerationOutcome,
    RatingEngine, RatingEvent, ReactionKind,
};
pub use database::DatabasePool;
pub use duel::{Duel, DuelEngine, DuelSide, DuelStatus, DuelVote};
pub use error::{EngineError, EngineResult};
pub use ledger::{Ledger, LedgerEntry, UserAccount};
pub use stats::{EngineStats, StatsCollector};
