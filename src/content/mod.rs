//! Content Lifecycle and Engagement
//!
//! Submitted items enter PENDING, a moderator decides them exactly once,
//! and only APPROVED items accrue public engagement. The one-shot status
//! transition lives in `ContentStore`; `ModerationEngine` and
//! `RatingEngine` layer decisions and reactions on top of it.
//!
//! ```text
//! ┌────────────┐   decide    ┌──────────────────┐
//! │ ContentItem│◄────────────│ ModerationEngine │──► Ledger award
//! │ (PENDING)  │             └──────────────────┘    + AdminAction
//! └────────────┘   react     ┌──────────────────┐
//!       ▲   ◄─────────────── │ RatingEngine     │──► Ledger award
//!       │                    └──────────────────┘    + RatingEvent
//! ┌────────────┐
//! │ ContentStore│  owns items, counters, and the PENDING→decided gate
//! └────────────┘
//! ```

mod item;
mod moderation;
mod rating;
mod store;

pub use item::{ContentItem, ContentKind, ContentStatus};
pub use moderation::{ModerationEngine, ModerationOutcome};
pub use rating::{RatingEngine, RatingEvent, ReactionKind};
pub use store::{ContentCounts, ContentStore};
