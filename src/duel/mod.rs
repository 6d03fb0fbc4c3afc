//! Duel System
//!
//! A duel pits two approved content items against each other for a timed
//! public vote. Voters pick a side at most once per duel; when the window
//! closes the duel resolves through a status-guarded compare-and-set, so a
//! deadline sweep and an explicit resolve call can race without either
//! applying the side effects twice.
//!
//! ## State Machine
//!
//! ```text
//!            cast_vote (now < deadline, one per voter)
//!              ┌────┐
//!              ▼    │
//!           ┌─────────┐  resolve (deadline passed)  ┌───────────┐
//!           │ ACTIVE  │────────────────────────────►│ COMPLETED │
//!           └─────────┘                             └───────────┘
//!                │ cancel (admin, zero votes)
//!                ▼
//!           ┌───────────┐
//!           │ CANCELLED │
//!           └───────────┘
//! ```
//!
//! Both terminal states are final; repeated resolve calls are no-ops.

mod engine;
mod types;

pub use engine::{DuelCounts, DuelEngine};
pub use types::{Duel, DuelSide, DuelStatus, DuelVote};
