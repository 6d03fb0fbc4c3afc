//! Point Ledger and Rank Derivation
//!
//! Owns point accounting for every user: awards, activity counters, the
//! append-only audit trail, and the rank label derived from the configured
//! threshold table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────────┐     ┌─────────────┐
//! │ UserAccount │────►│ Ledger         │◄────│ LedgerEntry │
//! │ (points +   │     │ (orchestrator) │     │ (audit,     │
//! │  counters)  │     └────────────────┘     │  append-only)│
//! └─────────────┘             │              └─────────────┘
//!                             ▼
//!                      ┌────────────────┐
//!                      │ RankTable      │
//!                      │ (points→label) │
//!                      └────────────────┘
//! ```
//!
//! ## Accounting Model
//!
//! - Accounts are created lazily on first interaction and never deleted
//! - Awards are non-negative; the total is monotonic non-decreasing
//! - Every award appends a LedgerEntry; entries are never mutated
//! - Rank is a pure function of the point total over the threshold table

mod account;
mod manager;
mod rank;

pub use account::{LedgerEntry, UserAccount};
pub use manager::Ledger;
pub use rank::RankTable;
