//! Stock ledger: quantity on hand per (product, location) plus the
//! append-only move log that explains it.
//!
//! Balances are never written directly. Every change goes through a posting,
//! which validates, locks the affected keys, checks non-negativity against the
//! committed balance, and then applies balance updates and move records
//! together.

pub mod ledger;
pub mod query;
pub mod record;

pub use ledger::{LedgerConfig, StockLedger};
pub use query::{DateRange, MoveFilter, MoveQuery, Moves, StockFilter, StockLines, StockQuery};
pub use record::{MoveRecord, MoveRequest, StockKey, StockLine};
