//! `stockflow-engine`: the entry point the surrounding application calls.
//!
//! [`StockEngine`] wires catalog, topology, ledger and document store
//! together and runs every read and write through the access scope guard
//! before touching data.

pub mod config;
pub mod engine;
pub mod report;
pub mod seed;

pub use config::EngineConfig;
pub use engine::StockEngine;
pub use report::{LowStockAlert, ReorderSuggestion};
