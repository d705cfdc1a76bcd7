//! Movement documents: receipts, deliveries and internal transfers sharing
//! one status lifecycle.
//!
//! - `document`: the aggregate and its inputs
//! - `lines`: per-variant line validation
//! - `workflow`: the pure state machine (no IO, no ledger writes)
//! - `store`: versioned in-memory document store

pub mod document;
pub mod lines;
pub mod store;
pub mod workflow;

pub use document::{Document, DocumentEdit, DocumentLine, LineInput, NewDocument};
pub use lines::validate_lines;
pub use store::{DocumentFilter, DocumentStore};
pub use workflow::{
    Availability, Plan, advance, due_for_auto_validation, edit, plan_transition, postings,
    reevaluate, shortfall,
};
