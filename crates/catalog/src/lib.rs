//! Catalog: products, categories and reorder rules.
//!
//! Master data handed to the ledger and the document workflow. Role checks
//! happen in the engine; this crate only keeps the records consistent
//! (unique SKUs, non-negative thresholds, soft deletion).

pub mod catalog;
pub mod product;
pub mod reorder;

pub use catalog::Catalog;
pub use product::{Category, NewProduct, Product, ProductUpdate};
pub use reorder::ReorderRule;
