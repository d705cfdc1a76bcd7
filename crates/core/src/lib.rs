//! `stockflow-core`: shared building blocks for the stock ledger workspace.
//!
//! This crate holds identifiers, the domain error model, the time source and
//! the bounded key-lock table. No storage, no transport.

pub mod aggregate;
pub mod clock;
pub mod document;
pub mod error;
pub mod id;
pub mod lock;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use document::{DocumentKind, DocumentRef, DocumentStatus};
pub use error::{Denial, DenialKind, StockError, StockResult};
pub use id::{ActorId, CategoryId, DocumentId, LocationId, MoveId, ProductId, WarehouseId};
pub use lock::{KeyLockGuard, KeyLockTable, LockTimeout};
