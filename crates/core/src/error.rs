//! Domain error model.
//!
//! The core never renders user-facing text: every variant carries structured
//! data (the offending key or document line) that caller layers map to
//! messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::DocumentStatus;
use crate::id::{LocationId, ProductId, WarehouseId};

/// Result type used across the workspace.
pub type StockResult<T> = Result<T, StockError>;

/// Why the access scope guard refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// Staff actor targeting a warehouse other than their bound one.
    OutOfScope,
    /// Operation reserved to the manager role.
    ManagerOnly,
}

/// Structured access denial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub kind: DenialKind,
    /// Warehouse the operation targeted, when there was one.
    pub target: Option<WarehouseId>,
    pub operation: String,
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match (self.kind, self.target) {
            (DenialKind::OutOfScope, Some(w)) => {
                write!(f, "{} outside bound warehouse (target {w})", self.operation)
            }
            (DenialKind::OutOfScope, None) => write!(f, "{} outside bound warehouse", self.operation),
            (DenialKind::ManagerOnly, _) => write!(f, "{} requires the manager role", self.operation),
        }
    }
}

/// Domain-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A debit would drive a (product, location) balance below zero.
    #[error(
        "insufficient stock for product {product} at {location}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: ProductId,
        location: LocationId,
        requested: i64,
        available: i64,
        /// Offending document line, when the posting came from a document.
        line: Option<usize>,
    },

    /// Location missing, or not part of the expected warehouse.
    #[error("invalid location {location}: {reason}")]
    InvalidLocation {
        location: LocationId,
        line: Option<usize>,
        reason: String,
    },

    /// Transfer endpoints resolve to different warehouses.
    #[error("line {line}: transfer from warehouse {from} to warehouse {to} crosses warehouses")]
    CrossWarehouseTransfer {
        line: usize,
        from: WarehouseId,
        to: WarehouseId,
    },

    /// Scope violation.
    #[error("access denied: {0}")]
    AccessDenied(Denial),

    /// Illegal state-machine move.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },

    /// Lock timeout or optimistic check failure; safe to retry the whole operation.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A value failed validation (malformed input, duplicate key, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Hard deletion refused because the ledger references the product.
    #[error("product {0} is referenced by the ledger; deactivate it instead")]
    ProductInUse(ProductId),
}

impl StockError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_location(location: LocationId, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location,
            line: None,
            reason: reason.into(),
        }
    }

    /// Transient failures: retrying after replenishment or backoff may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StockError::ConcurrencyConflict(_) | StockError::InsufficientStock { .. }
        )
    }

    /// The offending document line, when the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            StockError::InsufficientStock { line, .. } => *line,
            StockError::InvalidLocation { line, .. } => *line,
            StockError::CrossWarehouseTransfer { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Attach a document line index to line-addressable errors.
    pub fn at_line(self, index: usize) -> Self {
        match self {
            StockError::InsufficientStock {
                product,
                location,
                requested,
                available,
                ..
            } => StockError::InsufficientStock {
                product,
                location,
                requested,
                available,
                line: Some(index),
            },
            StockError::InvalidLocation {
                location, reason, ..
            } => StockError::InvalidLocation {
                location,
                line: Some(index),
                reason,
            },
            other => other,
        }
    }
}
