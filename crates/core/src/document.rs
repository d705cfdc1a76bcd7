//! Document vocabulary shared by the ledger (move provenance) and the
//! document workflow.

use serde::{Deserialize, Serialize};

use crate::id::DocumentId;

/// Document variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Incoming goods from a vendor: pure credits.
    Receipt,
    /// Outgoing goods to a customer: pure debits.
    Delivery,
    /// Movement between two locations of the same warehouse.
    InternalTransfer,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Receipt => "receipt",
            DocumentKind::Delivery => "delivery",
            DocumentKind::InternalTransfer => "internal_transfer",
        }
    }
}

impl core::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Draft,
    Waiting,
    Ready,
    Done,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Waiting => "waiting",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Done => "done",
            DocumentStatus::Cancelled => "cancelled",
        }
    }

    /// `Done` and `Cancelled` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Done | DocumentStatus::Cancelled)
    }
}

impl core::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance of a move: which document posted it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: DocumentId,
    pub kind: DocumentKind,
}

impl DocumentRef {
    pub fn new(id: DocumentId, kind: DocumentKind) -> Self {
        Self { id, kind }
    }
}
