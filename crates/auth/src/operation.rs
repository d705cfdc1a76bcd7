use serde::{Deserialize, Serialize};

use stockflow_core::DocumentKind;

/// Operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ReadStock,
    ReadMoves,
    ReadDocuments,
    CreateDocument(DocumentKind),
    EditDocument,
    TransitionDocument,
    /// Product/category/reorder-rule maintenance.
    ManageCatalog,
    /// Warehouse/location maintenance.
    ManageTopology,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ReadStock => "stock.read",
            Operation::ReadMoves => "moves.read",
            Operation::ReadDocuments => "documents.read",
            Operation::CreateDocument(DocumentKind::Receipt) => "documents.receipt.create",
            Operation::CreateDocument(DocumentKind::Delivery) => "documents.delivery.create",
            Operation::CreateDocument(DocumentKind::InternalTransfer) => {
                "documents.internal_transfer.create"
            }
            Operation::EditDocument => "documents.edit",
            Operation::TransitionDocument => "documents.transition",
            Operation::ManageCatalog => "catalog.manage",
            Operation::ManageTopology => "topology.manage",
        }
    }

    /// Master-data maintenance is never delegated to staff.
    pub fn is_manager_only(&self) -> bool {
        matches!(self, Operation::ManageCatalog | Operation::ManageTopology)
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
