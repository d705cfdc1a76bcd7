use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use stockflow_core::{
    AggregateRoot, DocumentId, DocumentKind, DocumentStatus, ExpectedVersion, StockError,
    StockResult, WarehouseId,
};
use stockflow_ledger::StockKey;

use crate::Document;

/// Document listing filter. Every set field must match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub kind: Option<DocumentKind>,
    pub status: Option<DocumentStatus>,
    pub warehouse: Option<WarehouseId>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Document) -> bool {
        self.kind.is_none_or(|k| k == doc.kind())
            && self.status.is_none_or(|s| s == doc.status())
            && self.warehouse.is_none_or(|w| w == doc.warehouse())
    }
}

/// In-memory document store with optimistic versioning.
///
/// Every successful `save` bumps the stored version by one; a save whose
/// expectation no longer matches is rejected as a concurrency conflict.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: Document) -> StockResult<Document> {
        let mut documents = self.documents.write();
        if documents.contains_key(&doc.id_typed()) {
            return Err(StockError::conflict(format!(
                "document {} already exists",
                doc.id_typed()
            )));
        }
        documents.insert(doc.id_typed(), doc.clone());
        Ok(doc)
    }

    pub fn get(&self, id: DocumentId) -> StockResult<Document> {
        self.documents
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| StockError::not_found("document", id))
    }

    /// Replace the stored document, checking `expected` against the stored
    /// version. Returns the document at its new version.
    pub fn save(&self, mut doc: Document, expected: ExpectedVersion) -> StockResult<Document> {
        let mut documents = self.documents.write();
        let current = documents
            .get(&doc.id_typed())
            .ok_or_else(|| StockError::not_found("document", doc.id_typed()))?;
        if let Err(err) = expected.check(current.version()) {
            tracing::debug!(document = %doc.id_typed(), error = %err, "stale document save rejected");
            return Err(err);
        }

        doc.set_version(current.version());
        doc.bump_version();
        documents.insert(doc.id_typed(), doc.clone());
        Ok(doc)
    }

    /// Check `expected`, run `effect`, then store `doc`, all under the store's
    /// write lock. A stale version runs nothing; a failed effect stores
    /// nothing; a successful effect is always followed by the save.
    pub fn save_after<T>(
        &self,
        mut doc: Document,
        expected: ExpectedVersion,
        effect: impl FnOnce() -> StockResult<T>,
    ) -> StockResult<(Document, T)> {
        let mut documents = self.documents.write();
        let current = documents
            .get(&doc.id_typed())
            .ok_or_else(|| StockError::not_found("document", doc.id_typed()))?
            .version();
        if let Err(err) = expected.check(current) {
            tracing::debug!(document = %doc.id_typed(), error = %err, "stale document save rejected");
            return Err(err);
        }

        let output = effect()?;
        doc.set_version(current);
        doc.bump_version();
        documents.insert(doc.id_typed(), doc.clone());
        Ok((doc, output))
    }

    /// Matching documents, oldest first. `scope` restricts the result to one
    /// warehouse regardless of what the filter asks for.
    pub fn list(&self, filter: DocumentFilter, scope: Option<WarehouseId>) -> Vec<Document> {
        let mut out: Vec<Document> = self
            .documents
            .read()
            .values()
            .filter(|d| filter.matches(d))
            .filter(|d| scope.is_none_or(|w| w == d.warehouse()))
            .cloned()
            .collect();
        out.sort_by_key(|d| (d.created_at(), d.id_typed()));
        out
    }

    /// Waiting deliveries reading any of `keys`.
    pub fn waiting_deliveries_touching(&self, keys: &[StockKey]) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = self
            .documents
            .read()
            .values()
            .filter(|d| d.kind() == DocumentKind::Delivery && d.status() == DocumentStatus::Waiting)
            .filter(|d| d.touches_any(keys))
            .map(|d| d.id_typed())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}
