use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{
    ActorId, AggregateRoot, DocumentId, DocumentKind, DocumentRef, DocumentStatus, LocationId,
    ProductId, WarehouseId,
};
use stockflow_ledger::StockKey;

/// Validated document line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub product: ProductId,
    pub quantity: i64,
    pub from: Option<LocationId>,
    pub to: Option<LocationId>,
}

/// Line as submitted by the caller. Receipts leave `quantity` empty: it is
/// taken from the product's expected quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub product: ProductId,
    pub quantity: Option<i64>,
    pub from: Option<LocationId>,
    pub to: Option<LocationId>,
}

impl LineInput {
    pub fn receipt(product: ProductId, to: LocationId) -> Self {
        Self {
            product,
            quantity: None,
            from: None,
            to: Some(to),
        }
    }

    pub fn delivery(product: ProductId, from: LocationId, quantity: i64) -> Self {
        Self {
            product,
            quantity: Some(quantity),
            from: Some(from),
            to: None,
        }
    }

    pub fn transfer(product: ProductId, from: LocationId, to: LocationId, quantity: i64) -> Self {
        Self {
            product,
            quantity: Some(quantity),
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Input for document creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub warehouse: WarehouseId,
    pub lines: Vec<LineInput>,
    pub scheduled_date: Option<NaiveDate>,
    pub reference: String,
    /// Vendor for receipts, customer for deliveries.
    pub contact: String,
    pub address: String,
}

impl NewDocument {
    pub fn new(kind: DocumentKind, warehouse: WarehouseId, lines: Vec<LineInput>) -> Self {
        Self {
            kind,
            warehouse,
            lines,
            scheduled_date: None,
            reference: String::new(),
            contact: String::new(),
            address: String::new(),
        }
    }

    pub fn scheduled(mut self, date: NaiveDate) -> Self {
        self.scheduled_date = Some(date);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }
}

/// Draft-only edit. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEdit {
    pub lines: Option<Vec<LineInput>>,
    /// `Some(None)` clears the scheduled date.
    pub scheduled_date: Option<Option<NaiveDate>>,
    pub reference: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
}

/// Aggregate root: Document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    kind: DocumentKind,
    warehouse: WarehouseId,
    lines: Vec<DocumentLine>,
    status: DocumentStatus,
    scheduled_date: Option<NaiveDate>,
    reference: String,
    contact: String,
    address: String,
    created_by: ActorId,
    created_at: DateTime<Utc>,
    validated_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Document {
    /// Build a Draft document from already validated lines.
    pub fn draft(
        new: NewDocument,
        lines: Vec<DocumentLine>,
        created_by: ActorId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            kind: new.kind,
            warehouse: new.warehouse,
            lines,
            status: DocumentStatus::Draft,
            scheduled_date: new.scheduled_date,
            reference: new.reference.trim().to_string(),
            contact: new.contact.trim().to_string(),
            address: new.address.trim().to_string(),
            created_by,
            created_at,
            validated_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> DocumentId {
        self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn warehouse(&self) -> WarehouseId {
        self.warehouse
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn scheduled_date(&self) -> Option<NaiveDate> {
        self.scheduled_date
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn created_by(&self) -> ActorId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn validated_at(&self) -> Option<DateTime<Utc>> {
        self.validated_at
    }

    /// Provenance stamped on the moves this document posts.
    pub fn doc_ref(&self) -> DocumentRef {
        DocumentRef::new(self.id, self.kind)
    }

    /// Lines (and every header field) are mutable only while Draft.
    pub fn is_editable(&self) -> bool {
        self.status == DocumentStatus::Draft
    }

    /// Ledger keys this document reads or writes.
    pub fn keys(&self) -> impl Iterator<Item = StockKey> + '_ {
        self.lines.iter().flat_map(|line| {
            line.from
                .into_iter()
                .chain(line.to)
                .map(move |location| StockKey::new(line.product, location))
        })
    }

    pub fn touches_any(&self, keys: &[StockKey]) -> bool {
        self.keys().any(|k| keys.contains(&k))
    }

    pub(crate) fn set_status(&mut self, status: DocumentStatus, at: DateTime<Utc>) {
        self.status = status;
        if status == DocumentStatus::Done {
            self.validated_at = Some(at);
        }
    }

    pub(crate) fn apply_edit(&mut self, edit: DocumentEdit, lines: Option<Vec<DocumentLine>>) {
        if let Some(lines) = lines {
            self.lines = lines;
        }
        if let Some(date) = edit.scheduled_date {
            self.scheduled_date = date;
        }
        if let Some(reference) = edit.reference {
            self.reference = reference.trim().to_string();
        }
        if let Some(contact) = edit.contact {
            self.contact = contact.trim().to_string();
        }
        if let Some(address) = edit.address {
            self.address = address.trim().to_string();
        }
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for Document {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
