use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{ActorId, DocumentRef, LocationId, MoveId, ProductId, WarehouseId};

/// Ledger key: one product at one location.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub product: ProductId,
    pub location: LocationId,
}

impl StockKey {
    pub fn new(product: ProductId, location: LocationId) -> Self {
        Self { product, location }
    }
}

/// Current quantity on hand for one product at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product: ProductId,
    pub location: LocationId,
    pub warehouse: WarehouseId,
    pub quantity: i64,
}

impl StockLine {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.product, self.location)
    }
}

/// Immutable move log entry.
///
/// `from == None` is a receipt credit, `to == None` a delivery debit, both
/// set a transfer posted as one typed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub id: MoveId,
    /// Position in the log (1-based, gap-free).
    pub sequence: u64,
    pub product: ProductId,
    pub from: Option<LocationId>,
    pub to: Option<LocationId>,
    pub warehouse: WarehouseId,
    /// Always positive.
    pub quantity: i64,
    pub document: DocumentRef,
    pub timestamp: DateTime<Utc>,
    pub actor: ActorId,
}

impl MoveRecord {
    /// Signed contribution of this move to `location`'s balance of its product.
    pub fn delta_for(&self, location: LocationId) -> i64 {
        let mut delta = 0;
        if self.to == Some(location) {
            delta += self.quantity;
        }
        if self.from == Some(location) {
            delta -= self.quantity;
        }
        delta
    }

    pub fn touches(&self, location: LocationId) -> bool {
        self.from == Some(location) || self.to == Some(location)
    }

    pub fn keys(&self) -> impl Iterator<Item = StockKey> + '_ {
        self.from
            .into_iter()
            .chain(self.to)
            .map(|location| StockKey::new(self.product, location))
    }
}

/// A requested posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub product: ProductId,
    pub from: Option<LocationId>,
    pub to: Option<LocationId>,
    pub quantity: i64,
    /// Warehouse context both endpoints must belong to.
    pub warehouse: WarehouseId,
    pub document: DocumentRef,
    pub actor: ActorId,
}

impl MoveRequest {
    pub fn keys(&self) -> impl Iterator<Item = StockKey> + '_ {
        self.from
            .into_iter()
            .chain(self.to)
            .map(|location| StockKey::new(self.product, location))
    }
}
