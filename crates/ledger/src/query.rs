//! Lazy, restartable ledger queries.
//!
//! A query value only holds the filter. Each call to `iter()` starts a fresh
//! pass that reads the ledger one record at a time, so callers can stop early
//! without the ledger materialising the whole result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{DocumentId, DocumentKind, LocationId, ProductId, WarehouseId};

use crate::{MoveRecord, StockKey, StockLedger, StockLine};

/// Half-open timestamp range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockFilter {
    pub product: Option<ProductId>,
    pub location: Option<LocationId>,
    pub warehouse: Option<WarehouseId>,
}

impl StockFilter {
    pub fn matches(&self, line: &StockLine) -> bool {
        self.product.is_none_or(|p| p == line.product)
            && self.location.is_none_or(|l| l == line.location)
            && self.warehouse.is_none_or(|w| w == line.warehouse)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFilter {
    pub product: Option<ProductId>,
    pub location: Option<LocationId>,
    pub warehouse: Option<WarehouseId>,
    pub document: Option<DocumentId>,
    pub kind: Option<DocumentKind>,
    pub date_range: Option<DateRange>,
}

impl MoveFilter {
    pub fn matches(&self, record: &MoveRecord) -> bool {
        self.product.is_none_or(|p| p == record.product)
            && self.location.is_none_or(|l| record.touches(l))
            && self.warehouse.is_none_or(|w| w == record.warehouse)
            && self.document.is_none_or(|d| d == record.document.id)
            && self.kind.is_none_or(|k| k == record.document.kind)
            && self.date_range.is_none_or(|r| r.contains(record.timestamp))
    }
}

/// Stock lines matching a filter, ordered by (product, location).
#[derive(Debug, Clone, Copy)]
pub struct StockQuery<'a> {
    ledger: &'a StockLedger,
    filter: StockFilter,
}

impl<'a> StockQuery<'a> {
    pub(crate) fn new(ledger: &'a StockLedger, filter: StockFilter) -> Self {
        Self { ledger, filter }
    }

    pub fn filter(&self) -> &StockFilter {
        &self.filter
    }

    pub fn iter(&self) -> StockLines<'a> {
        StockLines {
            ledger: self.ledger,
            filter: self.filter,
            cursor: None,
        }
    }
}

impl<'a> IntoIterator for &StockQuery<'a> {
    type Item = StockLine;
    type IntoIter = StockLines<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
pub struct StockLines<'a> {
    ledger: &'a StockLedger,
    filter: StockFilter,
    cursor: Option<StockKey>,
}

impl Iterator for StockLines<'_> {
    type Item = StockLine;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.ledger.next_line_after(self.cursor, &self.filter)?;
        self.cursor = Some(line.key());
        Some(line)
    }
}

/// Move records matching a filter, in log order (timestamp ascending).
#[derive(Debug, Clone, Copy)]
pub struct MoveQuery<'a> {
    ledger: &'a StockLedger,
    filter: MoveFilter,
}

impl<'a> MoveQuery<'a> {
    pub(crate) fn new(ledger: &'a StockLedger, filter: MoveFilter) -> Self {
        Self { ledger, filter }
    }

    pub fn filter(&self) -> &MoveFilter {
        &self.filter
    }

    /// Start a pass. The pass ends at the log length observed now; moves
    /// appended while iterating belong to the next pass.
    pub fn iter(&self) -> Moves<'a> {
        Moves {
            ledger: self.ledger,
            filter: self.filter,
            next: 0,
            end: self.ledger.move_count(),
        }
    }
}

impl<'a> IntoIterator for &MoveQuery<'a> {
    type Item = MoveRecord;
    type IntoIter = Moves<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug)]
pub struct Moves<'a> {
    ledger: &'a StockLedger,
    filter: MoveFilter,
    next: usize,
    end: usize,
}

impl Iterator for Moves<'_> {
    type Item = MoveRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let index = self.next;
            self.next += 1;
            if let Some(record) = self.ledger.move_at(index) {
                if self.filter.matches(&record) {
                    return Some(record);
                }
            }
        }
        None
    }
}
