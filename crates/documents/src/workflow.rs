//! Document state machine.
//!
//! Pure functions over a [`Document`] and a read-only view of availability.
//! Nothing here writes to the ledger: a transition that must move stock comes
//! back as [`Plan::Post`] and the caller posts the batch before persisting the
//! new status.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use stockflow_core::{
    ActorId, DocumentKind, DocumentStatus, LocationId, ProductId, StockError, StockResult,
};
use stockflow_ledger::{MoveRequest, StockKey, StockLedger};

use crate::{Document, DocumentEdit, DocumentLine};

/// Read-only view of on-hand quantities.
pub trait Availability {
    fn available(&self, product: ProductId, location: LocationId) -> i64;
}

impl Availability for StockLedger {
    fn available(&self, product: ProductId, location: LocationId) -> i64 {
        self.get_quantity(product, location)
    }
}

impl Availability for HashMap<StockKey, i64> {
    fn available(&self, product: ProductId, location: LocationId) -> i64 {
        self.get(&StockKey::new(product, location)).copied().unwrap_or(0)
    }
}

/// Outcome of planning a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Status-only change; the ledger is untouched.
    Status(DocumentStatus),
    /// Post the document's moves as one batch, then mark it Done.
    Post,
}

impl Plan {
    pub fn target(&self) -> DocumentStatus {
        match self {
            Plan::Status(status) => *status,
            Plan::Post => DocumentStatus::Done,
        }
    }
}

/// First line whose debit cannot be covered, counting earlier lines on the
/// same (product, location) cumulatively.
pub fn shortfall(doc: &Document, avail: &(impl Availability + ?Sized)) -> Option<StockError> {
    let mut requested: HashMap<StockKey, i64> = HashMap::new();
    for (index, line) in doc.lines().iter().enumerate() {
        let Some(from) = line.from else { continue };
        let total = requested.entry(StockKey::new(line.product, from)).or_insert(0);
        let Some(sum) = total.checked_add(line.quantity) else {
            return Some(StockError::validation(format!(
                "line {index}: requested quantity overflows"
            )));
        };
        *total = sum;
        let available = avail.available(line.product, from);
        if sum > available {
            return Some(StockError::InsufficientStock {
                product: line.product,
                location: from,
                requested: sum,
                available,
                line: Some(index),
            });
        }
    }
    None
}

/// Promotion a waiting delivery is due, if any. Never demotes and never posts.
pub fn reevaluate(doc: &Document, avail: &(impl Availability + ?Sized)) -> Option<DocumentStatus> {
    let waiting = doc.kind() == DocumentKind::Delivery && doc.status() == DocumentStatus::Waiting;
    (waiting && shortfall(doc, avail).is_none()).then_some(DocumentStatus::Ready)
}

/// Decide what moving `doc` to `target` means.
pub fn plan_transition(
    doc: &Document,
    target: DocumentStatus,
    avail: &(impl Availability + ?Sized),
) -> StockResult<Plan> {
    use DocumentKind::*;
    use DocumentStatus::*;

    let from = doc.status();
    let invalid = || StockError::InvalidTransition { from, to: target };

    if from.is_terminal() || from == target {
        return Err(invalid());
    }

    match (doc.kind(), from, target) {
        (_, Draft, Cancelled) => Ok(Plan::Status(Cancelled)),
        (Delivery, Waiting | Ready, Cancelled) => Ok(Plan::Status(Cancelled)),

        (Receipt, Draft, Done) => {
            if let Some(index) = doc.lines().iter().position(|l| l.to.is_none()) {
                return Err(StockError::validation(format!(
                    "line {index}: receipt needs a destination location before validation"
                )));
            }
            Ok(Plan::Post)
        }

        // Confirmation: the outcome depends on stock, not on what was asked.
        (Delivery, Draft, Waiting | Ready) => Ok(Plan::Status(match shortfall(doc, avail) {
            Some(_) => Waiting,
            None => Ready,
        })),
        (Delivery, Waiting, Ready) => match shortfall(doc, avail) {
            Some(err) => Err(err),
            None => Ok(Plan::Status(Ready)),
        },
        (Delivery, Ready, Done) => match shortfall(doc, avail) {
            Some(err) => Err(err),
            None => Ok(Plan::Post),
        },

        (InternalTransfer, Draft, Done) => Ok(Plan::Post),

        _ => Err(invalid()),
    }
}

/// Ledger requests for every line of `doc`, attributed to `actor`.
pub fn postings(doc: &Document, actor: ActorId) -> Vec<MoveRequest> {
    let document = doc.doc_ref();
    doc.lines()
        .iter()
        .map(|line| MoveRequest {
            product: line.product,
            from: line.from,
            to: line.to,
            quantity: line.quantity,
            warehouse: doc.warehouse(),
            document,
            actor,
        })
        .collect()
}

/// Draft transfers validate themselves once their scheduled date arrives.
pub fn due_for_auto_validation(doc: &Document, today: NaiveDate) -> bool {
    doc.kind() == DocumentKind::InternalTransfer
        && doc.status() == DocumentStatus::Draft
        && doc.scheduled_date().is_some_and(|date| date <= today)
}

/// Copy of `doc` moved to `status`.
pub fn advance(doc: &Document, status: DocumentStatus, at: DateTime<Utc>) -> Document {
    let mut next = doc.clone();
    next.set_status(status, at);
    next
}

/// Copy of `doc` with `edit` applied. `lines` are the already validated
/// replacements for `edit.lines`.
pub fn edit(
    doc: &Document,
    edit: DocumentEdit,
    lines: Option<Vec<DocumentLine>>,
) -> StockResult<Document> {
    if !doc.is_editable() {
        return Err(StockError::validation(format!(
            "document {} is {} and can no longer be edited",
            doc.id_typed(),
            doc.status()
        )));
    }
    if edit.lines.is_some() != lines.is_some() {
        return Err(StockError::validation("edited lines were not validated"));
    }
    let mut next = doc.clone();
    next.apply_edit(edit, lines);
    Ok(next)
}
