//! Per-variant line rules.
//!
//! Every variant shares the header and lifecycle; what differs is which
//! endpoints a line must carry and where its quantity comes from.

use stockflow_catalog::Catalog;
use stockflow_core::{DocumentKind, LocationId, StockError, StockResult, WarehouseId};
use stockflow_topology::Topology;

use crate::{DocumentLine, LineInput};

/// Validate caller lines for a document of `kind` scoped to `warehouse`.
///
/// Errors identify the offending line index.
pub fn validate_lines(
    kind: DocumentKind,
    warehouse: WarehouseId,
    inputs: &[LineInput],
    catalog: &Catalog,
    topology: &Topology,
) -> StockResult<Vec<DocumentLine>> {
    if inputs.is_empty() {
        return Err(StockError::validation("document needs at least one line"));
    }

    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| match kind {
            DocumentKind::Receipt => receipt_line(index, warehouse, input, catalog, topology),
            DocumentKind::Delivery => delivery_line(index, warehouse, input, catalog, topology),
            DocumentKind::InternalTransfer => {
                transfer_line(index, warehouse, input, catalog, topology)
            }
        })
        .collect()
}

fn receipt_line(
    index: usize,
    warehouse: WarehouseId,
    input: &LineInput,
    catalog: &Catalog,
    topology: &Topology,
) -> StockResult<DocumentLine> {
    let product = catalog.active_product(input.product)?;
    if input.from.is_some() {
        return Err(StockError::validation(format!(
            "line {index}: receipts have no source location"
        )));
    }

    let expected = product.expected_quantity;
    if let Some(quantity) = input.quantity {
        if quantity != expected {
            return Err(StockError::validation(format!(
                "line {index}: receipt quantity is read-only ({} expects {expected}, got {quantity})",
                product.sku
            )));
        }
    }
    if expected <= 0 {
        return Err(StockError::validation(format!(
            "line {index}: product {} has no expected receipt quantity",
            product.sku
        )));
    }

    // The destination may be chosen later, while the receipt is still Draft.
    if let Some(to) = input.to {
        in_warehouse(index, to, warehouse, topology)?;
    }

    Ok(DocumentLine {
        product: product.id,
        quantity: expected,
        from: None,
        to: input.to,
    })
}

fn delivery_line(
    index: usize,
    warehouse: WarehouseId,
    input: &LineInput,
    catalog: &Catalog,
    topology: &Topology,
) -> StockResult<DocumentLine> {
    let product = catalog.active_product(input.product)?;
    if input.to.is_some() {
        return Err(StockError::validation(format!(
            "line {index}: deliveries have no destination location"
        )));
    }
    let from = input.from.ok_or_else(|| {
        StockError::validation(format!("line {index}: delivery needs a source location"))
    })?;
    in_warehouse(index, from, warehouse, topology)?;

    Ok(DocumentLine {
        product: product.id,
        quantity: positive(index, input.quantity)?,
        from: Some(from),
        to: None,
    })
}

fn transfer_line(
    index: usize,
    warehouse: WarehouseId,
    input: &LineInput,
    catalog: &Catalog,
    topology: &Topology,
) -> StockResult<DocumentLine> {
    let product = catalog.active_product(input.product)?;
    let (from, to) = match (input.from, input.to) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(StockError::validation(format!(
                "line {index}: transfer needs both source and destination"
            )));
        }
    };
    if from == to {
        return Err(StockError::validation(format!(
            "line {index}: source and destination are the same location"
        )));
    }

    let from_wh = topology.warehouse_of(from).map_err(|e| e.at_line(index))?;
    let to_wh = topology.warehouse_of(to).map_err(|e| e.at_line(index))?;
    if from_wh != to_wh {
        return Err(StockError::CrossWarehouseTransfer {
            line: index,
            from: from_wh,
            to: to_wh,
        });
    }
    in_warehouse(index, from, warehouse, topology)?;

    Ok(DocumentLine {
        product: product.id,
        quantity: positive(index, input.quantity)?,
        from: Some(from),
        to: Some(to),
    })
}

fn in_warehouse(
    index: usize,
    location: LocationId,
    warehouse: WarehouseId,
    topology: &Topology,
) -> StockResult<()> {
    topology
        .location_in(location, warehouse)
        .map(|_| ())
        .map_err(|e| e.at_line(index))
}

fn positive(index: usize, quantity: Option<i64>) -> StockResult<i64> {
    match quantity {
        Some(q) if q > 0 => Ok(q),
        Some(q) => Err(StockError::validation(format!(
            "line {index}: quantity must be positive (got {q})"
        ))),
        None => Err(StockError::validation(format!("line {index}: quantity is required"))),
    }
}
