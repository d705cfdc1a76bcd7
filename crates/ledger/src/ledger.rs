use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use stockflow_catalog::Catalog;
use stockflow_core::{
    Clock, DocumentId, DocumentRef, KeyLockTable, LocationId, MoveId, ProductId, StockError,
    StockResult, WarehouseId,
};
use stockflow_topology::Topology;

use crate::query::{MoveFilter, MoveQuery, StockFilter, StockQuery};
use crate::{MoveRecord, MoveRequest, StockKey, StockLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Upper bound on waiting for contended (product, location) keys.
    pub lock_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: BTreeMap<StockKey, StockLine>,
    moves: Vec<MoveRecord>,
    posted_documents: HashSet<DocumentId>,
    last_timestamp: Option<DateTime<Utc>>,
}

/// A request that passed structural validation.
struct ResolvedMove {
    request: MoveRequest,
    line: usize,
}

/// Authoritative stock ledger.
///
/// Concurrency: a posting first takes the key locks for every (product,
/// location) it touches, all at once and with a bounded wait. While those are
/// held no other posting can change the same balances, so the
/// read-check-write sequence is serialized per key. The state lock is only
/// held for the short read and the final apply.
pub struct StockLedger {
    catalog: Arc<Catalog>,
    topology: Arc<Topology>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
    locks: KeyLockTable<StockKey>,
    state: RwLock<LedgerState>,
}

impl core::fmt::Debug for StockLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockLedger")
            .field("config", &self.config)
            .field("moves", &self.move_count())
            .finish_non_exhaustive()
    }
}

impl StockLedger {
    pub fn new(
        catalog: Arc<Catalog>,
        topology: Arc<Topology>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            catalog,
            topology,
            clock,
            config,
            locks: KeyLockTable::new(),
            state: RwLock::new(LedgerState::default()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Post a single move.
    pub fn post_move(&self, request: MoveRequest) -> StockResult<MoveRecord> {
        let mut records = self.commit(vec![request], None)?;
        records
            .pop()
            .ok_or_else(|| StockError::validation("posting produced no record"))
    }

    /// Post every move of one document as a unit: either all records are
    /// appended and all balances updated, or nothing changes. A document can
    /// be posted only once.
    pub fn post_batch(
        &self,
        document: DocumentRef,
        requests: Vec<MoveRequest>,
    ) -> StockResult<Vec<MoveRecord>> {
        if requests.is_empty() {
            return Err(StockError::validation("document has no lines to post"));
        }
        if let Some(index) = requests.iter().position(|r| r.document != document) {
            return Err(StockError::validation(format!(
                "line {index} references another document"
            )));
        }
        self.commit(requests, Some(document.id))
    }

    fn commit(
        &self,
        requests: Vec<MoveRequest>,
        posted_once: Option<DocumentId>,
    ) -> StockResult<Vec<MoveRecord>> {
        let resolved = requests
            .into_iter()
            .enumerate()
            .map(|(line, request)| self.resolve(line, request))
            .collect::<StockResult<Vec<_>>>()?;

        let keys: Vec<StockKey> = resolved.iter().flat_map(|m| m.request.keys()).collect();
        let _guard = self
            .locks
            .acquire(keys, self.config.lock_timeout)
            .map_err(|timeout| {
                tracing::warn!(error = %timeout, "ledger key lock timed out");
                StockError::from(timeout)
            })?;

        // Check every debit against the committed balance plus earlier lines
        // of the same batch before anything is applied.
        let mut running: BTreeMap<StockKey, i64> = BTreeMap::new();
        {
            let state = self.state.read();
            for m in &resolved {
                let r = &m.request;
                if let Some(from) = r.from {
                    let key = StockKey::new(r.product, from);
                    let available = *running
                        .entry(key)
                        .or_insert_with(|| balance_of(&state, key));
                    if available < r.quantity {
                        return Err(StockError::InsufficientStock {
                            product: r.product,
                            location: from,
                            requested: r.quantity,
                            available,
                            line: Some(m.line),
                        });
                    }
                    running.insert(key, available - r.quantity);
                }
                if let Some(to) = r.to {
                    let key = StockKey::new(r.product, to);
                    let current = *running
                        .entry(key)
                        .or_insert_with(|| balance_of(&state, key));
                    let credited = current.checked_add(r.quantity).ok_or_else(|| {
                        StockError::validation(format!(
                            "line {}: balance at location {to} would overflow",
                            m.line
                        ))
                    })?;
                    running.insert(key, credited);
                }
            }
        }

        let mut state = self.state.write();
        if let Some(document) = posted_once {
            if !state.posted_documents.insert(document) {
                return Err(StockError::validation(format!(
                    "document {document} already posted"
                )));
            }
        }

        let now = match state.last_timestamp {
            Some(last) => self.clock.now().max(last),
            None => self.clock.now(),
        };
        state.last_timestamp = Some(now);

        let mut records = Vec::with_capacity(resolved.len());
        for m in resolved {
            let r = m.request;
            let record = MoveRecord {
                id: MoveId::new(),
                sequence: state.moves.len() as u64 + 1,
                product: r.product,
                from: r.from,
                to: r.to,
                warehouse: r.warehouse,
                quantity: r.quantity,
                document: r.document,
                timestamp: now,
                actor: r.actor,
            };
            state.moves.push(record.clone());
            records.push(record);
        }

        for (key, quantity) in running {
            let warehouse = records
                .iter()
                .find(|r| r.product == key.product && r.touches(key.location))
                .map(|r| r.warehouse);
            if let Some(warehouse) = warehouse {
                state.balances.insert(
                    key,
                    StockLine {
                        product: key.product,
                        location: key.location,
                        warehouse,
                        quantity,
                    },
                );
            }
        }

        for record in &records {
            tracing::info!(
                move_id = %record.id,
                sequence = record.sequence,
                product = %record.product,
                from = ?record.from,
                to = ?record.to,
                quantity = record.quantity,
                document = %record.document.id,
                kind = %record.document.kind,
                "move posted"
            );
        }
        Ok(records)
    }

    /// Structural checks that need no balance: quantity sign, endpoint shape,
    /// product existence and location/warehouse membership.
    fn resolve(&self, line: usize, request: MoveRequest) -> StockResult<ResolvedMove> {
        if request.quantity <= 0 {
            return Err(StockError::validation(format!(
                "line {line}: quantity must be positive (got {})",
                request.quantity
            )));
        }
        self.catalog.product(request.product)?;

        match (request.from, request.to) {
            (None, None) => {
                return Err(StockError::validation(format!(
                    "line {line}: a move needs a source or a destination"
                )));
            }
            (Some(from), Some(to)) => {
                if from == to {
                    return Err(StockError::validation(format!(
                        "line {line}: source and destination are the same location"
                    )));
                }
                let from_wh = self.owner(line, from)?;
                let to_wh = self.owner(line, to)?;
                if from_wh != to_wh {
                    return Err(StockError::CrossWarehouseTransfer {
                        line,
                        from: from_wh,
                        to: to_wh,
                    });
                }
                self.expect_warehouse(line, from, from_wh, request.warehouse)?;
            }
            (Some(location), None) | (None, Some(location)) => {
                let owner = self.owner(line, location)?;
                self.expect_warehouse(line, location, owner, request.warehouse)?;
            }
        }

        Ok(ResolvedMove { request, line })
    }

    fn owner(&self, line: usize, location: LocationId) -> StockResult<WarehouseId> {
        self.topology
            .warehouse_of(location)
            .map_err(|e| e.at_line(line))
    }

    fn expect_warehouse(
        &self,
        line: usize,
        location: LocationId,
        actual: WarehouseId,
        expected: WarehouseId,
    ) -> StockResult<()> {
        if actual != expected {
            return Err(StockError::invalid_location(
                location,
                format!("belongs to warehouse {actual}, expected {expected}"),
            )
            .at_line(line));
        }
        Ok(())
    }

    /// Current balance; an absent line is a valid zero.
    pub fn get_quantity(&self, product: ProductId, location: LocationId) -> i64 {
        balance_of(&self.state.read(), StockKey::new(product, location))
    }

    /// Sum of a product's balances across all locations of a warehouse.
    pub fn warehouse_total(&self, product: ProductId, warehouse: WarehouseId) -> i64 {
        self.state
            .read()
            .balances
            .values()
            .filter(|l| l.product == product && l.warehouse == warehouse)
            .fold(0i64, |total, l| total.saturating_add(l.quantity))
    }

    /// Recompute a balance from the move log alone.
    pub fn replay_balance(&self, product: ProductId, location: LocationId) -> i64 {
        self.state
            .read()
            .moves
            .iter()
            .filter(|m| m.product == product)
            .map(|m| m.delta_for(location))
            .sum()
    }

    /// Keys whose live balance disagrees with a replay of the log, with
    /// (live, replayed). Empty when the ledger is consistent.
    pub fn audit(&self) -> Vec<(StockKey, i64, i64)> {
        let state = self.state.read();
        let mut replayed: BTreeMap<StockKey, i64> = BTreeMap::new();
        for record in &state.moves {
            for key in record.keys() {
                *replayed.entry(key).or_default() += record.delta_for(key.location);
            }
        }

        let mut keys: Vec<StockKey> = replayed.keys().copied().collect();
        keys.extend(state.balances.keys().copied());
        keys.sort();
        keys.dedup();

        keys.into_iter()
            .filter_map(|key| {
                let live = balance_of(&state, key);
                let replay = replayed.get(&key).copied().unwrap_or(0);
                (live != replay).then_some((key, live, replay))
            })
            .collect()
    }

    pub fn has_moves_for_product(&self, product: ProductId) -> bool {
        self.state.read().moves.iter().any(|m| m.product == product)
    }

    pub fn is_posted(&self, document: DocumentId) -> bool {
        self.state.read().posted_documents.contains(&document)
    }

    pub fn move_count(&self) -> usize {
        self.state.read().moves.len()
    }

    /// Stock lines matching `filter`, read lazily.
    pub fn stock_lines(&self, filter: StockFilter) -> StockQuery<'_> {
        StockQuery::new(self, filter)
    }

    /// Move records matching `filter`, read lazily in timestamp order.
    pub fn list_moves(&self, filter: MoveFilter) -> MoveQuery<'_> {
        MoveQuery::new(self, filter)
    }

    pub(crate) fn next_line_after(
        &self,
        cursor: Option<StockKey>,
        filter: &StockFilter,
    ) -> Option<StockLine> {
        let lower = match cursor {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        self.state
            .read()
            .balances
            .range((lower, Bound::Unbounded))
            .map(|(_, line)| line)
            .find(|line| filter.matches(line))
            .copied()
    }

    pub(crate) fn move_at(&self, index: usize) -> Option<MoveRecord> {
        self.state.read().moves.get(index).cloned()
    }
}

fn balance_of(state: &LedgerState, key: StockKey) -> i64 {
    state.balances.get(&key).map(|l| l.quantity).unwrap_or(0)
}
