//! The stock engine façade.
//!
//! Every public method takes the calling [`Actor`] and consults the access
//! scope guard before reading or writing anything. Lists are narrowed to the
//! actor's scope before they are built, so nothing outside it is ever
//! materialized.
//!
//! ## Transition pipeline
//!
//! ```text
//! transition(id, target)
//!   ↓
//! 1. authorize against the document's warehouse
//!   ↓
//! 2. take the document lock (bounded wait)
//!   ↓
//! 3. plan the transition against live availability (pure)
//!   ↓
//! 4. check the document version (optimistic)
//!   ↓
//! 5. Plan::Post → post every line as one ledger batch, then save the new
//!    status without releasing the store
//!   ↓
//! 6. release the lock, re-evaluate waiting deliveries on the posted keys
//! ```
//!
//! A `ConcurrencyConflict` anywhere in 2-5 retries the whole attempt, up to
//! `EngineConfig::conflict_retries` times.

use std::sync::Arc;

use chrono::NaiveDate;

use stockflow_auth::{Actor, Operation, Scope, authorize, authorize_transfer, scope};
use stockflow_catalog::{Catalog, Category, NewProduct, Product, ProductUpdate, ReorderRule};
use stockflow_core::{
    ActorId, AggregateRoot, Clock, DocumentId, DocumentKind, DocumentStatus, ExpectedVersion,
    KeyLockGuard, KeyLockTable, LocationId, ProductId, StockError, StockResult, SystemClock,
    WarehouseId,
};
use stockflow_documents::{
    self as documents, Document, DocumentEdit, DocumentFilter, DocumentLine, DocumentStore,
    LineInput, NewDocument, Plan,
};
use stockflow_ledger::{
    LedgerConfig, MoveFilter, MoveQuery, StockFilter, StockKey, StockLedger, StockQuery,
};
use stockflow_topology::{Location, NewLocation, NewWarehouse, ProvisionedWarehouse, Topology};

use crate::config::EngineConfig;
use crate::report::{LowStockAlert, ReorderSuggestion};

pub struct StockEngine {
    catalog: Arc<Catalog>,
    topology: Arc<Topology>,
    ledger: Arc<StockLedger>,
    documents: DocumentStore,
    document_locks: KeyLockTable<DocumentId>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl core::fmt::Debug for StockEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StockEngine")
            .field("config", &self.config)
            .field("documents", &self.documents.len())
            .field("moves", &self.ledger.move_count())
            .finish_non_exhaustive()
    }
}

impl StockEngine {
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let catalog = Arc::new(Catalog::new());
        let topology = Arc::new(Topology::new());
        let ledger = Arc::new(StockLedger::new(
            Arc::clone(&catalog),
            Arc::clone(&topology),
            Arc::clone(&clock),
            LedgerConfig {
                lock_timeout: config.lock_timeout,
            },
        ));

        Self {
            catalog,
            topology,
            ledger,
            documents: DocumentStore::new(),
            document_locks: KeyLockTable::new(),
            clock,
            config,
        }
    }

    /// Engine on the system clock with configuration from the environment.
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env(), Arc::new(SystemClock))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current date on the engine's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Master data reads. Catalog data is not warehouse-scoped.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn create_category(&self, actor: &Actor, name: &str) -> StockResult<Category> {
        authorize(actor, Operation::ManageCatalog, None)?;
        self.catalog.create_category(name)
    }

    pub fn create_product(&self, actor: &Actor, new: NewProduct) -> StockResult<Product> {
        authorize(actor, Operation::ManageCatalog, None)?;
        let product = self.catalog.create_product(new)?;
        tracing::info!(product = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    pub fn update_product(
        &self,
        actor: &Actor,
        id: ProductId,
        update: ProductUpdate,
    ) -> StockResult<Product> {
        authorize(actor, Operation::ManageCatalog, None)?;
        self.catalog.update_product(id, update)
    }

    /// Soft delete / restore.
    pub fn set_product_active(
        &self,
        actor: &Actor,
        id: ProductId,
        active: bool,
    ) -> StockResult<Product> {
        authorize(actor, Operation::ManageCatalog, None)?;
        let product = self.catalog.set_active(id, active)?;
        tracing::info!(product = %id, active, "product activation changed");
        Ok(product)
    }

    /// Hard delete, refused once the ledger or any document references the
    /// product.
    pub fn delete_product(&self, actor: &Actor, id: ProductId) -> StockResult<Product> {
        authorize(actor, Operation::ManageCatalog, None)?;
        self.catalog.product(id)?;

        let on_documents = self
            .documents
            .list(DocumentFilter::default(), None)
            .iter()
            .any(|doc| doc.lines().iter().any(|line| line.product == id));
        if on_documents || self.ledger.has_moves_for_product(id) {
            return Err(StockError::ProductInUse(id));
        }

        let product = self.catalog.remove_product(id)?;
        tracing::info!(product = %id, sku = %product.sku, "product deleted");
        Ok(product)
    }

    pub fn set_reorder_rule(&self, actor: &Actor, rule: ReorderRule) -> StockResult<ReorderRule> {
        authorize(actor, Operation::ManageCatalog, None)?;
        self.topology.warehouse(rule.warehouse)?;
        self.catalog.upsert_reorder_rule(rule)
    }

    /// Create a warehouse together with its bound staff actor.
    pub fn create_warehouse(
        &self,
        actor: &Actor,
        new: NewWarehouse,
    ) -> StockResult<ProvisionedWarehouse> {
        authorize(actor, Operation::ManageTopology, None)?;
        let provisioned = self.topology.create_warehouse(new)?;
        tracing::info!(
            warehouse = %provisioned.warehouse.id,
            code = %provisioned.warehouse.code,
            staff = %provisioned.staff.id,
            "warehouse created"
        );
        Ok(provisioned)
    }

    pub fn create_location(
        &self,
        actor: &Actor,
        warehouse: WarehouseId,
        new: NewLocation,
    ) -> StockResult<Location> {
        authorize(actor, Operation::ManageTopology, None)?;
        let location = self.topology.create_location(warehouse, new)?;
        tracing::info!(location = %location.id, %warehouse, code = %location.code, "location created");
        Ok(location)
    }

    /// Create a Draft document. A transfer scheduled for today or earlier is
    /// validated immediately; if stock is short it stays Draft.
    pub fn create_document(&self, actor: &Actor, new: NewDocument) -> StockResult<Document> {
        let operation = Operation::CreateDocument(new.kind);
        authorize(actor, operation, Some(new.warehouse))?;
        self.topology.warehouse(new.warehouse)?;

        let lines = self.checked_lines(actor, operation, new.kind, new.warehouse, &new.lines)?;
        let doc = self
            .documents
            .insert(Document::draft(new, lines, actor.id, self.clock.now()))?;

        tracing::info!(
            document = %doc.id_typed(),
            kind = %doc.kind(),
            warehouse = %doc.warehouse(),
            actor = %actor.id,
            lines = doc.lines().len(),
            "document created"
        );

        if documents::due_for_auto_validation(&doc, self.clock.today()) {
            return self.auto_validate(doc);
        }
        Ok(doc)
    }

    /// Edit a Draft document.
    pub fn edit_document(
        &self,
        actor: &Actor,
        id: DocumentId,
        edit: DocumentEdit,
    ) -> StockResult<Document> {
        let current = self.documents.get(id)?;
        authorize(actor, Operation::EditDocument, Some(current.warehouse()))?;

        let saved = {
            let _lock = self.lock_document(id)?;
            let doc = self.documents.get(id)?;
            let lines = match &edit.lines {
                Some(inputs) if doc.is_editable() => Some(self.checked_lines(
                    actor,
                    Operation::EditDocument,
                    doc.kind(),
                    doc.warehouse(),
                    inputs,
                )?),
                _ => None,
            };
            let next = documents::edit(&doc, edit, lines)?;
            self.documents
                .save(next, ExpectedVersion::Exact(doc.version()))?
        };
        tracing::info!(document = %id, actor = %actor.id, "document edited");

        if documents::due_for_auto_validation(&saved, self.clock.today()) {
            return self.auto_validate(saved);
        }
        Ok(saved)
    }

    /// Move a document toward `target`.
    pub fn transition(
        &self,
        actor: &Actor,
        id: DocumentId,
        target: DocumentStatus,
    ) -> StockResult<Document> {
        let doc = self.documents.get(id)?;
        authorize(actor, Operation::TransitionDocument, Some(doc.warehouse()))?;
        self.transition_with_retries(id, target, actor.id)
    }

    pub fn get_document(&self, actor: &Actor, id: DocumentId) -> StockResult<Document> {
        let doc = self.documents.get(id)?;
        authorize(actor, Operation::ReadDocuments, Some(doc.warehouse()))?;
        self.refresh(doc)
    }

    /// Documents matching `filter` inside the actor's scope, oldest first.
    pub fn query_documents(
        &self,
        actor: &Actor,
        filter: DocumentFilter,
    ) -> StockResult<Vec<Document>> {
        let within = scope_warehouse(Scope::for_query(
            actor,
            Operation::ReadDocuments,
            filter.warehouse,
        )?);

        // Bring waiting deliveries and due transfers up to date first so the
        // status filter sees current statuses.
        let today = self.clock.today();
        for doc in self.documents.list(DocumentFilter::default(), within) {
            let stale = documents::due_for_auto_validation(&doc, today)
                || documents::reevaluate(&doc, self.ledger.as_ref()).is_some();
            if stale {
                let id = doc.id_typed();
                if let Err(err) = self.refresh(doc) {
                    tracing::debug!(document = %id, error = %err, "refresh skipped");
                }
            }
        }

        Ok(self.documents.list(filter, within))
    }

    pub fn get_quantity(
        &self,
        actor: &Actor,
        product: ProductId,
        location: LocationId,
    ) -> StockResult<i64> {
        let owner = self.topology.warehouse_of(location)?;
        authorize(actor, Operation::ReadStock, Some(owner))?;
        Ok(self.ledger.get_quantity(product, location))
    }

    /// Stock lines in scope, read lazily.
    pub fn query_stock(&self, actor: &Actor, mut filter: StockFilter) -> StockResult<StockQuery<'_>> {
        filter.warehouse =
            self.query_scope(actor, Operation::ReadStock, filter.location, filter.warehouse)?;
        Ok(self.ledger.stock_lines(filter))
    }

    /// Move records in scope, read lazily in timestamp order.
    pub fn query_moves(&self, actor: &Actor, mut filter: MoveFilter) -> StockResult<MoveQuery<'_>> {
        filter.warehouse =
            self.query_scope(actor, Operation::ReadMoves, filter.location, filter.warehouse)?;
        Ok(self.ledger.list_moves(filter))
    }

    /// Balance/replay mismatches in scope. Empty when consistent.
    pub fn audit(&self, actor: &Actor) -> Vec<(StockKey, i64, i64)> {
        let scope = scope(actor);
        self.ledger
            .audit()
            .into_iter()
            .filter(|(key, _, _)| {
                self.topology
                    .warehouse_of(key.location)
                    .is_ok_and(|w| scope.permits(w))
            })
            .collect()
    }

    pub fn low_stock_alerts(&self, actor: &Actor) -> Vec<LowStockAlert> {
        let scope = scope(actor);
        let warehouses: Vec<WarehouseId> = self
            .topology
            .warehouses()
            .into_iter()
            .map(|w| w.id)
            .filter(|w| scope.permits(*w))
            .collect();

        let mut alerts = Vec::new();
        for product in self.catalog.products() {
            if !product.active || product.low_stock_threshold <= 0 {
                continue;
            }
            for &warehouse in &warehouses {
                let on_hand = self.ledger.warehouse_total(product.id, warehouse);
                if on_hand <= product.low_stock_threshold {
                    alerts.push(LowStockAlert {
                        product: product.id,
                        sku: product.sku.clone(),
                        warehouse,
                        on_hand,
                        threshold: product.low_stock_threshold,
                        out_of_stock: on_hand <= 0,
                    });
                }
            }
        }
        alerts
    }

    pub fn reorder_suggestions(
        &self,
        actor: &Actor,
        warehouse: WarehouseId,
    ) -> StockResult<Vec<ReorderSuggestion>> {
        authorize(actor, Operation::ReadStock, Some(warehouse))?;
        self.topology.warehouse(warehouse)?;

        let mut out = Vec::new();
        for rule in self.catalog.reorder_rules_for(warehouse) {
            let Ok(product) = self.catalog.active_product(rule.product) else {
                continue;
            };
            let on_hand = self.ledger.warehouse_total(rule.product, warehouse);
            if let Some(suggested) = rule.suggestion(on_hand) {
                out.push(ReorderSuggestion {
                    product: product.id,
                    sku: product.sku,
                    warehouse,
                    on_hand,
                    min_quantity: rule.min_quantity,
                    max_quantity: rule.max_quantity,
                    suggested,
                });
            }
        }
        Ok(out)
    }

    /// Guard every resolvable line endpoint, then validate the lines.
    /// Unknown locations are left for line validation to report.
    fn checked_lines(
        &self,
        actor: &Actor,
        operation: Operation,
        kind: DocumentKind,
        warehouse: WarehouseId,
        inputs: &[LineInput],
    ) -> StockResult<Vec<DocumentLine>> {
        for input in inputs {
            match (kind, input.from, input.to) {
                (DocumentKind::InternalTransfer, Some(from), Some(to)) => {
                    if let (Ok(source), Ok(destination)) = (
                        self.topology.warehouse_of(from),
                        self.topology.warehouse_of(to),
                    ) {
                        authorize_transfer(actor, warehouse, source, destination)?;
                    }
                }
                _ => {
                    for location in input.from.into_iter().chain(input.to) {
                        if let Ok(owner) = self.topology.warehouse_of(location) {
                            authorize(actor, operation, Some(owner))?;
                        }
                    }
                }
            }
        }
        documents::validate_lines(kind, warehouse, inputs, &self.catalog, &self.topology)
    }

    fn query_scope(
        &self,
        actor: &Actor,
        operation: Operation,
        location: Option<LocationId>,
        warehouse: Option<WarehouseId>,
    ) -> StockResult<Option<WarehouseId>> {
        if let Some(location) = location {
            let owner = self.topology.warehouse_of(location)?;
            authorize(actor, operation, Some(owner))?;
        }
        Ok(scope_warehouse(Scope::for_query(actor, operation, warehouse)?))
    }

    fn lock_document(&self, id: DocumentId) -> StockResult<KeyLockGuard<'_, DocumentId>> {
        self.document_locks
            .acquire([id], self.config.lock_timeout)
            .map_err(|timeout| {
                tracing::warn!(document = %id, error = %timeout, "document lock timed out");
                StockError::from(timeout)
            })
    }

    fn transition_with_retries(
        &self,
        id: DocumentId,
        target: DocumentStatus,
        posted_by: ActorId,
    ) -> StockResult<Document> {
        let mut attempt = 0;
        loop {
            match self.try_transition(id, target, posted_by) {
                Ok((doc, posted)) => {
                    if !posted.is_empty() {
                        self.reevaluate_waiting(&posted);
                    }
                    return Ok(doc);
                }
                Err(err @ StockError::ConcurrencyConflict(_))
                    if attempt < self.config.conflict_retries =>
                {
                    attempt += 1;
                    tracing::warn!(document = %id, attempt, error = %err, "transition conflicted; retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// One attempt under the document lock. Returns the saved document and
    /// the ledger keys it posted to.
    fn try_transition(
        &self,
        id: DocumentId,
        target: DocumentStatus,
        posted_by: ActorId,
    ) -> StockResult<(Document, Vec<StockKey>)> {
        let _lock = self.lock_document(id)?;
        let doc = self.documents.get(id)?;
        let plan = documents::plan_transition(&doc, target, self.ledger.as_ref())?;
        let next = documents::advance(&doc, plan.target(), self.clock.now());

        // Posted implies Done: nothing can fail between the post and the save.
        let (saved, posted) =
            self.documents
                .save_after(next, ExpectedVersion::Exact(doc.version()), || match plan {
                    Plan::Status(_) => Ok(Vec::new()),
                    Plan::Post => {
                        let records = self
                            .ledger
                            .post_batch(doc.doc_ref(), documents::postings(&doc, posted_by))?;
                        let mut keys: Vec<StockKey> =
                            records.iter().flat_map(|r| r.keys()).collect();
                        keys.sort();
                        keys.dedup();
                        Ok(keys)
                    }
                })?;
        tracing::info!(
            document = %id,
            kind = %saved.kind(),
            from = %doc.status(),
            to = %saved.status(),
            requested = %target,
            "document status changed"
        );
        Ok((saved, posted))
    }

    /// Scheduled transfer validation. Short stock (or exhausted retries)
    /// leaves the document Draft without an error.
    fn auto_validate(&self, doc: Document) -> StockResult<Document> {
        let id = doc.id_typed();
        match self.transition_with_retries(id, DocumentStatus::Done, doc.created_by()) {
            Ok(done) => {
                tracing::info!(document = %id, "scheduled transfer auto-validated");
                Ok(done)
            }
            Err(err) if err.is_retryable() => {
                tracing::info!(document = %id, error = %err, "scheduled transfer stays draft");
                self.documents.get(id)
            }
            // Someone else moved it first.
            Err(StockError::InvalidTransition { .. }) => self.documents.get(id),
            Err(err) => Err(err),
        }
    }

    /// Bring a fetched document up to date.
    fn refresh(&self, doc: Document) -> StockResult<Document> {
        if documents::due_for_auto_validation(&doc, self.clock.today()) {
            return self.auto_validate(doc);
        }
        if documents::reevaluate(&doc, self.ledger.as_ref()).is_some() {
            return self.promote_if_satisfiable(doc.id_typed());
        }
        Ok(doc)
    }

    fn reevaluate_waiting(&self, keys: &[StockKey]) {
        for id in self.documents.waiting_deliveries_touching(keys) {
            if let Err(err) = self.promote_if_satisfiable(id) {
                tracing::debug!(document = %id, error = %err, "re-evaluation skipped");
            }
        }
    }

    fn promote_if_satisfiable(&self, id: DocumentId) -> StockResult<Document> {
        let _lock = self.lock_document(id)?;
        let doc = self.documents.get(id)?;
        match documents::reevaluate(&doc, self.ledger.as_ref()) {
            Some(status) => {
                let next = documents::advance(&doc, status, self.clock.now());
                let saved = self
                    .documents
                    .save(next, ExpectedVersion::Exact(doc.version()))?;
                tracing::debug!(document = %id, to = %status, "waiting delivery promoted");
                Ok(saved)
            }
            None => Ok(doc),
        }
    }
}

fn scope_warehouse(scope: Scope) -> Option<WarehouseId> {
    match scope {
        Scope::All => None,
        Scope::Warehouse(warehouse) => Some(warehouse),
    }
}
