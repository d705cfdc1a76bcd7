use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use stockflow_core::{CategoryId, ProductId, StockError, StockResult, WarehouseId};

use crate::product::{DEFAULT_UNIT_OF_MEASURE, non_blank, non_negative};
use crate::{Category, NewProduct, Product, ProductUpdate, ReorderRule};

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    /// SKU -> product, kept in step with `products`.
    skus: BTreeMap<String, ProductId>,
    categories: HashMap<CategoryId, Category>,
    reorder_rules: HashMap<(ProductId, WarehouseId), ReorderRule>,
}

/// In-memory product registry.
#[derive(Debug, Default)]
pub struct Catalog {
    state: RwLock<CatalogState>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_category(&self, name: &str) -> StockResult<Category> {
        let category = Category {
            id: CategoryId::new(),
            name: non_blank("category name", name)?,
        };
        self.state
            .write()
            .categories
            .insert(category.id, category.clone());
        Ok(category)
    }

    pub fn category(&self, id: CategoryId) -> StockResult<Category> {
        self.state
            .read()
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| StockError::not_found("category", id))
    }

    pub fn categories(&self) -> Vec<Category> {
        let mut all: Vec<Category> = self.state.read().categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn create_product(&self, new: NewProduct) -> StockResult<Product> {
        let sku = non_blank("sku", &new.sku)?;
        let name = non_blank("name", &new.name)?;
        let unit_of_measure = match new.unit_of_measure {
            Some(uom) => non_blank("unit of measure", &uom)?,
            None => DEFAULT_UNIT_OF_MEASURE.to_string(),
        };
        let low_stock_threshold = non_negative("low stock threshold", new.low_stock_threshold)?;
        let expected_quantity = non_negative("expected quantity", new.expected_quantity)?;

        let mut state = self.state.write();
        if let Some(category) = new.category {
            if !state.categories.contains_key(&category) {
                return Err(StockError::not_found("category", category));
            }
        }
        if state.skus.contains_key(&sku) {
            return Err(StockError::validation(format!("sku '{sku}' already exists")));
        }

        let product = Product {
            id: ProductId::new(),
            sku: sku.clone(),
            name,
            unit_of_measure,
            category: new.category,
            low_stock_threshold,
            expected_quantity,
            active: true,
        };
        state.skus.insert(sku, product.id);
        state.products.insert(product.id, product.clone());
        tracing::debug!(product = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    pub fn update_product(&self, id: ProductId, update: ProductUpdate) -> StockResult<Product> {
        let mut state = self.state.write();
        if let Some(Some(category)) = update.category {
            if !state.categories.contains_key(&category) {
                return Err(StockError::not_found("category", category));
            }
        }

        let current = state
            .products
            .get(&id)
            .ok_or_else(|| StockError::not_found("product", id))?;

        // Validate everything before touching the stored record.
        let mut next = current.clone();
        if let Some(name) = &update.name {
            next.name = non_blank("name", name)?;
        }
        if let Some(uom) = &update.unit_of_measure {
            next.unit_of_measure = non_blank("unit of measure", uom)?;
        }
        if let Some(category) = update.category {
            next.category = category;
        }
        if let Some(threshold) = update.low_stock_threshold {
            next.low_stock_threshold = non_negative("low stock threshold", threshold)?;
        }
        if let Some(quantity) = update.expected_quantity {
            next.expected_quantity = non_negative("expected quantity", quantity)?;
        }

        state.products.insert(id, next.clone());
        Ok(next)
    }

    /// Soft delete: the product stays resolvable for history but cannot be
    /// put on new document lines.
    pub fn set_active(&self, id: ProductId, active: bool) -> StockResult<Product> {
        let mut state = self.state.write();
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| StockError::not_found("product", id))?;
        product.active = active;
        Ok(product.clone())
    }

    /// Hard delete. Callers must first make sure nothing references the
    /// product (the engine checks the ledger).
    pub fn remove_product(&self, id: ProductId) -> StockResult<Product> {
        let mut state = self.state.write();
        let product = state
            .products
            .remove(&id)
            .ok_or_else(|| StockError::not_found("product", id))?;
        state.skus.remove(&product.sku);
        state.reorder_rules.retain(|(p, _), _| *p != id);
        Ok(product)
    }

    pub fn product(&self, id: ProductId) -> StockResult<Product> {
        self.state
            .read()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StockError::not_found("product", id))
    }

    /// Resolve a product that may be placed on a new document line.
    pub fn active_product(&self, id: ProductId) -> StockResult<Product> {
        let product = self.product(id)?;
        if !product.active {
            return Err(StockError::validation(format!(
                "product '{}' is inactive",
                product.sku
            )));
        }
        Ok(product)
    }

    pub fn find_by_sku(&self, sku: &str) -> Option<Product> {
        let state = self.state.read();
        let id = state.skus.get(sku.trim())?;
        state.products.get(id).cloned()
    }

    /// All products ordered by SKU.
    pub fn products(&self) -> Vec<Product> {
        let state = self.state.read();
        state
            .skus
            .values()
            .filter_map(|id| state.products.get(id).cloned())
            .collect()
    }

    pub fn upsert_reorder_rule(&self, rule: ReorderRule) -> StockResult<ReorderRule> {
        let mut state = self.state.write();
        if !state.products.contains_key(&rule.product) {
            return Err(StockError::not_found("product", rule.product));
        }
        state
            .reorder_rules
            .insert((rule.product, rule.warehouse), rule);
        Ok(rule)
    }

    pub fn reorder_rules_for(&self, warehouse: WarehouseId) -> Vec<ReorderRule> {
        let mut rules: Vec<ReorderRule> = self
            .state
            .read()
            .reorder_rules
            .values()
            .filter(|r| r.warehouse == warehouse)
            .copied()
            .collect();
        rules.sort_by_key(|r| r.product);
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_product_applies_defaults() {
        let catalog = Catalog::new();
        let product = catalog
            .create_product(NewProduct::new("  DESK001 ", "Office Desk"))
            .unwrap();

        assert_eq!(product.sku, "DESK001");
        assert_eq!(product.unit_of_measure, "Unit");
        assert!(product.active);
        assert_eq!(catalog.find_by_sku("DESK001").unwrap().id, product.id);
    }

    #[test]
    fn duplicate_sku_is_rejected() {
        let catalog = Catalog::new();
        catalog.create_product(NewProduct::new("ABC", "A")).unwrap();
        let err = catalog.create_product(NewProduct::new("ABC", "B")).unwrap_err();
        match err {
            StockError::Validation(msg) => assert!(msg.contains("already exists")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let catalog = Catalog::new();
        let err = catalog
            .create_product(NewProduct::new("ABC", "A").with_low_stock_threshold(-1))
            .unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
    }

    #[test]
    fn unknown_category_is_not_found() {
        let catalog = Catalog::new();
        let err = catalog
            .create_product(NewProduct::new("ABC", "A").with_category(CategoryId::new()))
            .unwrap_err();
        assert!(matches!(err, StockError::NotFound { entity: "category", .. }));
    }

    #[test]
    fn failed_update_leaves_product_unchanged() {
        let catalog = Catalog::new();
        let product = catalog.create_product(NewProduct::new("ABC", "A")).unwrap();

        let err = catalog
            .update_product(
                product.id,
                ProductUpdate {
                    name: Some("Renamed".into()),
                    expected_quantity: Some(-5),
                    ..ProductUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
        assert_eq!(catalog.product(product.id).unwrap().name, "A");
    }

    #[test]
    fn deactivated_product_cannot_be_used_on_new_lines() {
        let catalog = Catalog::new();
        let product = catalog.create_product(NewProduct::new("ABC", "A")).unwrap();
        catalog.set_active(product.id, false).unwrap();

        assert!(catalog.product(product.id).is_ok());
        assert!(catalog.active_product(product.id).is_err());
    }

    #[test]
    fn removing_product_frees_sku_and_rules() {
        let catalog = Catalog::new();
        let warehouse = WarehouseId::new();
        let product = catalog.create_product(NewProduct::new("ABC", "A")).unwrap();
        catalog
            .upsert_reorder_rule(ReorderRule::new(product.id, warehouse, 1, 5).unwrap())
            .unwrap();

        catalog.remove_product(product.id).unwrap();
        assert!(catalog.find_by_sku("ABC").is_none());
        assert!(catalog.reorder_rules_for(warehouse).is_empty());
        assert!(catalog.create_product(NewProduct::new("ABC", "again")).is_ok());
    }

    proptest! {
        /// Property: the catalog never holds two products with the same SKU,
        /// whatever order creations arrive in.
        #[test]
        fn skus_stay_unique(skus in prop::collection::vec("[A-C]{1,2}", 1..20)) {
            let catalog = Catalog::new();
            for sku in &skus {
                let _ = catalog.create_product(NewProduct::new(sku.clone(), "p"));
            }

            let mut seen: Vec<String> = catalog.products().into_iter().map(|p| p.sku).collect();
            let total = seen.len();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);

            let mut distinct = skus.clone();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(total, distinct.len());
        }
    }
}
