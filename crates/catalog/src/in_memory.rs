use std::collections::BTreeMap;
use std::sync::RwLock;

use stockledger_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion};

use crate::product::{ApplyMode, Product, Sku, StockChange};
use crate::repo::ProductRepo;

/// In-memory catalog.
///
/// Intended for tests/dev and single-process deployments. All writes take the
/// write lock, so `apply_delta` is atomic per call.
#[derive(Debug, Default)]
pub struct InMemoryProductRepo {
    rows: RwLock<BTreeMap<Sku, Product>>,
}

impl InMemoryProductRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog pre-loaded with `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> DomainResult<Self> {
        let repo = Self::new();
        for p in products {
            repo.put(p)?;
        }
        Ok(repo)
    }

    fn poisoned() -> DomainError {
        DomainError::invariant("catalog lock poisoned")
    }
}

impl ProductRepo for InMemoryProductRepo {
    fn get(&self, sku: &Sku) -> DomainResult<Product> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        rows.get(sku)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("product {sku}")))
    }

    fn put(&self, mut product: Product) -> DomainResult<Product> {
        product.validate()?;

        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let next = rows.get(product.sku()).map(|p| p.version()).unwrap_or(0) + 1;
        product.set_version(next);
        rows.insert(product.sku().clone(), product.clone());
        Ok(product)
    }

    fn list(&self) -> DomainResult<Vec<Product>> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.values().cloned().collect())
    }

    fn apply_delta(
        &self,
        sku: &Sku,
        delta: i64,
        mode: ApplyMode,
        expected: ExpectedVersion,
    ) -> DomainResult<StockChange> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let product = rows
            .get_mut(sku)
            .ok_or_else(|| DomainError::not_found(format!("product {sku}")))?;

        expected.check(product.version())?;

        let change = product.apply_delta(delta, mode)?;
        tracing::debug!(
            sku = %sku,
            requested = change.requested_delta,
            applied = change.applied_delta,
            quantity = change.new_quantity,
            "catalog stock changed"
        );
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sku(s: &str) -> Sku {
        Sku::parse(s).unwrap()
    }

    fn seeded() -> InMemoryProductRepo {
        InMemoryProductRepo::with_products([
            Product::new(sku("SKU-100"), "Widget", 50, dec!(20)).with_reorder_level(10),
            Product::new(sku("SKU-200"), "Gadget", 3, dec!(5)).with_reorder_level(5),
        ])
        .unwrap()
    }

    #[test]
    fn put_assigns_increasing_versions() {
        let repo = seeded();
        assert_eq!(repo.get(&sku("SKU-100")).unwrap().version(), 1);

        let again = repo
            .put(Product::new(sku("SKU-100"), "Widget v2", 50, dec!(21)))
            .unwrap();
        assert_eq!(again.version(), 2);
        assert_eq!(repo.get(&sku("SKU-100")).unwrap().name(), "Widget v2");
    }

    #[test]
    fn unknown_sku_is_not_found() {
        let repo = seeded();
        assert!(matches!(repo.get(&sku("NOPE")), Err(DomainError::NotFound(_))));
        assert!(matches!(
            repo.apply_delta(&sku("NOPE"), 1, ApplyMode::Clamp, ExpectedVersion::Any),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn stale_version_is_a_conflict_and_leaves_stock_alone() {
        let repo = seeded();
        let err = repo
            .apply_delta(&sku("SKU-100"), -1, ApplyMode::Strict, ExpectedVersion::Exact(7))
            .unwrap_err();

        assert!(matches!(err, DomainError::ConcurrencyConflict(_)));
        assert_eq!(repo.get(&sku("SKU-100")).unwrap().quantity(), 50);
    }

    #[test]
    fn apply_delta_bumps_row_version() {
        let repo = seeded();
        let change = repo
            .apply_delta(&sku("SKU-100"), -10, ApplyMode::Strict, ExpectedVersion::Exact(1))
            .unwrap();

        assert_eq!(change.new_quantity, 40);
        assert_eq!(change.version, 2);
        assert_eq!(repo.get(&sku("SKU-100")).unwrap().version(), 2);
    }

    #[test]
    fn low_stock_lists_products_at_or_below_reorder_level() {
        let repo = seeded();
        let low = repo.low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku().as_str(), "SKU-200");
    }

    #[test]
    fn put_rejects_invalid_rows() {
        let repo = InMemoryProductRepo::new();
        assert!(repo.put(Product::new(sku("A"), "A", -1, dec!(1))).is_err());
        assert!(repo.list().unwrap().is_empty());
    }
}
