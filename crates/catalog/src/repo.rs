use std::sync::Arc;

use stockledger_core::{DomainResult, ExpectedVersion};

use crate::product::{ApplyMode, Product, Sku, StockChange};

/// Catalog port consumed by the builder (reads) and the ledger (delta application).
///
/// Implementations must make `apply_delta` atomic per SKU: the version check, the
/// quantity change and the version bump happen under one critical section (or one
/// conditional row update in a database-backed store).
pub trait ProductRepo: Send + Sync {
    /// Load one product, `NotFound` if the SKU is unknown.
    fn get(&self, sku: &Sku) -> DomainResult<Product>;

    /// Insert or replace a product row; returns the stored row with its new version.
    fn put(&self, product: Product) -> DomainResult<Product>;

    /// All products ordered by SKU.
    fn list(&self) -> DomainResult<Vec<Product>>;

    /// Apply a signed delta to one SKU's quantity.
    ///
    /// - `Clamp`: quantity never drops below zero, the clamp is reported in the result
    /// - `Strict`: fails with `InsufficientStock` instead of clamping
    /// - `expected`: `Exact(v)` fails with `ConcurrencyConflict` if the row moved
    fn apply_delta(
        &self,
        sku: &Sku,
        delta: i64,
        mode: ApplyMode,
        expected: ExpectedVersion,
    ) -> DomainResult<StockChange>;

    /// Products at or below their reorder level.
    fn low_stock(&self) -> DomainResult<Vec<Product>> {
        Ok(self.list()?.into_iter().filter(Product::is_low_stock).collect())
    }
}

impl<S> ProductRepo for Arc<S>
where
    S: ProductRepo + ?Sized,
{
    fn get(&self, sku: &Sku) -> DomainResult<Product> {
        (**self).get(sku)
    }

    fn put(&self, product: Product) -> DomainResult<Product> {
        (**self).put(product)
    }

    fn list(&self) -> DomainResult<Vec<Product>> {
        (**self).list()
    }

    fn apply_delta(
        &self,
        sku: &Sku,
        delta: i64,
        mode: ApplyMode,
        expected: ExpectedVersion,
    ) -> DomainResult<StockChange> {
        (**self).apply_delta(sku, delta, mode, expected)
    }

    fn low_stock(&self) -> DomainResult<Vec<Product>> {
        (**self).low_stock()
    }
}
