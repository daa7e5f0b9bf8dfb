//! Inventory catalog: per-SKU stock records consumed by the adjustment ledger.
//!
//! The ledger never writes `quantity` directly; every stock change goes through
//! [`ProductRepo::apply_delta`], which either clamps at zero or fails in strict mode.

pub mod in_memory;
pub mod product;
pub mod repo;

pub use in_memory::InMemoryProductRepo;
pub use product::{ApplyMode, Product, Sku, StockChange};
pub use repo::ProductRepo;
