//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. An adjustment line is
/// one: two lines with the same SKU snapshot, quantity and cost are interchangeable,
/// and once recorded they are never edited in place.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
