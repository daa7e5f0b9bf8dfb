//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// stock availability, lifecycle transitions, conflicts). Storage concerns belong
/// to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty items, missing reason, duplicate SKU).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A decrease exceeds the stock available for a SKU.
    #[error("insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: i64,
        available: i64,
    },

    /// A requested resource (SKU, adjustment) was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A lifecycle action is not permitted from the current status.
    #[error("cannot {action} an adjustment in status {status}")]
    InvalidTransition { status: String, action: String },

    /// Optimistic concurrency check failed (stale row/record version).
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn insufficient_stock(sku: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            sku: sku.into(),
            requested,
            available,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid_transition(status: impl core::fmt::Display, action: impl Into<String>) -> Self {
        Self::InvalidTransition {
            status: status.to_string(),
            action: action.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
