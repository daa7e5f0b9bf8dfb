//! Read-side views computed from ledger records.

pub mod adjustment_report;
