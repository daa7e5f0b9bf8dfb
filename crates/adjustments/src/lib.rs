//! Stock adjustment domain module.
//!
//! Business rules for out-of-band stock corrections: the reason vocabulary, the
//! line-item snapshot, the `StockAdjustment` lifecycle and the staging builder.
//! Pure domain logic; applying deltas to the catalog is the ledger's job.

pub mod adjustment;
pub mod builder;
pub mod item;
pub mod print;
pub mod reason;
pub mod validation;

pub use adjustment::{
    AdjustmentApproved, AdjustmentCommand, AdjustmentDiscarded, AdjustmentDrafted,
    AdjustmentEvent, AdjustmentRejected, AdjustmentReversed, AdjustmentStatus,
    AdjustmentSubmitted, AppliedDelta, ApproveAdjustment, DiscardAdjustment, RejectAdjustment,
    ReverseAdjustment, StockAdjustment, SubmitAdjustment,
};
pub use builder::AdjustmentBuilder;
pub use item::AdjustmentItem;
pub use print::{CSV_COLUMNS, PrintLine, PrintView, csv_record, serialize_for_print};
pub use reason::{AdjustmentReason, AdjustmentType};
