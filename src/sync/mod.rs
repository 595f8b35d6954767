//! Library-to-device reconciliation

mod engine;
mod plan;

pub use engine::{SyncEngine, SyncOutcome, SyncReport};
pub use plan::{compute_plan, MediaFile, PlannedCopy, SyncPlan};
