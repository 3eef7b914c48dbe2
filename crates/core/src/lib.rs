//! `tabmerge-core` — Cross-merge engine for two tabular row-sets.
//!
//! Pure engine crate: receives pre-parsed tables, returns the joined table.
//! No CLI or IO dependencies.

pub mod cell;
pub mod error;
pub mod merge;
pub mod table;

pub use cell::CellValue;
pub use error::MergeError;
pub use merge::{merge, MergeOutput, MergeSummary, KEY_COLUMN};
pub use table::Table;
