use std::fmt;

use crate::merge::KEY_COLUMN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Requested join-key column is absent from the table.
    MissingColumn { table: String, column: String },
    /// The table carries a column under the reserved key name that is not the
    /// chosen key column; renaming would silently overwrite it.
    ReservedColumn { table: String },
    /// No rows of the first table match the second table's key set.
    EmptyResult,
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::ReservedColumn { table } => {
                write!(
                    f,
                    "table '{table}': column name '{KEY_COLUMN}' is reserved for the join key"
                )
            }
            Self::EmptyResult => {
                write!(f, "no rows of the first table match the second table's keys")
            }
        }
    }
}

impl std::error::Error for MergeError {}
