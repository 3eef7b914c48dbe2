//! Cross-merge pipeline: key normalization, common-key filter, full outer join.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::cell::CellValue;
use crate::error::MergeError;
use crate::table::Table;

/// Reserved name both key columns are renamed to before joining.
pub const KEY_COLUMN: &str = "comum";

/// Suffixes applied when a non-key column name exists on both sides.
const LEFT_SUFFIX: &str = "_1";
const RIGHT_SUFFIX: &str = "_2";

/// Counts reported after a merge run.
#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub first_rows: usize,
    pub second_rows: usize,
    pub first_rows_matched: usize,
    pub second_rows_matched: usize,
    pub common_keys: usize,
    pub result_rows: usize,
    pub result_columns: usize,
}

#[derive(Debug)]
pub struct MergeOutput {
    pub table: Table,
    pub summary: MergeSummary,
}

/// Rename `key_column` to [`KEY_COLUMN`] and replace every cell in it with
/// its trimmed, uppercased string form.
///
/// Idempotent: normalizing an already-normalized key column changes nothing.
pub fn normalize(table_name: &str, mut table: Table, key_column: &str) -> Result<Table, MergeError> {
    let key_idx = table
        .column_index(key_column)
        .ok_or_else(|| MergeError::MissingColumn {
            table: table_name.to_string(),
            column: key_column.to_string(),
        })?;

    // A stray column already holding the reserved name would be silently
    // shadowed by the rename; refuse instead.
    let reserved_elsewhere = table
        .columns
        .iter()
        .enumerate()
        .any(|(i, c)| i != key_idx && c == KEY_COLUMN);
    if reserved_elsewhere {
        return Err(MergeError::ReservedColumn {
            table: table_name.to_string(),
        });
    }

    table.columns[key_idx] = KEY_COLUMN.to_string();
    for row in &mut table.rows {
        row[key_idx] = CellValue::Text(row[key_idx].to_text().trim().to_uppercase());
    }
    Ok(table)
}

/// Distinct, non-blank key values of a normalized table.
fn key_set(table: &Table) -> HashSet<String> {
    let Some(key_idx) = table.column_index(KEY_COLUMN) else {
        return HashSet::new();
    };
    table
        .rows
        .iter()
        .map(|row| row[key_idx].to_text())
        .filter(|key| !key.is_empty())
        .collect()
}

/// Stable filter: rows whose key is in `keys`, in input order.
fn filter_by_keys(table: &Table, keys: &HashSet<String>) -> Table {
    let key_idx = table.column_index(KEY_COLUMN);
    let mut out = Table::new(table.columns.clone());
    for row in &table.rows {
        let keep = key_idx.is_some_and(|i| keys.contains(&row[i].to_text()));
        if keep {
            out.rows.push(row.clone());
        }
    }
    out
}

/// Keep only `primary` rows whose key appears in `secondary`.
///
/// Fails with [`MergeError::EmptyResult`] when nothing survives.
pub fn restrict_to_common_keys(primary: &Table, secondary: &Table) -> Result<Table, MergeError> {
    let filtered = filter_by_keys(primary, &key_set(secondary));
    if filtered.rows.is_empty() {
        return Err(MergeError::EmptyResult);
    }
    Ok(filtered)
}

/// Full outer join of two normalized tables on [`KEY_COLUMN`].
///
/// Matching keys emit the cross-product of the two row groups; one-sided keys
/// emit a single row with [`CellValue::Empty`] fill for the missing side.
/// Left rows come out in input order, then unmatched right rows in input
/// order; callers must not rely on more than row-set equivalence.
pub fn outer_join(left: &Table, right: &Table) -> Table {
    let (Some(left_key), Some(right_key)) = (
        left.column_index(KEY_COLUMN),
        right.column_index(KEY_COLUMN),
    ) else {
        // Inputs that never went through `normalize` have nothing to join on.
        return Table::new(Vec::new());
    };

    // Output header: shared key first, then each side's non-key columns.
    // Names used by both sides get a side suffix; unique names stay verbatim.
    let left_names: HashSet<&str> = non_key_names(left, left_key).collect();
    let right_names: HashSet<&str> = non_key_names(right, right_key).collect();

    let mut columns = Vec::with_capacity(left.column_count() + right.column_count() - 1);
    columns.push(KEY_COLUMN.to_string());
    for name in non_key_names(left, left_key) {
        columns.push(if right_names.contains(name) {
            format!("{name}{LEFT_SUFFIX}")
        } else {
            name.to_string()
        });
    }
    for name in non_key_names(right, right_key) {
        columns.push(if left_names.contains(name) {
            format!("{name}{RIGHT_SUFFIX}")
        } else {
            name.to_string()
        });
    }

    let left_width = left.column_count() - 1;
    let right_width = right.column_count() - 1;
    let emit = |key: &CellValue, lrow: Option<&[CellValue]>, rrow: Option<&[CellValue]>| {
        let mut out = Vec::with_capacity(1 + left_width + right_width);
        out.push(key.clone());
        match lrow {
            Some(row) => out.extend(non_key_cells(row, left_key).cloned()),
            None => out.extend(std::iter::repeat(CellValue::Empty).take(left_width)),
        }
        match rrow {
            Some(row) => out.extend(non_key_cells(row, right_key).cloned()),
            None => out.extend(std::iter::repeat(CellValue::Empty).take(right_width)),
        }
        out
    };

    let mut right_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows.iter().enumerate() {
        right_index.entry(row[right_key].to_text()).or_default().push(i);
    }
    let mut right_matched = vec![false; right.rows.len()];

    let mut result = Table::new(columns);
    for lrow in &left.rows {
        let key = &lrow[left_key];
        match right_index.get(&key.to_text()) {
            Some(indices) => {
                for &ri in indices {
                    right_matched[ri] = true;
                    result.rows.push(emit(key, Some(lrow), Some(&right.rows[ri])));
                }
            }
            None => result.rows.push(emit(key, Some(lrow), None)),
        }
    }
    for (ri, rrow) in right.rows.iter().enumerate() {
        if !right_matched[ri] {
            result.rows.push(emit(&rrow[right_key], None, Some(rrow)));
        }
    }
    result
}

fn non_key_names(table: &Table, key_idx: usize) -> impl Iterator<Item = &str> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(move |(i, _)| *i != key_idx)
        .map(|(_, name)| name.as_str())
}

fn non_key_cells(row: &[CellValue], key_idx: usize) -> impl Iterator<Item = &CellValue> {
    row.iter()
        .enumerate()
        .filter(move |(i, _)| *i != key_idx)
        .map(|(_, cell)| cell)
}

/// Run the whole pipeline: normalize both tables, restrict both to their
/// common keys, outer-join, and report counts.
///
/// Only the first table's post-filter emptiness is fatal; an empty common-key
/// set empties the first side too, so no separate guard is needed for the
/// second.
pub fn merge(
    first: Table,
    second: Table,
    key1: &str,
    key2: &str,
) -> Result<MergeOutput, MergeError> {
    let first = normalize("first", first, key1)?;
    let second = normalize("second", second, key2)?;

    let first_rows = first.row_count();
    let second_rows = second.row_count();

    let first_matched = restrict_to_common_keys(&first, &second)?;
    // The keys surviving on the first side are exactly the common ones;
    // restrict the second side to the same set.
    let common = key_set(&first_matched);
    let second_matched = filter_by_keys(&second, &common);

    let common_keys = common.len();
    let table = outer_join(&first_matched, &second_matched);

    let summary = MergeSummary {
        first_rows,
        second_rows,
        first_rows_matched: first_matched.row_count(),
        second_rows_matched: second_matched.row_count(),
        common_keys,
        result_rows: table.row_count(),
        result_columns: table.column_count(),
    };
    Ok(MergeOutput { table, summary })
}
