// Excel file import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: first worksheet only, first row is the header.
// Export: a single worksheet holding the merged table.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::Timelike;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use tabmerge_core::{CellValue, Table};

use crate::OUTPUT_SHEET;

/// Read the first worksheet of a spreadsheet file into a [`Table`].
pub fn read_table(path: &Path) -> Result<Table, String> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("cannot open {}: {e}", path.display()))?;
    first_sheet_table(&mut workbook)
}

/// Read the first worksheet of an in-memory spreadsheet payload.
pub fn read_table_from_bytes(bytes: &[u8]) -> Result<Table, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| format!("cannot read workbook: {e}"))?;
    first_sheet_table(&mut workbook)
}

fn first_sheet_table<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Table, String> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "workbook has no sheets".to_string())?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("cannot read sheet '{sheet_name}': {e}"))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| format!("sheet '{sheet_name}' has no header row"))?;

    let columns = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = convert_cell(cell).to_text().trim().to_string();
            if name.is_empty() {
                format!("Column{}", i + 1)
            } else {
                name
            }
        })
        .collect();

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(convert_cell).collect());
    }
    Ok(table)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            // Out-of-range serials keep their raw value
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Write a table to an xlsx file.
pub fn write_table(table: &Table, path: &Path) -> Result<(), String> {
    let mut workbook = build_workbook(table)?;
    workbook
        .save(path)
        .map_err(|e| format!("failed to save {}: {e}", path.display()))
}

/// Serialize a table to xlsx bytes.
pub fn write_table_to_bytes(table: &Table) -> Result<Vec<u8>, String> {
    let mut workbook = build_workbook(table)?;
    workbook
        .save_to_buffer()
        .map_err(|e| format!("failed to serialize workbook: {e}"))
}

fn build_workbook(table: &Table) -> Result<XlsxWorkbook, String> {
    let mut workbook = XlsxWorkbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(OUTPUT_SHEET)
        .map_err(|e| format!("failed to create sheet '{OUTPUT_SHEET}': {e}"))?;

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header_format)
            .map_err(|e| format!("failed to write header '{name}': {e}"))?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let row_idx = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let col_idx = c as u16;
            let written = match cell {
                CellValue::Empty => continue,
                CellValue::Text(s) => worksheet.write_string(row_idx, col_idx, s),
                CellValue::Number(n) => worksheet.write_number(row_idx, col_idx, *n),
                CellValue::Bool(b) => worksheet.write_boolean(row_idx, col_idx, *b),
                CellValue::DateTime(dt) => {
                    let format = if dt.time().num_seconds_from_midnight() == 0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    worksheet.write_datetime_with_format(row_idx, col_idx, dt, format)
                }
            };
            written.map_err(|e| format!("failed to write cell ({row_idx},{col_idx}): {e}"))?;
        }
    }

    worksheet.autofit();
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_table() -> Table {
        let mut table = Table::new(vec![
            "comum".into(),
            "Pop".into(),
            "Ativo".into(),
            "Desde".into(),
        ]);
        table.push_row(vec![
            CellValue::Text("LISBON".into()),
            CellValue::Number(500.0),
            CellValue::Bool(true),
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            ),
        ]);
        table.push_row(vec![
            CellValue::Text("PORTO".into()),
            CellValue::Empty,
            CellValue::Bool(false),
            CellValue::Empty,
        ]);
        table
    }

    #[test]
    fn bytes_roundtrip_preserves_typed_cells() {
        let table = sample_table();
        let bytes = write_table_to_bytes(&table).unwrap();
        let back = read_table_from_bytes(&bytes).unwrap();

        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows.len(), 2);
        assert_eq!(back.rows[0][0], CellValue::Text("LISBON".into()));
        assert_eq!(back.rows[0][1], CellValue::Number(500.0));
        assert_eq!(back.rows[0][2], CellValue::Bool(true));
        assert_eq!(
            back.rows[0][3],
            CellValue::DateTime(
                NaiveDate::from_ymd_opt(2020, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
            )
        );
        assert_eq!(back.rows[1][1], CellValue::Empty);
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        let table = sample_table();
        write_table(&table, &path).unwrap();
        let back = read_table(&path).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows.len(), table.rows.len());
    }

    #[test]
    fn blank_header_cells_get_generated_names() {
        let mut workbook = XlsxWorkbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "A").unwrap();
        worksheet.write_string(0, 2, "C").unwrap();
        worksheet.write_number(1, 0, 1.0).unwrap();
        worksheet.write_number(1, 1, 2.0).unwrap();
        worksheet.write_number(1, 2, 3.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = read_table_from_bytes(&bytes).unwrap();
        assert_eq!(table.columns, vec!["A", "Column2", "C"]);
        assert_eq!(table.rows[0][1], CellValue::Number(2.0));
    }

    #[test]
    fn workbook_without_rows_is_an_error() {
        let mut workbook = XlsxWorkbook::new();
        let _ = workbook.add_worksheet();
        let bytes = workbook.save_to_buffer().unwrap();
        assert!(read_table_from_bytes(&bytes).is_err());
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(read_table_from_bytes(b"not a spreadsheet").is_err());
    }
}
