// Spreadsheet file I/O

pub mod xlsx;

/// Worksheet name written to exported workbooks.
pub const OUTPUT_SHEET: &str = "Dados Completos";

/// File name the merged workbook is delivered under.
pub const OUTPUT_FILE_NAME: &str = "dados_completos.xlsx";
