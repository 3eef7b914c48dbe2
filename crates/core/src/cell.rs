use chrono::{NaiveDateTime, Timelike};

/// A single cell of a row-set.
///
/// Input columns carry mixed types; every merge decision that needs a string
/// goes through [`CellValue::to_text`], which is total.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// String form used for display and key normalization.
    ///
    /// Integer-valued numbers print without a decimal point so that a key
    /// column holding `500.0` compares equal to the text "500".
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn integer_numbers_print_without_decimals() {
        assert_eq!(CellValue::Number(500.0).to_text(), "500");
        assert_eq!(CellValue::Number(-3.0).to_text(), "-3");
        assert_eq!(CellValue::Number(2.5).to_text(), "2.5");
    }

    #[test]
    fn booleans_print_as_excel_literals() {
        assert_eq!(CellValue::Bool(true).to_text(), "TRUE");
        assert_eq!(CellValue::Bool(false).to_text(), "FALSE");
    }

    #[test]
    fn midnight_datetimes_print_date_only() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 17).unwrap();
        let midnight = date.and_hms_opt(0, 0, 0).unwrap();
        let afternoon = date.and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(CellValue::DateTime(midnight).to_text(), "2026-01-17");
        assert_eq!(CellValue::DateTime(afternoon).to_text(), "2026-01-17 14:30:00");
    }

    #[test]
    fn empty_prints_as_empty_string() {
        assert_eq!(CellValue::Empty.to_text(), "");
        assert!(CellValue::Empty.is_empty());
        assert!(!CellValue::Text(String::new()).is_empty());
    }
}
