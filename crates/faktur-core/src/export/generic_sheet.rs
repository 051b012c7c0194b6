//! Two-column key/value workbook for arbitrary documents.

use rust_xlsxwriter::Workbook;

use crate::error::{ExportError, Result};
use crate::flatten::FlatRow;

use super::{Cell, SheetRow, write_sheet};

/// Header row followed by one `path | value` row per flattened leaf.
pub fn generic_layout(rows: &[FlatRow]) -> Vec<SheetRow> {
    let mut layout = Vec::with_capacity(rows.len() + 1);
    layout.push(SheetRow::Header(vec!["Key".to_string(), "Value".to_string()]));
    layout.extend(
        rows.iter()
            .map(|row| SheetRow::Field(row.path.clone(), Cell::from_json(Some(&row.value)))),
    );
    layout
}

/// Build a workbook with a single key/value sheet.
pub fn generic_workbook(rows: &[FlatRow], sheet_name: &str) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, sheet_name, &generic_layout(rows)).map_err(ExportError::Xlsx)?;
    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::to_bytes;
    use crate::flatten::flatten;
    use serde_json::json;

    #[test]
    fn test_generic_layout() {
        let rows = flatten(&json!({"name": "Jane", "skills": ["Rust", "SQL"], "years": 7})).unwrap();
        let layout = generic_layout(&rows);

        assert_eq!(layout.len(), 5);
        assert_eq!(layout[0], SheetRow::Header(vec!["Key".to_string(), "Value".to_string()]));
        assert_eq!(layout[2], SheetRow::field("skills [1]", Cell::Text("Rust".to_string())));
        assert_eq!(layout[4], SheetRow::field("years", Cell::Number(7.0)));
    }

    #[test]
    fn test_generic_workbook() {
        let rows = flatten(&json!({"a": 1})).unwrap();
        let mut workbook = generic_workbook(&rows, "CV").unwrap();
        assert!(to_bytes(&mut workbook).unwrap().starts_with(b"PK"));
    }
}
