//! Column quality audit: duplicate and empty values.
//!
//! Row numbers in the report match the spreadsheet's own numbering: the
//! header is row 1, so the first data row is row 2.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetjson::{normalize_sheet, validate_column};
//!
//! let report = validate_column(&sheet, "email").expect("column exists");
//! for dup in &report.duplicates {
//!     println!("{} appears {} times (rows {:?})", dup.value, dup.occurrence_count, dup.row_numbers);
//! }
//! ```

use std::collections::HashMap;

use crate::models::{cell_to_string, DuplicateGroup, NormalizedSheet, ValidationReport};

/// Offset from a zero-based data-row index to the spreadsheet row number.
const FIRST_DATA_ROW: usize = 2;

/// Audit one column of a normalized sheet.
///
/// Returns `None` when no column is selected, the column is not a header,
/// or the sheet has no data rows.
pub fn validate_column(sheet: &NormalizedSheet, column: &str) -> Option<ValidationReport> {
    if column.is_empty() || sheet.data.len() <= 1 {
        return None;
    }
    let column_idx = sheet.column_index(column)?;

    let data_rows = &sheet.data[1..];
    let mut order: Vec<String> = Vec::new();
    let mut occurrences: HashMap<String, Vec<usize>> = HashMap::new();
    let mut empty_count = 0;

    for (index, row) in data_rows.iter().enumerate() {
        let value = row
            .get(column_idx)
            .map(|cell| cell_to_string(cell).trim().to_string())
            .unwrap_or_default();

        if value.is_empty() {
            empty_count += 1;
            continue;
        }

        let rows = occurrences.entry(value.clone()).or_insert_with(|| {
            order.push(value);
            Vec::new()
        });
        rows.push(index + FIRST_DATA_ROW);
    }

    let mut duplicates: Vec<DuplicateGroup> = order
        .iter()
        .filter_map(|value| {
            let rows = occurrences.get(value)?;
            (rows.len() > 1).then(|| DuplicateGroup {
                value: value.clone(),
                occurrence_count: rows.len(),
                row_numbers: rows.clone(),
            })
        })
        .collect();

    // stable: ties keep first-seen order
    duplicates.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));

    Some(ValidationReport {
        column: column.to_string(),
        total_data_rows: data_rows.len(),
        unique_value_count: occurrences.len(),
        duplicate_value_count: duplicates.iter().map(|d| d.occurrence_count).sum(),
        empty_count,
        duplicates,
    })
}
