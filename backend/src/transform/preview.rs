//! Sheet preview: the first rows of a normalized sheet.

use serde::Serialize;

use crate::models::{NormalizedSheet, RawGrid};

/// Rows shown when no limit is given.
pub const DEFAULT_PREVIEW_ROWS: usize = 50;

/// Leading data rows of a sheet plus how many there are in total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPreview {
    pub sheet: String,
    pub headers: Vec<String>,
    /// Data rows only, header row excluded.
    pub rows: RawGrid,
    pub total_rows: usize,
}

impl SheetPreview {
    pub fn shown_rows(&self) -> usize {
        self.rows.len()
    }

    /// More data rows exist than are shown.
    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }
}

/// Take at most `max_rows` data rows of `sheet`.
pub fn preview_sheet(sheet: &NormalizedSheet, max_rows: usize) -> SheetPreview {
    SheetPreview {
        sheet: sheet.name.clone(),
        headers: sheet.headers.clone(),
        rows: sheet.data.iter().skip(1).take(max_rows).cloned().collect(),
        total_rows: sheet.data_row_count(),
    }
}
