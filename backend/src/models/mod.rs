//! Domain models for the sheetjson conversion pipeline.
//!
//! - [`RawCell`] / [`RawGrid`] - Decoder output, one grid per sheet
//! - [`NormalizedSheet`] - Sheet with trimmed headers and pruned columns
//! - [`SheetInfo`] - Sheet metadata (used-range extent)
//! - [`ConversionOptions`] - How a sheet is shaped into JSON
//! - [`OutputShape`] / [`JsonFormat`] / [`CombineMode`] - The three output axes
//! - [`ValidationReport`] - Duplicate/empty audit of one column

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Raw decoder output
// =============================================================================

/// An untyped scalar produced by the decoder.
///
/// The decoder stringifies every non-empty cell, so this is normally
/// `Value::Null` or `Value::String`.
pub type RawCell = Value;

/// One row of raw cells. Rows may be ragged.
pub type RawRow = Vec<RawCell>;

/// Row-major grid of raw cells.
pub type RawGrid = Vec<RawRow>;

/// String form of a cell: null becomes `""`, strings are taken as-is,
/// everything else is printed the way JSON prints it.
pub fn cell_to_string(cell: &RawCell) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True for null and the empty string (whitespace is *not* blank).
pub fn is_blank_cell(cell: &RawCell) -> bool {
    match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// =============================================================================
// Sheets
// =============================================================================

/// Sheet metadata reported by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub name: String,
    pub row_count: usize,
    pub col_count: usize,
}

/// A sheet after header extraction and blank-header column pruning.
///
/// `data` still contains the header row at index 0. Every row has
/// exactly `headers.len()` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub data: RawGrid,
}

impl NormalizedSheet {
    /// An empty sheet: no headers, no rows.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Number of rows after the header row.
    pub fn data_row_count(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    /// Index of the first header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

// =============================================================================
// Output axes
// =============================================================================

/// How rows are structured in the resulting JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputShape {
    /// `[{header: value, ...}, ...]`
    #[default]
    #[serde(rename = "array-of-objects")]
    ArrayOfObjects,
    /// `[[header, ...], [value, ...], ...]`
    #[serde(rename = "array-2d")]
    Array2d,
    /// `{"1": {...}, "2": {...}}`
    #[serde(rename = "keyed-object")]
    KeyedObject,
    /// `{groupKey: [{...}, ...]}`
    #[serde(rename = "grouped")]
    Grouped,
}

impl OutputShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArrayOfObjects => "array-of-objects",
            Self::Array2d => "array-2d",
            Self::KeyedObject => "keyed-object",
            Self::Grouped => "grouped",
        }
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "array-of-objects" | "objects" => Ok(Self::ArrayOfObjects),
            "array-2d" | "2d" => Ok(Self::Array2d),
            "keyed-object" | "keyed" => Ok(Self::KeyedObject),
            "grouped" => Ok(Self::Grouped),
            other => Err(format!(
                "unknown shape '{}' (expected array-of-objects, array-2d, keyed-object or grouped)",
                other
            )),
        }
    }
}

/// How the final value is delimited as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsonFormat {
    /// One compact document per line.
    Newline,
    /// Compact documents joined by `",\n"`.
    CommaNewline,
    /// The whole value, pretty-printed with 2-space indentation.
    #[default]
    Array,
}

impl fmt::Display for JsonFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newline => "newline",
            Self::CommaNewline => "comma-newline",
            Self::Array => "array",
        })
    }
}

impl FromStr for JsonFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newline" | "ndjson" => Ok(Self::Newline),
            "comma-newline" => Ok(Self::CommaNewline),
            "array" | "pretty" => Ok(Self::Array),
            other => Err(format!(
                "unknown format '{}' (expected newline, comma-newline or array)",
                other
            )),
        }
    }
}

/// How several sheets are merged into one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineMode {
    /// One flat document: results concatenated end-to-end.
    #[default]
    Concat,
    /// `{sheetName: result}`
    BySheet,
}

// =============================================================================
// Conversion options
// =============================================================================

fn default_start_row() -> usize {
    1
}

/// Options controlling how a normalized sheet becomes JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Output shape.
    #[serde(default)]
    pub shape: OutputShape,

    /// Run every cell through the type inferencer.
    #[serde(default)]
    pub use_type_conversion: bool,

    /// Column to group by (grouped shape only, pre-mapping name).
    #[serde(default)]
    pub group_by_column: Option<String>,

    /// Drop rows where every cell is null or `""`.
    #[serde(default)]
    pub skip_empty_rows: bool,

    /// First row of `data` to emit (1 skips the header row).
    #[serde(default = "default_start_row")]
    pub start_row: usize,

    /// Original header -> output key.
    #[serde(default)]
    pub header_mapping: HashMap<String, String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            shape: OutputShape::default(),
            use_type_conversion: false,
            group_by_column: None,
            skip_empty_rows: false,
            start_row: default_start_row(),
            header_mapping: HashMap::new(),
        }
    }
}

impl ConversionOptions {
    /// Parse options from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Output key for an original header.
    pub fn display_header<'a>(&'a self, header: &'a str) -> &'a str {
        match self.header_mapping.get(header) {
            Some(mapped) if !mapped.is_empty() => mapped,
            _ => header,
        }
    }
}

// =============================================================================
// Validation report
// =============================================================================

/// A value that occurs more than once in the audited column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub value: String,
    pub occurrence_count: usize,
    /// 1-based spreadsheet row numbers (header is row 1).
    pub row_numbers: Vec<usize>,
}

/// Duplicate/empty audit of a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub column: String,
    pub total_data_rows: usize,
    pub unique_value_count: usize,
    pub duplicate_value_count: usize,
    pub empty_count: usize,
    pub duplicates: Vec<DuplicateGroup>,
}

impl ValidationReport {
    pub fn has_issues(&self) -> bool {
        !self.duplicates.is_empty() || self.empty_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_defaults_from_empty_json() {
        let opts = ConversionOptions::from_json("{}").unwrap();
        assert_eq!(opts, ConversionOptions::default());
        assert_eq!(opts.start_row, 1);
        assert_eq!(opts.shape, OutputShape::ArrayOfObjects);
    }

    #[test]
    fn test_options_camel_case_keys() {
        let opts = ConversionOptions::from_json(
            r#"{"shape":"grouped","groupByColumn":"dept","useTypeConversion":true,
                "headerMapping":{"name":"Name"}}"#,
        )
        .unwrap();
        assert_eq!(opts.shape, OutputShape::Grouped);
        assert_eq!(opts.group_by_column.as_deref(), Some("dept"));
        assert!(opts.use_type_conversion);
        assert_eq!(opts.display_header("name"), "Name");
        assert_eq!(opts.display_header("dept"), "dept");
    }

    #[test]
    fn test_empty_mapping_falls_back() {
        let mut opts = ConversionOptions::default();
        opts.header_mapping.insert("a".into(), String::new());
        assert_eq!(opts.display_header("a"), "a");
    }

    #[test]
    fn test_shape_parsing() {
        assert_eq!("array-2d".parse::<OutputShape>(), Ok(OutputShape::Array2d));
        assert_eq!("Keyed-Object".parse::<OutputShape>(), Ok(OutputShape::KeyedObject));
        assert!("tree".parse::<OutputShape>().is_err());
        assert_eq!(
            serde_json::to_value(OutputShape::Array2d).unwrap(),
            json!("array-2d")
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("comma-newline".parse::<JsonFormat>(), Ok(JsonFormat::CommaNewline));
        assert_eq!(JsonFormat::default(), JsonFormat::Array);
        assert_eq!(JsonFormat::Newline.to_string(), "newline");
    }

    #[test]
    fn test_cell_helpers() {
        assert_eq!(cell_to_string(&json!(null)), "");
        assert_eq!(cell_to_string(&json!("x")), "x");
        assert_eq!(cell_to_string(&json!(10)), "10");
        assert!(is_blank_cell(&json!("")));
        assert!(!is_blank_cell(&json!(" ")));
        assert!(!is_blank_cell(&json!(0)));
    }
}
