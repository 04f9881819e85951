//! Shape transformer: normalized sheet + options -> JSON value.
//!
//! Every shape except `array-2d` shares the same preprocessing:
//!
//! 1. rows from `start_row` onwards (default 1, skipping the header row)
//! 2. optionally drop rows whose cells are all null/`""`
//! 3. map headers to output keys via `header_mapping`
//!
//! `array-2d` emits the whole grid, header row included.

use serde_json::{Map, Value};

use super::grouper::group_rows;
use super::infer::infer;
use crate::error::ConvertResult;
use crate::models::{
    is_blank_cell, ConversionOptions, NormalizedSheet, OutputShape, RawCell, RawRow,
};

static NULL_CELL: Value = Value::Null;

/// Transform a normalized sheet into the JSON shape named by `options.shape`.
///
/// Fails only for the grouped shape when `group_by_column` is missing or
/// is not a header of a non-empty sheet.
pub fn transform(sheet: &NormalizedSheet, options: &ConversionOptions) -> ConvertResult<Value> {
    match options.shape {
        OutputShape::ArrayOfObjects => Ok(Value::Array(to_objects(sheet, options))),
        OutputShape::Array2d => Ok(to_array_2d(sheet, options.use_type_conversion)),
        OutputShape::KeyedObject => Ok(Value::Object(to_keyed(sheet, options))),
        OutputShape::Grouped => group_rows(sheet, options).map(Value::Object),
    }
}

/// Rows retained after `start_row` and empty-row filtering.
pub(crate) fn retained_rows<'a>(
    sheet: &'a NormalizedSheet,
    options: &ConversionOptions,
) -> Vec<&'a RawRow> {
    sheet
        .data
        .iter()
        .skip(options.start_row)
        .filter(|row| !options.skip_empty_rows || !row.iter().all(is_blank_cell))
        .collect()
}

/// Output keys for each column, after header mapping.
pub(crate) fn effective_headers<'a>(
    sheet: &'a NormalizedSheet,
    options: &'a ConversionOptions,
) -> Vec<&'a str> {
    sheet
        .headers
        .iter()
        .map(|h| options.display_header(h))
        .collect()
}

pub(crate) fn cell_value(cell: &RawCell, use_type_conversion: bool) -> Value {
    if use_type_conversion {
        infer(cell)
    } else {
        cell.clone()
    }
}

/// Build one record, optionally leaving out a column.
pub(crate) fn row_to_object(
    row: &RawRow,
    headers: &[&str],
    skip_column: Option<usize>,
    use_type_conversion: bool,
) -> Map<String, Value> {
    let mut obj = Map::new();
    for (idx, header) in headers.iter().enumerate() {
        if Some(idx) == skip_column {
            continue;
        }
        let cell = row.get(idx).unwrap_or(&NULL_CELL);
        obj.insert((*header).to_string(), cell_value(cell, use_type_conversion));
    }
    obj
}

fn to_objects(sheet: &NormalizedSheet, options: &ConversionOptions) -> Vec<Value> {
    let headers = effective_headers(sheet, options);
    retained_rows(sheet, options)
        .into_iter()
        .map(|row| Value::Object(row_to_object(row, &headers, None, options.use_type_conversion)))
        .collect()
}

fn to_keyed(sheet: &NormalizedSheet, options: &ConversionOptions) -> Map<String, Value> {
    let headers = effective_headers(sheet, options);
    retained_rows(sheet, options)
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let record = row_to_object(row, &headers, None, options.use_type_conversion);
            ((i + 1).to_string(), Value::Object(record))
        })
        .collect()
}

fn to_array_2d(sheet: &NormalizedSheet, use_type_conversion: bool) -> Value {
    let rows = sheet
        .data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let convert = use_type_conversion && i > 0;
            Value::Array(row.iter().map(|cell| cell_value(cell, convert)).collect())
        })
        .collect();
    Value::Array(rows)
}
