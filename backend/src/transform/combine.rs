//! Multi-sheet combiner.
//!
//! Applies the same options to every sheet, then either concatenates the
//! results into one document or keeps them keyed by sheet name.

use serde_json::{Map, Value};

use super::shape::transform;
use crate::error::ConvertResult;
use crate::models::{CombineMode, ConversionOptions, NormalizedSheet, OutputShape};

/// Transform every sheet and merge the results.
///
/// The first failing sheet aborts the combine; its error names the sheet.
pub fn combine_sheets(
    sheets: &[&NormalizedSheet],
    options: &ConversionOptions,
    mode: CombineMode,
) -> ConvertResult<Value> {
    match mode {
        CombineMode::BySheet => {
            let mut by_sheet = Map::new();
            for sheet in sheets {
                let value = transform(sheet, options).map_err(|e| e.in_sheet(&sheet.name))?;
                by_sheet.insert(sheet.name.clone(), value);
            }
            Ok(Value::Object(by_sheet))
        }
        CombineMode::Concat => {
            let mut merged = Merged::default();
            for sheet in sheets {
                let value = transform(sheet, options).map_err(|e| e.in_sheet(&sheet.name))?;
                merged.push(value);
            }
            Ok(merged.finish(options))
        }
    }
}

/// Accumulator for the concatenated document.
#[derive(Default)]
struct Merged {
    items: Vec<Value>,
    groups: Map<String, Value>,
}

impl Merged {
    fn push(&mut self, value: Value) {
        match value {
            Value::Array(items) => self.items.extend(items),
            Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        // grouped: append into the existing group
                        Value::Array(records) => {
                            let bucket = self
                                .groups
                                .entry(key)
                                .or_insert_with(|| Value::Array(Vec::new()));
                            if let Value::Array(existing) = bucket {
                                existing.extend(records);
                            }
                        }
                        // keyed: renumbered in finish()
                        record => self.items.push(record),
                    }
                }
            }
            other => self.items.push(other),
        }
    }

    fn finish(self, options: &ConversionOptions) -> Value {
        match options.shape {
            OutputShape::ArrayOfObjects | OutputShape::Array2d => Value::Array(self.items),
            OutputShape::KeyedObject => Value::Object(
                self.items
                    .into_iter()
                    .enumerate()
                    .map(|(i, record)| ((i + 1).to_string(), record))
                    .collect(),
            ),
            OutputShape::Grouped => Value::Object(self.groups),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::normalize::normalize_sheet;
    use serde_json::json;

    fn sheet(name: &str, rows: Value) -> NormalizedSheet {
        normalize_sheet(&serde_json::from_value(rows).unwrap(), name)
    }

    fn q1() -> NormalizedSheet {
        sheet("Q1", json!([["name", "dept"], ["Alice", "X"], ["Bob", "Y"]]))
    }

    fn q2() -> NormalizedSheet {
        sheet("Q2", json!([["name", "dept"], ["Cara", "X"]]))
    }

    fn opts(shape: OutputShape) -> ConversionOptions {
        ConversionOptions {
            shape,
            ..ConversionOptions::default()
        }
    }

    #[test]
    fn test_concat_arrays() {
        let (a, b) = (q1(), q2());
        let out = combine_sheets(&[&a, &b], &opts(OutputShape::ArrayOfObjects), CombineMode::Concat)
            .unwrap();
        assert_eq!(
            out,
            json!([
                {"name": "Alice", "dept": "X"},
                {"name": "Bob", "dept": "Y"},
                {"name": "Cara", "dept": "X"}
            ])
        );
    }

    #[test]
    fn test_by_sheet() {
        let (a, b) = (q1(), q2());
        let options = opts(OutputShape::ArrayOfObjects);
        let out = combine_sheets(&[&a, &b], &options, CombineMode::BySheet).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["Q1", "Q2"]);
        assert_eq!(out["Q2"], json!([{"name": "Cara", "dept": "X"}]));
    }

    #[test]
    fn test_concat_keyed_renumbers() {
        let (a, b) = (q1(), q2());
        let out = combine_sheets(&[&a, &b], &opts(OutputShape::KeyedObject), CombineMode::Concat)
            .unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
        assert_eq!(out["3"]["name"], "Cara");
    }

    #[test]
    fn test_concat_grouped_merges_groups() {
        let (a, b) = (q1(), q2());
        let options = ConversionOptions {
            group_by_column: Some("dept".into()),
            ..opts(OutputShape::Grouped)
        };
        let out = combine_sheets(&[&a, &b], &options, CombineMode::Concat).unwrap();
        assert_eq!(
            out,
            json!({"X": [{"name": "Alice"}, {"name": "Cara"}], "Y": [{"name": "Bob"}]})
        );
    }

    #[test]
    fn test_error_names_offending_sheet() {
        let a = q1();
        let b = sheet("NoDept", json!([["name"], ["Zed"]]));
        let options = ConversionOptions {
            group_by_column: Some("dept".into()),
            ..opts(OutputShape::Grouped)
        };
        let err = combine_sheets(&[&a, &b], &options, CombineMode::BySheet).unwrap_err();
        assert!(err.to_string().contains("NoDept"));
    }

    #[test]
    fn test_no_sheets() {
        let out =
            combine_sheets(&[], &opts(OutputShape::ArrayOfObjects), CombineMode::Concat).unwrap();
        assert_eq!(out, json!([]));
        let out = combine_sheets(&[], &opts(OutputShape::Grouped), CombineMode::BySheet).unwrap();
        assert_eq!(out, json!({}));
    }
}
