//! High-level conversion API.
//!
//! Combines decoding, normalization, shaping, combining and formatting.
//! File access goes through [`FileReader`] / [`FileWriter`] so the
//! orchestration can run against the filesystem or in memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetjson::pipeline::{ConvertRequest, Converter};
//! use std::path::Path;
//!
//! let mut converter = Converter::fs();
//! let output = converter.convert_file(Path::new("staff.xlsx"), &ConvertRequest::default())?;
//! println!("{}", output.content);
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use super::combine::combine_sheets;
use super::format::{document_count, format_document};
use super::preview::{preview_sheet, SheetPreview};
use crate::api::logs::{log_error_indent, log_info, log_info_indent, log_success, log_warning};
use crate::cache::{CachedWorkbook, SheetCache, SheetSelection};
use crate::error::{DecodeError, PipelineResult};
use crate::models::{CombineMode, ConversionOptions, JsonFormat, ValidationReport};
use crate::validation;

/// File name suggested when several sheets end up in one document.
pub const MULTI_SHEET_FILE_NAME: &str = "multiple-sheets.json";

// =============================================================================
// File access
// =============================================================================

/// Source of spreadsheet bytes.
pub trait FileReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Sink for converted documents.
pub trait FileWriter {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileReader;

impl FileReader for FsFileReader {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileWriter;

impl FileWriter for FsFileWriter {
    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, contents)
    }
}

// =============================================================================
// Requests and results
// =============================================================================

/// Everything a single conversion needs besides the source.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    pub options: ConversionOptions,
    pub format: JsonFormat,
    pub sheets: SheetSelection,
    pub combine: CombineMode,
}

/// A converted document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutput {
    /// The combined JSON value before formatting.
    pub value: Value,
    /// Formatted text.
    pub content: String,
    /// Names of the sheets that were converted.
    pub sheets: Vec<String>,
    /// Number of documents in `content`.
    pub documents: usize,
    pub suggested_file_name: String,
}

/// Convert an already normalized workbook.
pub fn convert_workbook(
    workbook: &CachedWorkbook,
    request: &ConvertRequest,
) -> PipelineResult<ConversionOutput> {
    let selected = workbook.select(&request.sheets)?;
    let names: Vec<String> = selected.iter().map(|s| s.name.clone()).collect();

    let value = combine_sheets(&selected, &request.options, request.combine)?;
    let content = format_document(&value, request.format)?;

    let suggested_file_name = match names.as_slice() {
        [single] => format!("{}.json", single),
        _ => MULTI_SHEET_FILE_NAME.to_string(),
    };

    Ok(ConversionOutput {
        documents: document_count(&value),
        value,
        content,
        sheets: names,
        suggested_file_name,
    })
}

// =============================================================================
// Batch
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Completed,
    Error,
}

/// Outcome of one file in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub path: PathBuf,
    pub state: FileState,
    pub output: Option<PathBuf>,
    pub documents: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileStatus>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.state == FileState::Completed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.completed()
    }
}

// =============================================================================
// Converter
// =============================================================================

/// Stateful converter: file access plus the session sheet cache.
pub struct Converter<R, W> {
    reader: R,
    writer: W,
    cache: SheetCache,
}

impl Converter<FsFileReader, FsFileWriter> {
    /// Converter backed by the local filesystem.
    pub fn fs() -> Self {
        Self::new(FsFileReader, FsFileWriter)
    }
}

impl<R: FileReader, W: FileWriter> Converter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_cache(reader, writer, SheetCache::new())
    }

    pub fn with_cache(reader: R, writer: W, cache: SheetCache) -> Self {
        Self { reader, writer, cache }
    }

    pub fn cache(&self) -> &SheetCache {
        &self.cache
    }

    /// Read and normalize a source, reusing the cache when unchanged.
    pub fn load(&mut self, path: &Path) -> PipelineResult<&CachedWorkbook> {
        let bytes = self.reader.read(path).map_err(DecodeError::Io)?;
        let key = path.to_string_lossy();
        let workbook = self.cache.load(&key, &bytes)?;
        Ok(workbook)
    }

    /// Convert one file and return the formatted document.
    pub fn convert_file(
        &mut self,
        path: &Path,
        request: &ConvertRequest,
    ) -> PipelineResult<ConversionOutput> {
        log_info(format!("📖 Reading {}", path.display()));
        let workbook = self.load(path)?;
        for info in &workbook.infos {
            log_info_indent(
                format!("{} ({} rows × {} columns)", info.name, info.row_count, info.col_count),
                1,
            );
        }

        let output = convert_workbook(workbook, request)?;
        log_success(format!(
            "Converted {} sheet(s) into {} document(s)",
            output.sheets.len(),
            output.documents
        ));
        Ok(output)
    }

    /// Convert one file and write the result to `output_path`.
    pub fn convert_to_file(
        &mut self,
        input: &Path,
        output_path: &Path,
        request: &ConvertRequest,
    ) -> PipelineResult<ConversionOutput> {
        let output = self.convert_file(input, request)?;
        self.writer.write(output_path, &output.content)?;
        log_success(format!("Wrote {}", output_path.display()));
        Ok(output)
    }

    /// Audit a column of one sheet (the first sheet when `sheet` is `None`).
    pub fn validate_column(
        &mut self,
        input: &Path,
        sheet: Option<&str>,
        column: &str,
    ) -> PipelineResult<Option<ValidationReport>> {
        let workbook = self.load(input)?;
        let selection = match sheet {
            Some(name) => SheetSelection::Named(vec![name.to_string()]),
            None => SheetSelection::First,
        };
        let selected = workbook.select(&selection)?;
        let report = selected
            .first()
            .and_then(|s| validation::validate_column(s, column));

        match &report {
            Some(r) if r.has_issues() => log_warning(format!(
                "Column '{}': {} duplicate value(s), {} empty",
                column,
                r.duplicates.len(),
                r.empty_count
            )),
            Some(_) => log_success(format!("Column '{}' has no duplicates or blanks", column)),
            None => log_warning(format!("Column '{}' has nothing to validate", column)),
        }
        Ok(report)
    }

    /// First `max_rows` data rows of one sheet (the first sheet when
    /// `sheet` is `None`).
    pub fn preview(
        &mut self,
        input: &Path,
        sheet: Option<&str>,
        max_rows: usize,
    ) -> PipelineResult<SheetPreview> {
        let workbook = self.load(input)?;
        let preview = preview_workbook(workbook, sheet, max_rows)?;
        log_info(format!(
            "Previewing {} of {} row(s) of '{}'",
            preview.shown_rows(),
            preview.total_rows,
            preview.sheet
        ));
        Ok(preview)
    }

    /// Convert each input independently; one failure does not stop the rest.
    ///
    /// Every input is written next to itself with a `.json` extension.
    pub fn convert_batch(&mut self, inputs: &[PathBuf], request: &ConvertRequest) -> BatchReport {
        let mut report = BatchReport::default();
        log_info(format!("🔄 Converting {} file(s)", inputs.len()));

        for input in inputs {
            let output_path = input.with_extension("json");
            let status = match self.convert_to_file(input, &output_path, request) {
                Ok(output) => FileStatus {
                    path: input.clone(),
                    state: FileState::Completed,
                    output: Some(output_path),
                    documents: output.documents,
                    error: None,
                },
                Err(e) => {
                    log_error_indent(format!("{}: {}", input.display(), e), 1);
                    FileStatus {
                        path: input.clone(),
                        state: FileState::Error,
                        output: None,
                        documents: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.files.push(status);
        }

        if report.failed() > 0 {
            log_warning(format!(
                "{} of {} file(s) failed",
                report.failed(),
                report.files.len()
            ));
        } else {
            log_success(format!("All {} file(s) converted", report.completed()));
        }
        report
    }
}

/// Preview one sheet of a loaded workbook.
pub fn preview_workbook(
    workbook: &CachedWorkbook,
    sheet: Option<&str>,
    max_rows: usize,
) -> PipelineResult<SheetPreview> {
    let selection = match sheet {
        Some(name) => SheetSelection::Named(vec![name.to_string()]),
        None => SheetSelection::First,
    };
    let selected = workbook.select(&selection)?;
    let sheet = selected.first().ok_or(DecodeError::NoSheets)?;
    Ok(preview_sheet(sheet, max_rows))
}

/// Request used by batch mode: every sheet, concatenated.
pub fn batch_request(options: ConversionOptions, format: JsonFormat) -> ConvertRequest {
    ConvertRequest {
        options,
        format,
        sheets: SheetSelection::All,
        combine: CombineMode::Concat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConvertError, PipelineError};
    use crate::models::OutputShape;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryFiles {
        files: RefCell<HashMap<PathBuf, Vec<u8>>>,
    }

    impl MemoryFiles {
        fn with(files: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (path, content) in files {
                store
                    .files
                    .borrow_mut()
                    .insert(PathBuf::from(path), content.as_bytes().to_vec());
            }
            store
        }

        fn text(&self, path: &str) -> Option<String> {
            self.files
                .borrow()
                .get(Path::new(path))
                .map(|b| String::from_utf8_lossy(b).into_owned())
        }
    }

    impl FileReader for &MemoryFiles {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }
    }

    impl FileWriter for &MemoryFiles {
        fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), contents.as_bytes().to_vec());
            Ok(())
        }
    }

    const STAFF: &str = "name,dept\nAlice,X\nBob,Y\nCara,X";

    #[test]
    fn test_convert_file_default_request() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);

        let output = converter
            .convert_file(Path::new("staff.csv"), &ConvertRequest::default())
            .unwrap();

        assert_eq!(output.sheets, vec!["staff"]);
        assert_eq!(output.documents, 3);
        assert_eq!(output.suggested_file_name, "staff.json");
        assert_eq!(output.value[1], json!({"name": "Bob", "dept": "Y"}));
        assert!(output.content.starts_with("[\n  {"));
    }

    #[test]
    fn test_grouped_newline_request() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);
        let request = ConvertRequest {
            options: ConversionOptions {
                shape: OutputShape::Grouped,
                group_by_column: Some("dept".into()),
                ..Default::default()
            },
            format: JsonFormat::Newline,
            ..Default::default()
        };

        let output = converter.convert_file(Path::new("staff.csv"), &request).unwrap();
        assert_eq!(
            output.content,
            r#"{"X":[{"name":"Alice"},{"name":"Cara"}],"Y":[{"name":"Bob"}]}"#
        );
    }

    #[test]
    fn test_missing_group_column_is_config_error() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);
        let request = ConvertRequest {
            options: ConversionOptions {
                shape: OutputShape::Grouped,
                ..Default::default()
            },
            ..Default::default()
        };

        let err = converter
            .convert_file(Path::new("staff.csv"), &request)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Convert(ConvertError::Sheet { .. })));
    }

    #[test]
    fn test_unknown_sheet() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);
        let request = ConvertRequest {
            sheets: SheetSelection::Named(vec!["Other".into()]),
            ..Default::default()
        };

        let err = converter
            .convert_file(Path::new("staff.csv"), &request)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(DecodeError::SheetNotFound(_))));
    }

    #[test]
    fn test_convert_to_file_writes_content() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);
        let request = ConvertRequest {
            format: JsonFormat::CommaNewline,
            ..Default::default()
        };

        converter
            .convert_to_file(Path::new("staff.csv"), Path::new("out/staff.json"), &request)
            .unwrap();
        let written = files.text("out/staff.json").unwrap();
        assert_eq!(written.lines().count(), 3);
        assert!(written.lines().next().unwrap().ends_with("},"));
    }

    #[test]
    fn test_load_uses_cache() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);

        let first = converter.load(Path::new("staff.csv")).unwrap().loaded_at;
        let second = converter.load(Path::new("staff.csv")).unwrap().loaded_at;
        assert_eq!(first, second);
        assert_eq!(converter.cache().len(), 1);
    }

    #[test]
    fn test_validate_column() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);

        let report = converter
            .validate_column(Path::new("staff.csv"), None, "dept")
            .unwrap()
            .unwrap();
        assert_eq!(report.duplicates[0].value, "X");
        assert_eq!(report.duplicates[0].row_numbers, vec![2, 4]);

        let none = converter
            .validate_column(Path::new("staff.csv"), None, "missing")
            .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_preview() {
        let files = MemoryFiles::with(&[("staff.csv", STAFF)]);
        let mut converter = Converter::new(&files, &files);

        let preview = converter.preview(Path::new("staff.csv"), None, 2).unwrap();
        assert_eq!(preview.sheet, "staff");
        assert_eq!(preview.headers, vec!["name", "dept"]);
        assert_eq!(preview.total_rows, 3);
        assert!(preview.is_truncated());
        assert_eq!(
            Value::Array(preview.rows.into_iter().map(Value::Array).collect()),
            json!([["Alice", "X"], ["Bob", "Y"]])
        );

        let err = converter
            .preview(Path::new("staff.csv"), Some("Other"), 2)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(DecodeError::SheetNotFound(_))));
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let files = MemoryFiles::with(&[("a.csv", STAFF), ("c.csv", "id\n1")]);
        let mut converter = Converter::new(&files, &files);
        let inputs = vec![
            PathBuf::from("a.csv"),
            PathBuf::from("missing.csv"),
            PathBuf::from("c.csv"),
        ];

        let report = converter.convert_batch(
            &inputs,
            &batch_request(ConversionOptions::default(), JsonFormat::Newline),
        );

        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.files[1].state, FileState::Error);
        assert!(report.files[1].error.is_some());
        assert_eq!(files.text("c.json").unwrap(), r#"{"id":"1"}"#);
        assert_eq!(files.text("a.json").unwrap().lines().count(), 3);
    }

    #[test]
    fn test_fs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("people.csv");
        std::fs::write(&input, "name;age\nAlice;30\nBob;25\n").unwrap();

        let mut converter = Converter::fs();
        let request = ConvertRequest {
            options: ConversionOptions {
                use_type_conversion: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let output_path = dir.path().join("people.json");
        converter.convert_to_file(&input, &output_path, &request).unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(written, json!([{"name": "Alice", "age": 30}, {"name": "Bob", "age": 25}]));
    }
}
