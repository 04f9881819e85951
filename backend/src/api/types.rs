//! REST API types for frontend integration.
//!
//! All bodies are camelCase JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cache::{CachedWorkbook, SheetSelection};
use crate::models::{CombineMode, ConversionOptions, JsonFormat, SheetInfo, ValidationReport};
use crate::parser::SourceKind;
use crate::transform::pipeline::{ConversionOutput, ConvertRequest};
use crate::transform::preview::DEFAULT_PREVIEW_ROWS;

/// Sheet metadata plus its normalized headers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    #[serde(flatten)]
    pub info: SheetInfo,
    pub headers: Vec<String>,
}

/// Response sent after an upload was decoded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Id to reference the cached workbook in later requests.
    pub workbook_id: String,
    pub file_name: Option<String>,
    pub kind: SourceKind,
    pub sheets: Vec<SheetSummary>,
}

impl UploadResponse {
    pub fn new(workbook: &CachedWorkbook, file_name: Option<String>) -> Self {
        let sheets = workbook
            .infos
            .iter()
            .zip(&workbook.sheets)
            .map(|(info, sheet)| SheetSummary {
                info: info.clone(),
                headers: sheet.headers.clone(),
            })
            .collect();

        Self {
            workbook_id: workbook.source.clone(),
            file_name,
            kind: workbook.kind,
            sheets,
        }
    }
}

/// `POST /api/convert` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertBody {
    pub workbook_id: String,
    /// Sheets to convert, in order. Defaults to the first sheet.
    #[serde(default)]
    pub sheets: Option<Vec<String>>,
    #[serde(default)]
    pub all_sheets: bool,
    #[serde(default)]
    pub combine: CombineMode,
    #[serde(default)]
    pub format: JsonFormat,
    #[serde(default)]
    pub options: ConversionOptions,
}

impl ConvertBody {
    pub fn request(&self) -> ConvertRequest {
        ConvertRequest {
            options: self.options.clone(),
            format: self.format,
            sheets: SheetSelection::from_names(
                self.sheets.clone().unwrap_or_default(),
                self.all_sheets,
            ),
            combine: self.combine,
        }
    }
}

/// Response of a successful conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub job_id: String,
    /// Always "ready" on success.
    pub status: String,
    /// Formatted document text.
    pub content: String,
    pub documents: usize,
    pub sheets: Vec<String>,
    pub suggested_file_name: String,
}

impl From<ConversionOutput> for ConvertResponse {
    fn from(output: ConversionOutput) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            content: output.content,
            documents: output.documents,
            sheets: output.sheets,
            suggested_file_name: output.suggested_file_name,
        }
    }
}

/// `POST /api/validate` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateBody {
    pub workbook_id: String,
    /// Defaults to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    pub column: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub sheet: String,
    /// `null` when the column is absent or the sheet has no data rows.
    pub report: Option<ValidationReport>,
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

/// `POST /api/preview` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBody {
    pub workbook_id: String,
    /// Defaults to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_preview_rows")]
    pub rows: usize,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputShape;

    #[test]
    fn test_convert_body_defaults() {
        let body: ConvertBody = serde_json::from_value(json!({"workbookId": "abc"})).unwrap();
        let request = body.request();
        assert_eq!(request.sheets, SheetSelection::First);
        assert_eq!(request.combine, CombineMode::Concat);
        assert_eq!(request.format, JsonFormat::Array);
        assert_eq!(request.options, ConversionOptions::default());
    }

    #[test]
    fn test_convert_body_full() {
        let body: ConvertBody = serde_json::from_value(json!({
            "workbookId": "abc",
            "sheets": ["Q1", "Q2"],
            "combine": "by-sheet",
            "format": "comma-newline",
            "options": {"shape": "grouped", "groupByColumn": "dept", "startRow": 2}
        }))
        .unwrap();
        let request = body.request();
        assert_eq!(request.sheets, SheetSelection::Named(vec!["Q1".into(), "Q2".into()]));
        assert_eq!(request.combine, CombineMode::BySheet);
        assert_eq!(request.format, JsonFormat::CommaNewline);
        assert_eq!(request.options.shape, OutputShape::Grouped);
        assert_eq!(request.options.start_row, 2);
    }

    #[test]
    fn test_upload_response_shape() {
        let workbook = CachedWorkbook::decode("staff.csv", b"name,dept\nAlice,X").unwrap();
        let response = UploadResponse::new(&workbook, Some("staff.csv".into()));
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["workbookId"], "staff.csv");
        assert_eq!(value["kind"], "csv");
        assert_eq!(value["sheets"][0]["name"], "staff");
        assert_eq!(value["sheets"][0]["rowCount"], 2);
        assert_eq!(value["sheets"][0]["headers"], json!(["name", "dept"]));
    }

    #[test]
    fn test_preview_body_defaults() {
        let body: PreviewBody = serde_json::from_value(json!({"workbookId": "abc"})).unwrap();
        assert_eq!(body.rows, DEFAULT_PREVIEW_ROWS);
        assert!(body.sheet.is_none());
    }

    #[test]
    fn test_error_response() {
        let value = error_response("boom");
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "boom");
    }
}
