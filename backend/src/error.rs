//! Error types for the sheetjson conversion pipeline.
//!
//! - [`DecodeError`] - Spreadsheet/CSV decoding errors
//! - [`ConvertError`] - Configuration errors raised by the shape transformer
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP API errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Decoding Errors
// =============================================================================

/// Errors while turning source bytes into raw grids.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read the source.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a spreadsheet the decoder understands.
    #[error("Invalid spreadsheet: {0}")]
    Spreadsheet(String),

    /// Delimited text could not be parsed.
    #[error("Invalid CSV: {0}")]
    Csv(String),

    /// The workbook has no sheets at all.
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// A requested sheet does not exist.
    #[error("Sheet \"{0}\" does not exist")]
    SheetNotFound(String),
}

// =============================================================================
// Conversion (configuration) Errors
// =============================================================================

/// Configuration errors raised while shaping a sheet.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Grouped shape requested without a grouping column.
    #[error("Grouped output requires a groupByColumn")]
    MissingGroupColumn,

    /// The grouping column is not one of the sheet headers.
    #[error("Group column '{0}' is not a header of this sheet")]
    GroupColumnNotFound(String),

    /// A sheet inside a multi-sheet conversion failed.
    #[error("Sheet '{sheet}': {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    /// Attach the name of the sheet being converted.
    pub fn in_sheet(self, sheet: impl Into<String>) -> Self {
        ConvertError::Sheet {
            sheet: sheet.into(),
            source: Box::new(self),
        }
    }
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Decoding error.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Convert(#[from] ConvertError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown workbook id.
    #[error("Workbook not found: {0}")]
    WorkbookNotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DecodeError> for ServerError {
    fn from(err: DecodeError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

impl From<ConvertError> for ServerError {
    fn from(err: ConvertError) -> Self {
        ServerError::Pipeline(err.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for shape transformations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let decode_err = DecodeError::SheetNotFound("Data".into());
        let pipeline_err: PipelineError = decode_err.into();
        assert!(pipeline_err.to_string().contains("Data"));

        let convert_err = ConvertError::GroupColumnNotFound("dept".into());
        let pipeline_err: PipelineError = convert_err.into();
        assert!(pipeline_err.to_string().contains("dept"));
    }

    #[test]
    fn test_sheet_error_names_sheet() {
        let err = ConvertError::GroupColumnNotFound("dept".into()).in_sheet("Q2");
        let msg = err.to_string();
        assert!(msg.contains("Q2"));
        assert!(msg.contains("dept"));
    }
}
