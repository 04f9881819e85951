//! # sheetjson - spreadsheet to JSON conversion
//!
//! sheetjson turns Excel workbooks and delimited text into JSON documents:
//! one of four shapes, optional type inference, several sheets combined,
//! and three text framings (pretty array, newline-delimited, comma-newline).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ XLSX / CSV  │────▶│   Parser    │────▶│  Normalize  │────▶│ Shape+Merge │────▶│   Format    │
//! │   (bytes)   │     │ (raw grids) │     │  (headers)  │     │  (4 shapes) │     │ (text docs) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetjson::{ConvertRequest, Converter};
//! use std::path::Path;
//!
//! let mut converter = Converter::fs();
//! let output = converter.convert_file(Path::new("staff.xlsx"), &ConvertRequest::default())?;
//! println!("{}", output.content);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Environment-driven server configuration
//! - [`models`] - Sheets, options and reports
//! - [`parser`] - Spreadsheet and CSV decoding
//! - [`transform`] - Inference, normalization, shaping, combining, formatting, preview
//! - [`validation`] - Column duplicate audit
//! - [`cache`] - Session cache of normalized sheets
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Caching
pub mod cache;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConvertError, ConvertResult, DecodeError, DecodeResult, PipelineError, PipelineResult,
    ServerError, ServerResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CombineMode, ConversionOptions, DuplicateGroup, JsonFormat, NormalizedSheet, OutputShape,
    RawCell, RawGrid, RawRow, SheetInfo, ValidationReport,
};

// =============================================================================
// Re-exports - Decoding
// =============================================================================

pub use parser::{decode_workbook, DecodedWorkbook, RawSheet, SourceKind};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    combine_sheets, document_count, format_document, group_rows, infer, normalize_sheet,
    preview_sheet, transform, SheetPreview, DEFAULT_PREVIEW_ROWS, UNGROUPED_KEY,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::validate_column;

// =============================================================================
// Re-exports - Cache
// =============================================================================

pub use cache::{CachedWorkbook, SheetCache, SheetSelection};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    self, batch_request, convert_workbook, preview_workbook, BatchReport, ConversionOutput,
    ConvertRequest, Converter, FileReader, FileState, FileStatus, FileWriter, FsFileReader,
    FsFileWriter,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
    pub use crate::config::ServerConfig;
}
