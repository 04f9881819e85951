//! Transformation module.
//!
//! - Infer: cell type inference
//! - Normalize: raw grid to header-aligned sheet
//! - Shape / Grouper: one sheet to JSON in the requested shape
//! - Combine: several sheets into one document
//! - Format: JSON value to delimited text
//! - Preview: leading rows of a sheet
//! - Pipeline: file-level orchestration

pub mod combine;
pub mod format;
pub mod grouper;
pub mod infer;
pub mod normalize;
pub mod pipeline;
pub mod preview;
pub mod shape;

pub use combine::combine_sheets;
pub use format::{document_count, format_document};
pub use grouper::{group_rows, UNGROUPED_KEY};
pub use infer::infer;
pub use normalize::normalize_sheet;
pub use pipeline::*;
pub use preview::{preview_sheet, SheetPreview, DEFAULT_PREVIEW_ROWS};
pub use shape::transform;
