//! Spreadsheet decoding: raw bytes -> one raw grid per sheet.
//!
//! Zip (xlsx, xlsm, xlsb, ods) and OLE (xls) containers go through calamine.
//! Anything else is treated as delimited text with encoding and delimiter
//! auto-detection.
//!
//! Every non-empty cell is stringified so later stages see a consistent
//! representation regardless of the source format.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde::Serialize;
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::models::{RawGrid, SheetInfo};

/// Sheet name used for delimited text without a usable name hint.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Source container detected from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Spreadsheet,
    Csv,
}

/// One decoded sheet.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub info: SheetInfo,
    pub grid: RawGrid,
}

/// All sheets of a decoded source, in workbook order.
#[derive(Debug, Clone)]
pub struct DecodedWorkbook {
    pub kind: SourceKind,
    /// Detected text encoding (delimited text only).
    pub encoding: Option<String>,
    /// Detected delimiter (delimited text only).
    pub delimiter: Option<char>,
    pub sheets: Vec<RawSheet>,
}

impl DecodedWorkbook {
    pub fn sheet_infos(&self) -> Vec<SheetInfo> {
        self.sheets.iter().map(|s| s.info.clone()).collect()
    }
}

/// Detect the container type from magic bytes.
pub fn detect_kind(bytes: &[u8]) -> SourceKind {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        SourceKind::Spreadsheet
    } else {
        SourceKind::Csv
    }
}

/// Decode any supported source.
///
/// `name_hint` names the single sheet of a delimited-text source
/// (typically the file stem).
pub fn decode_workbook(bytes: &[u8], name_hint: Option<&str>) -> DecodeResult<DecodedWorkbook> {
    match detect_kind(bytes) {
        SourceKind::Spreadsheet => decode_spreadsheet(bytes),
        SourceKind::Csv => decode_csv(bytes, name_hint.unwrap_or(DEFAULT_SHEET_NAME)),
    }
}

// =============================================================================
// Spreadsheets (calamine)
// =============================================================================

/// Decode an xlsx/xls/xlsb/ods workbook held in memory.
pub fn decode_spreadsheet(bytes: &[u8]) -> DecodeResult<DecodedWorkbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| DecodeError::Spreadsheet(format!("sheet '{}': {}", name, e)))?;
        sheets.push(range_to_sheet(&name, &range));
    }

    Ok(DecodedWorkbook {
        kind: SourceKind::Spreadsheet,
        encoding: None,
        delimiter: None,
        sheets,
    })
}

fn range_to_sheet(name: &str, range: &Range<Data>) -> RawSheet {
    let (row_count, col_count) = match (range.start(), range.end()) {
        (Some(start), Some(end)) => (
            (end.0 - start.0 + 1) as usize,
            (end.1 - start.1 + 1) as usize,
        ),
        _ => (0, 0),
    };

    let grid = range
        .rows()
        .map(|row| row.iter().map(stringify_cell).collect())
        .collect();

    RawSheet {
        info: SheetInfo {
            name: name.to_string(),
            row_count,
            col_count,
        },
        grid,
    }
}

/// Render a spreadsheet cell the way it reads in the sheet.
pub fn stringify_cell(cell: &Data) -> Value {
    let text = match cell {
        Data::Empty => return Value::Null,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) if datetime.time() == chrono::NaiveTime::MIN => {
                datetime.format("%Y-%m-%d").to_string()
            }
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    };
    Value::String(text)
}

/// Integral floats print without a fractional part (`10.0` -> `"10"`).
fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "gb2312" | "gbk" | "gb18030" => "gb18030".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding label.
///
/// Unknown labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => enc.decode(bytes).0.into_owned(),
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Decode delimited text into a single-sheet workbook.
pub fn decode_csv(bytes: &[u8], sheet_name: &str) -> DecodeResult<DecodedWorkbook> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let grid = parse_delimited(&content, delimiter)?;

    let row_count = grid.len();
    let col_count = grid.iter().map(Vec::len).max().unwrap_or(0);

    Ok(DecodedWorkbook {
        kind: SourceKind::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        sheets: vec![RawSheet {
            info: SheetInfo {
                name: sheet_name.to_string(),
                row_count,
                col_count,
            },
            grid,
        }],
    })
}

/// Parse delimited text into a ragged grid. Empty fields become null.
pub fn parse_delimited(content: &str, delimiter: char) -> DecodeResult<RawGrid> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| DecodeError::Csv(format!("unsupported delimiter '{}'", delimiter)))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for (line_idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| DecodeError::Csv(format!("line {}: {}", line_idx + 1, e)))?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Value::Null
                    } else {
                        Value::String(field.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}
