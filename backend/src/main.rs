//! sheetjson CLI - convert spreadsheets and CSV files to JSON
//!
//! # Commands
//!
//! ```bash
//! sheetjson sheets book.xlsx                      # List sheets
//! sheetjson preview book.xlsx --rows 20           # First rows of a sheet
//! sheetjson convert book.xlsx --shape keyed-object # Convert to JSON (stdout)
//! sheetjson batch a.xlsx b.csv --format newline   # Convert files next to themselves
//! sheetjson validate book.xlsx --column email     # Duplicate/empty audit
//! sheetjson serve                                 # Start HTTP server (port 3000)
//! ```

use clap::{Args, Parser, Subcommand};
use sheetjson::api::logs::{LogLevel, LOG_BROADCASTER};
use sheetjson::server::ServerConfig;
use sheetjson::{
    batch_request, CombineMode, ConversionOptions, ConvertRequest, Converter, FileState,
    JsonFormat, OutputShape, SheetPreview, SheetSelection, ValidationReport,
    DEFAULT_PREVIEW_ROWS,
};
use sheetjson::models::cell_to_string;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetjson")]
#[command(about = "Convert spreadsheets and CSV files to JSON", long_about = None)]
struct Cli {
    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    Sheets {
        /// Input spreadsheet or CSV file
        input: PathBuf,
    },

    /// Show the first rows of a sheet
    Preview {
        /// Input spreadsheet or CSV file
        input: PathBuf,

        /// Sheet to preview (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Number of data rows to show
        #[arg(short, long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        rows: usize,
    },

    /// Convert a workbook to JSON
    Convert {
        /// Input spreadsheet or CSV file
        input: PathBuf,

        /// Sheet to convert (repeatable, default: first sheet)
        #[arg(short, long = "sheet")]
        sheets: Vec<String>,

        /// Convert every sheet
        #[arg(long)]
        all_sheets: bool,

        /// Keep sheets apart as {sheetName: result}
        #[arg(long)]
        by_sheet: bool,

        #[command(flatten)]
        conversion: ConversionArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert several files, each written next to its source as .json
    Batch {
        /// Input files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        conversion: ConversionArgs,
    },

    /// Report duplicate and empty values of a column
    Validate {
        /// Input spreadsheet or CSV file
        input: PathBuf,

        /// Column header to audit
        #[arg(short, long)]
        column: String,

        /// Sheet to audit (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SHEETJSON_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Flags shared by `convert` and `batch`.
#[derive(Args)]
struct ConversionArgs {
    /// JSON options file (camelCase keys); flags override it
    #[arg(long)]
    options: Option<PathBuf>,

    /// Output shape: array-of-objects, array-2d, keyed-object, grouped
    #[arg(long)]
    shape: Option<OutputShape>,

    /// Column to group by (grouped shape)
    #[arg(short, long)]
    group_by: Option<String>,

    /// Infer numbers, booleans and nulls
    #[arg(short, long)]
    types: bool,

    /// Drop rows whose cells are all empty
    #[arg(long)]
    skip_empty_rows: bool,

    /// First row to emit (0 includes the header row)
    #[arg(long)]
    start_row: Option<usize>,

    /// Rename a header in the output (OLD=NEW, repeatable)
    #[arg(short, long, value_parser = parse_rename)]
    rename: Vec<(String, String)>,

    /// Output framing: array, newline, comma-newline
    #[arg(short, long)]
    format: Option<JsonFormat>,
}

impl ConversionArgs {
    fn options(&self) -> Result<ConversionOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.options {
            Some(path) => ConversionOptions::from_json(&fs::read_to_string(path)?)?,
            None => ConversionOptions::default(),
        };

        if let Some(shape) = self.shape {
            options.shape = shape;
        }
        if let Some(column) = &self.group_by {
            options.group_by_column = Some(column.clone());
        }
        if self.types {
            options.use_type_conversion = true;
        }
        if self.skip_empty_rows {
            options.skip_empty_rows = true;
        }
        if let Some(start_row) = self.start_row {
            options.start_row = start_row;
        }
        options.header_mapping.extend(self.rename.iter().cloned());
        Ok(options)
    }

    fn format(&self) -> JsonFormat {
        self.format.unwrap_or_default()
    }
}

fn parse_rename(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((old, new)) if !old.is_empty() => Ok((old.to_string(), new.to_string())),
        _ => Err(format!("expected OLD=NEW, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo_level(LogLevel::Warning);
    }

    let result = match cli.command {
        Commands::Sheets { input } => cmd_sheets(&input),

        Commands::Preview { input, sheet, rows } => cmd_preview(&input, sheet.as_deref(), rows),

        Commands::Convert {
            input,
            sheets,
            all_sheets,
            by_sheet,
            conversion,
            output,
        } => cmd_convert(
            &input,
            SheetSelection::from_names(sheets, all_sheets),
            by_sheet,
            &conversion,
            output.as_deref(),
        ),

        Commands::Batch { inputs, conversion } => cmd_batch(&inputs, &conversion),

        Commands::Validate {
            input,
            column,
            sheet,
            json,
        } => cmd_validate(&input, &column, sheet.as_deref(), json),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_sheets(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut converter = Converter::fs();
    let workbook = converter.load(input)?;

    println!("📄 {} ({} sheet(s))", input.display(), workbook.sheets.len());
    for (info, sheet) in workbook.infos.iter().zip(&workbook.sheets) {
        println!(
            "  {:<24} {:>6} rows × {:>3} columns",
            info.name, info.row_count, info.col_count
        );
        if !sheet.headers.is_empty() {
            println!("     Columns: {}", sheet.headers.join(", "));
        }
    }
    Ok(())
}

fn cmd_preview(
    input: &Path,
    sheet: Option<&str>,
    rows: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut converter = Converter::fs();
    let preview = converter.preview(input, sheet, rows)?;
    print_preview(&preview);
    Ok(())
}

fn print_preview(preview: &SheetPreview) {
    println!(
        "📄 {} (showing {} / {} rows)",
        preview.sheet,
        preview.shown_rows(),
        preview.total_rows
    );
    println!("   #\t{}", preview.headers.join("\t"));
    for (idx, row) in preview.rows.iter().enumerate() {
        let cells: Vec<String> = row.iter().map(cell_to_string).collect();
        println!("   {}\t{}", idx + 1, cells.join("\t"));
    }
    if preview.is_truncated() {
        println!("   (only the first {} rows are shown)", preview.shown_rows());
    }
}

fn cmd_convert(
    input: &Path,
    sheets: SheetSelection,
    by_sheet: bool,
    conversion: &ConversionArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = ConvertRequest {
        options: conversion.options()?,
        format: conversion.format(),
        sheets,
        combine: if by_sheet {
            CombineMode::BySheet
        } else {
            CombineMode::Concat
        },
    };

    let mut converter = Converter::fs();
    match output {
        Some(path) => {
            converter.convert_to_file(input, path, &request)?;
        }
        None => {
            let result = converter.convert_file(input, &request)?;
            println!("{}", result.content);
        }
    }
    Ok(())
}

fn cmd_batch(
    inputs: &[PathBuf],
    conversion: &ConversionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = batch_request(conversion.options()?, conversion.format());
    let mut converter = Converter::fs();
    let report = converter.convert_batch(inputs, &request);

    println!("\n📊 Batch summary");
    for file in &report.files {
        match (file.state, &file.output, &file.error) {
            (FileState::Completed, Some(out), _) => println!(
                "  ✓ {} → {} ({} document(s))",
                file.path.display(),
                out.display(),
                file.documents
            ),
            (_, _, error) => println!(
                "  ✗ {}: {}",
                file.path.display(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    println!("  {} completed, {} failed", report.completed(), report.failed());

    if report.failed() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_validate(
    input: &Path,
    column: &str,
    sheet: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut converter = Converter::fs();
    let report = converter.validate_column(input, sheet, column)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match report {
        Some(report) => print_report(&report),
        None => println!("No data to validate for column '{}'", column),
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("✔️  Column '{}'", report.column);
    println!("   Data rows:        {}", report.total_data_rows);
    println!("   Unique values:    {}", report.unique_value_count);
    println!("   Duplicate values: {}", report.duplicate_value_count);
    println!("   Empty cells:      {}", report.empty_count);

    for dup in &report.duplicates {
        let rows: Vec<String> = dup.row_numbers.iter().map(|r| r.to_string()).collect();
        println!(
            "   • \"{}\" × {} (rows {})",
            dup.value,
            dup.occurrence_count,
            rows.join(", ")
        );
    }
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env();
    if let Some(port) = port {
        config = config.with_port(port);
    }
    sheetjson::server::start_server(config).await
}
