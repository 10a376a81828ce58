// VendHub CLI - spreadsheet ingestion, record queries and export

mod exit_codes;
mod logging;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;

use vendhub_config::settings::DATABASE_ENV;
use vendhub_config::Settings;
use vendhub_core::ingest::MemorySink;
use vendhub_core::{
    check_extension, ingest, parse_path, period_label, validate_structure, IngestError, IngestSummary,
};
use vendhub_io::xlsx::ExportOptions;
use vendhub_io::{export_filename, ExportError};
use vendhub_store::{RecordFilter, RecordQuery, RecordStore, StoreError};

use exit_codes::{
    EXIT_ERROR, EXIT_IO, EXIT_MALFORMED, EXIT_NOT_FOUND, EXIT_NO_DATA, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "vhub")]
#[command(about = "Ingest spreadsheets into a deduplicated, date-indexed record store")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Record database (overrides settings)
    #[arg(long, global = true, env = DATABASE_ENV)]
    db: Option<PathBuf>,

    /// Settings file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show info-level logs (RUST_LOG honoured)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all logs
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest an .xlsx/.xls file into the record store
    #[command(after_help = "\
Examples:
  vhub ingest sales-march.xlsx
  vhub ingest export.xlsx --name 'March sales.xlsx' --json
  vhub ingest sales.xlsx --dry-run")]
    Ingest {
        /// Spreadsheet to ingest
        file: PathBuf,

        /// Name to store the upload under (default: the file name)
        #[arg(long)]
        name: Option<String>,

        /// Parse and dedup in memory without touching the database
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },

    /// Report per-column type statistics for a spreadsheet
    Validate {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// List stored records, newest date first
    #[command(after_help = "\
Examples:
  vhub records --period 2024-03
  vhub records --search cola --page 2 --size 100
  vhub records --from 2024-01-01 --to 2024-03-31 --json")]
    Records {
        #[command(flatten)]
        filter: FilterArgs,

        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size, 1-500 (default from settings)
        #[arg(long)]
        size: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show record counts per period
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// List uploaded files
    Files {
        #[arg(long)]
        json: bool,
    },

    /// Show one uploaded file
    File {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Delete an uploaded file and all of its records
    DeleteFile { id: i64 },

    /// Export matching records to xlsx or csv
    #[command(after_help = "\
Examples:
  vhub export --period 2024-03
  vhub export --search cola --format csv -o cola.csv")]
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,

        /// Output path (default: timestamped file in the current directory)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Case-insensitive text search across all fields
    #[arg(long)]
    search: Option<String>,

    /// Period, YYYY-MM
    #[arg(long)]
    period: Option<String>,

    /// Earliest date (inclusive), YYYY-MM-DD
    #[arg(long = "from")]
    date_from: Option<NaiveDate>,

    /// Latest date (inclusive), YYYY-MM-DD
    #[arg(long = "to")]
    date_to: Option<NaiveDate>,
}

impl FilterArgs {
    fn into_filter(self) -> Result<RecordFilter, CliError> {
        if let Some(period) = &self.period {
            if period_label(period).is_none() {
                return Err(CliError::args(format!("invalid period '{}'", period))
                    .with_hint("periods look like 2024-03"));
            }
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(CliError::args(format!("--from {} is after --to {}", from, to)));
            }
        }
        Ok(RecordFilter {
            search: self.search.filter(|s| !s.is_empty()),
            period: self.period,
            date_from: self.date_from,
            date_to: self.date_to,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Resolved settings and database location for one invocation.
struct Context {
    settings: Settings,
    db_path: PathBuf,
}

impl Context {
    fn open_store(&self) -> Result<RecordStore, CliError> {
        RecordStore::open(&self.db_path).map_err(CliError::store)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    logging::init(cli.verbose, cli.quiet, settings.log_level.as_deref());

    let db_path = settings.database_path(cli.db.as_deref());
    log::debug!("using database {}", db_path.display());
    let ctx = Context { settings, db_path };

    let result = match cli.command {
        Commands::Ingest { file, name, dry_run, json } => cmd_ingest(&ctx, &file, name, dry_run, json),
        Commands::Validate { file, json } => cmd_validate(&file, json),
        Commands::Records { filter, page, size, json } => cmd_records(&ctx, filter, page, size, json),
        Commands::Stats { json } => cmd_stats(&ctx, json),
        Commands::Files { json } => cmd_files(&ctx, json),
        Commands::File { id, json } => cmd_file(&ctx, id, json),
        Commands::DeleteFile { id } => cmd_delete_file(&ctx, id),
        Commands::Export { filter, format, output } => cmd_export(&ctx, filter, format, output),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn ingest(err: IngestError) -> Self {
        let code = match &err {
            IngestError::Malformed(_) | IngestError::NoDataRows | IngestError::UnsupportedFileType(_) => {
                EXIT_MALFORMED
            }
            IngestError::Io(_) => EXIT_IO,
            IngestError::Sink(_) => EXIT_ERROR,
        };
        let hint = match &err {
            IngestError::Malformed(_) => {
                Some("the first sheet needs a header row and at least one data row".to_string())
            }
            IngestError::UnsupportedFileType(_) => Some("save the sheet as .xlsx and retry".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    pub fn store(err: StoreError) -> Self {
        let code = match &err {
            StoreError::NotFound { .. } => EXIT_NOT_FOUND,
            StoreError::InvalidQuery(_) => EXIT_USAGE,
            StoreError::Io(_) => EXIT_IO,
            StoreError::Sqlite(_) | StoreError::Json(_) => EXIT_ERROR,
        };
        Self { code, message: err.to_string(), hint: None }
    }

    pub fn export(err: ExportError) -> Self {
        let code = match &err {
            ExportError::NoData => EXIT_NO_DATA,
            ExportError::Io(_) => EXIT_IO,
            ExportError::Xlsx(_) | ExportError::Csv(_) => EXIT_ERROR,
        };
        let hint = match &err {
            ExportError::NoData => Some("loosen the filters or check `vhub stats`".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text).map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// ingest
// ============================================================================

fn upload_name(file: &Path, name: Option<String>) -> String {
    name.unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string())
    })
}

fn cmd_ingest(ctx: &Context, file: &Path, name: Option<String>, dry_run: bool, json: bool) -> Result<(), CliError> {
    let filename = upload_name(file, name);
    check_extension(&filename).map_err(CliError::ingest)?;

    let grid = parse_path(file).map_err(CliError::ingest)?;
    if grid.is_empty() {
        return Err(CliError::ingest(IngestError::NoDataRows));
    }

    if dry_run {
        let mut sink = MemorySink::default();
        let summary = ingest(&grid, &mut sink).map_err(CliError::ingest)?;
        if json {
            return print_json(&json!({
                "filename": filename,
                "dry_run": true,
                "summary": summary,
                "records": sink.records,
            }));
        }
        print_ingest_summary(&filename, None, &summary);
        return Ok(());
    }

    let mut store = ctx.open_store()?;
    let mut writer = store
        .begin_file(&filename, &grid.headers, grid.rows.len())
        .map_err(CliError::store)?;
    let summary = ingest(&grid, &mut writer).map_err(CliError::ingest)?;
    let info = writer.commit().map_err(CliError::store)?;

    if json {
        return print_json(&json!({ "file": info, "summary": summary }));
    }
    print_ingest_summary(&filename, Some(info.id), &summary);
    Ok(())
}

fn print_ingest_summary(filename: &str, file_id: Option<i64>, summary: &IngestSummary) {
    let target = match file_id {
        Some(id) => format!("{} (file {})", filename, id),
        None => format!("{} (dry run)", filename),
    };
    println!(
        "Ingested {}: {} rows, {} added, {} duplicate{}, {} dated",
        target,
        summary.rows_read,
        summary.records_added,
        summary.duplicates_skipped,
        if summary.duplicates_skipped == 1 { "" } else { "s" },
        summary.dated_records,
    );
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(file: &Path, json: bool) -> Result<(), CliError> {
    let grid = parse_path(file).map_err(CliError::ingest)?;
    let report = validate_structure(&grid.headers, &grid.rows);

    if json {
        return print_json(&report);
    }

    println!(
        "{} columns, {} rows, {} empty cells, dates: {}",
        report.total_columns,
        report.total_rows,
        report.empty_cells,
        if report.has_dates { "yes" } else { "no" }
    );
    println!();
    println!("{:<24} {:>8} {:>8} {:>8}", "column", "numeric", "text", "date");
    for (name, counts) in &report.column_types {
        println!("{:<24} {:>8} {:>8} {:>8}", name, counts.numeric, counts.text, counts.date);
    }
    Ok(())
}

// ============================================================================
// records / stats
// ============================================================================

fn cmd_records(
    ctx: &Context,
    filter: FilterArgs,
    page: u32,
    size: Option<u32>,
    json: bool,
) -> Result<(), CliError> {
    let query = RecordQuery {
        filter: filter.into_filter()?,
        page,
        size: size.unwrap_or(ctx.settings.default_page_size),
    };
    let store = ctx.open_store()?;
    let result = store.query(&query).map_err(CliError::store)?;

    if json {
        return print_json(&result);
    }

    for record in &result.data {
        let data = serde_json::to_string(&record.data).map_err(|e| CliError::io(e.to_string()))?;
        println!(
            "{:>6}  {:<10}  {:<7}  {}",
            record.id,
            record.date_field.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            record.period.as_deref().unwrap_or("-"),
            data
        );
    }
    println!(
        "page {}/{} ({} record{})",
        result.page,
        result.pages.max(1),
        result.total,
        if result.total == 1 { "" } else { "s" }
    );
    Ok(())
}

fn cmd_stats(ctx: &Context, json: bool) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let stats = store.stats().map_err(CliError::store)?;

    if json {
        return print_json(&stats);
    }

    println!("Files:   {}", stats.total_files);
    println!("Records: {} ({} unique)", stats.total_records, stats.unique_records);
    if !stats.periods.is_empty() {
        println!();
        for p in &stats.periods {
            println!("  {}  {:<16} {:>8}", p.period, p.label, p.count);
        }
    }
    Ok(())
}

// ============================================================================
// files
// ============================================================================

fn cmd_files(ctx: &Context, json: bool) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let files = store.list_files().map_err(CliError::store)?;

    if json {
        return print_json(&files);
    }
    if files.is_empty() {
        println!("No files uploaded");
        return Ok(());
    }
    for f in &files {
        println!("{:>6}  {}  {:>6} rows  {}", f.id, f.uploaded_at, f.row_count, f.filename);
    }
    Ok(())
}

fn cmd_file(ctx: &Context, id: i64, json: bool) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let file = store
        .get_file(id)
        .map_err(|e| CliError::store(e).with_hint("list uploads with `vhub files`"))?;

    if json {
        return print_json(&file);
    }
    println!("id:        {}", file.id);
    println!("filename:  {}", file.filename);
    println!("rows:      {}", file.row_count);
    println!("uploaded:  {}", file.uploaded_at);
    println!("headers:   {}", file.headers.join(", "));
    Ok(())
}

fn cmd_delete_file(ctx: &Context, id: i64) -> Result<(), CliError> {
    let mut store = ctx.open_store()?;
    let file = store
        .delete_file(id)
        .map_err(|e| CliError::store(e).with_hint("list uploads with `vhub files`"))?;
    println!("Deleted file {} ({})", file.id, file.filename);
    Ok(())
}

// ============================================================================
// export
// ============================================================================

fn cmd_export(
    ctx: &Context,
    filter: FilterArgs,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let filter = filter.into_filter()?;
    let store = ctx.open_store()?;
    let records = store.query_all(&filter).map_err(CliError::store)?;
    if records.is_empty() {
        return Err(CliError::export(ExportError::NoData));
    }

    let path = output.unwrap_or_else(|| {
        PathBuf::from(export_filename(
            &ctx.settings.export_filename_prefix,
            chrono::Local::now().naive_local(),
            format.extension(),
        ))
    });

    let rows = match format {
        ExportFormat::Xlsx => {
            let mut options = ExportOptions {
                sheet_title: ctx.settings.export_sheet_title.clone(),
                ..ExportOptions::default()
            };
            match ctx.settings.header_fill_rgb() {
                Some(rgb) => options.header_fill = rgb,
                None => log::warn!(
                    "ignoring invalid export.headerFill '{}'",
                    ctx.settings.export_header_fill
                ),
            }
            vendhub_io::xlsx::export_records_to_path(&records, &path, &options)
                .map_err(CliError::export)?
                .rows_exported
        }
        ExportFormat::Csv => vendhub_io::csv::export_records_to_path(&records, &path).map_err(CliError::export)?,
    };

    println!("Exported {} record{} to {}", rows, if rows == 1 { "" } else { "s" }, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn upload_name_defaults_to_file_name() {
        assert_eq!(upload_name(Path::new("/tmp/in/sales.xlsx"), None), "sales.xlsx");
        assert_eq!(upload_name(Path::new("x.xlsx"), Some("March.xlsx".into())), "March.xlsx");
    }

    #[test]
    fn error_codes() {
        assert_eq!(CliError::ingest(IngestError::NoDataRows).code, EXIT_MALFORMED);
        assert_eq!(CliError::ingest(IngestError::Io("x".into())).code, EXIT_IO);
        assert_eq!(CliError::store(StoreError::NotFound { kind: "file", id: 1 }).code, EXIT_NOT_FOUND);
        assert_eq!(CliError::store(StoreError::InvalidQuery("x".into())).code, EXIT_USAGE);
        assert_eq!(CliError::export(ExportError::NoData).code, EXIT_NO_DATA);
        assert_eq!(CliError::args("bad").code, EXIT_USAGE);
    }

    #[test]
    fn filter_args_are_checked() {
        let bad = FilterArgs { period: Some("2024-13".into()), ..FilterArgs::default() };
        assert_eq!(bad.into_filter().unwrap_err().code, EXIT_USAGE);

        let reversed = FilterArgs {
            date_from: NaiveDate::from_ymd_opt(2024, 3, 2),
            date_to: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..FilterArgs::default()
        };
        assert!(reversed.into_filter().is_err());

        let ok = FilterArgs {
            search: Some(String::new()),
            period: Some("2024-03".into()),
            ..FilterArgs::default()
        };
        let filter = ok.into_filter().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.period.as_deref(), Some("2024-03"));
    }
}
