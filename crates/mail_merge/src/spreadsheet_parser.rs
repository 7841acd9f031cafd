//! Spreadsheet parser for mail merge data sources
//!
//! Workbooks are opened through calamine's auto-detecting reader, so the
//! same code path handles `.xlsx`, `.xlsm`, `.xls`, `.xlsb` and `.ods`.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::data_source::{format_number, ColumnDef, DataSource, DataSourceType, DataType, Record, Value};
use crate::error::{MailMergeError, Result};

/// File extensions the parser accepts
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Whether `file_name` has a spreadsheet extension (case-insensitive)
pub fn is_spreadsheet_file(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| SPREADSHEET_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Selector for which sheet to read from a workbook
#[derive(Debug, Clone, Default)]
pub enum SheetSelector {
    /// Select sheet by name
    ByName(String),
    /// Select sheet by index (0-based)
    ByIndex(usize),
    /// Select the first sheet
    #[default]
    First,
}

/// Range of cells to read from a sheet, in absolute sheet coordinates
#[derive(Debug, Clone)]
pub struct CellRange {
    /// Starting row (0-based, inclusive)
    pub start_row: u32,
    /// Starting column (0-based, inclusive)
    pub start_col: u32,
    /// Ending row (0-based, inclusive), None means read to the end
    pub end_row: Option<u32>,
    /// Ending column (0-based, inclusive), None means read to the end
    pub end_col: Option<u32>,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start_row: u32, start_col: u32, end_row: Option<u32>, end_col: Option<u32>) -> Self {
        Self {
            start_row,
            start_col,
            end_row,
            end_col,
        }
    }

    /// Create a range starting from a specific cell to the end
    pub fn from(start_row: u32, start_col: u32) -> Self {
        Self::new(start_row, start_col, None, None)
    }
}

/// Spreadsheet parser configuration
#[derive(Debug, Clone)]
pub struct SpreadsheetConfig {
    /// Sheet name or index to read from
    pub sheet: SheetSelector,
    /// Whether the first row contains headers
    pub has_header: bool,
    /// Range of cells to read (optional)
    pub range: Option<CellRange>,
    /// Whether to auto-detect data types
    pub auto_detect_types: bool,
    /// Whether to trim whitespace from string values
    pub trim_whitespace: bool,
    /// Skip empty rows
    pub skip_empty_rows: bool,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::First,
            has_header: true,
            range: None,
            auto_detect_types: true,
            trim_whitespace: true,
            skip_empty_rows: true,
        }
    }
}

impl SpreadsheetConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sheet to read by name
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet = SheetSelector::ByName(name.into());
        self
    }

    /// Set the sheet to read by index (0-based)
    pub fn with_sheet_index(mut self, index: usize) -> Self {
        self.sheet = SheetSelector::ByIndex(index);
        self
    }

    /// Set whether the first row contains headers
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the cell range to read
    pub fn with_range(mut self, range: CellRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Set whether to auto-detect data types
    pub fn with_auto_detect(mut self, auto_detect: bool) -> Self {
        self.auto_detect_types = auto_detect;
        self
    }

    /// Set whether to trim whitespace
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim_whitespace = trim;
        self
    }

    /// Set whether to skip empty rows
    pub fn with_skip_empty_rows(mut self, skip: bool) -> Self {
        self.skip_empty_rows = skip;
        self
    }
}

/// Parser that turns one worksheet into a [`DataSource`]
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetParser {
    config: SpreadsheetConfig,
}

impl SpreadsheetParser {
    /// Create a new parser with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new parser with custom configuration
    pub fn with_config(config: SpreadsheetConfig) -> Self {
        Self { config }
    }

    /// Parse a workbook file and return a DataSource
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<DataSource> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MailMergeError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path).map_err(|e| {
            MailMergeError::SpreadsheetParse(format!("Failed to open workbook: {}", e))
        })?;

        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("spreadsheet")
            .to_string();

        let sheet_name = self.get_sheet_name(&workbook)?;
        let source_type = DataSourceType::Spreadsheet {
            path: Some(path.display().to_string()),
            sheet: sheet_name.clone(),
        };

        self.parse_workbook(&mut workbook, &sheet_name, id, source_type)
    }

    /// Parse a workbook held in memory and return a DataSource
    pub fn parse_bytes(&self, data: &[u8], id: impl Into<String>) -> Result<DataSource> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| {
            MailMergeError::SpreadsheetParse(format!("Failed to read workbook from bytes: {}", e))
        })?;

        let sheet_name = self.get_sheet_name(&workbook)?;
        let source_type = DataSourceType::Spreadsheet {
            path: None,
            sheet: sheet_name.clone(),
        };

        self.parse_workbook(&mut workbook, &sheet_name, id.into(), source_type)
    }

    /// Get the sheet name based on the selector
    fn get_sheet_name<RS: Read + Seek>(&self, workbook: &Sheets<RS>) -> Result<String> {
        let sheet_names = workbook.sheet_names();

        if sheet_names.is_empty() {
            return Err(MailMergeError::EmptyDataSource(
                "Workbook has no sheets".to_string(),
            ));
        }

        match &self.config.sheet {
            SheetSelector::ByName(name) => {
                if sheet_names.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(MailMergeError::SpreadsheetParse(format!(
                        "Sheet '{}' not found. Available sheets: {:?}",
                        name, sheet_names
                    )))
                }
            }
            SheetSelector::ByIndex(index) => {
                sheet_names.get(*index).cloned().ok_or_else(|| {
                    MailMergeError::SpreadsheetParse(format!(
                        "Sheet index {} out of range. Workbook has {} sheets",
                        index,
                        sheet_names.len()
                    ))
                })
            }
            SheetSelector::First => Ok(sheet_names[0].clone()),
        }
    }

    fn parse_workbook<RS: Read + Seek>(
        &self,
        workbook: &mut Sheets<RS>,
        sheet_name: &str,
        id: String,
        source_type: DataSourceType,
    ) -> Result<DataSource> {
        let range = workbook.worksheet_range(sheet_name).map_err(|e| {
            MailMergeError::SpreadsheetParse(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;

        let data_source = self.parse_range(&range, id, source_type)?;
        tracing::debug!(
            sheet = sheet_name,
            columns = data_source.column_count(),
            records = data_source.record_count(),
            "Parsed spreadsheet"
        );
        Ok(data_source)
    }

    /// Parse a range of cells into a DataSource
    fn parse_range(
        &self,
        range: &Range<Data>,
        id: String,
        source_type: DataSourceType,
    ) -> Result<DataSource> {
        let mut data_source = DataSource::new(id, source_type);

        // A blank sheet is a table with no rows
        let (Some((first_row, first_col)), Some((last_row, last_col))) = (range.start(), range.end()) else {
            return Ok(data_source);
        };

        // Bounds are absolute sheet coordinates
        let (start_row, start_col, end_row, end_col) = match &self.config.range {
            Some(cell_range) => (
                cell_range.start_row,
                cell_range.start_col,
                cell_range.end_row.unwrap_or(last_row),
                cell_range.end_col.unwrap_or(last_col),
            ),
            None => (first_row, first_col, last_row, last_col),
        };

        if start_row > end_row || start_col > end_col {
            return Ok(data_source);
        }

        let headers: Vec<String> = if self.config.has_header {
            self.extract_headers(range, start_row, start_col, end_col)
        } else {
            (start_col..=end_col)
                .enumerate()
                .map(|(i, _)| format!("Column{}", i + 1))
                .collect()
        };

        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(MailMergeError::DuplicateColumn(header.clone()));
            }
        }

        let data_start_row = if self.config.has_header {
            start_row.saturating_add(1)
        } else {
            start_row
        };

        let mut raw_rows: Vec<Vec<Data>> = Vec::new();
        for row_idx in data_start_row..=end_row {
            let row: Vec<Data> = (start_col..=end_col)
                .map(|col_idx| range.get_value((row_idx, col_idx)).cloned().unwrap_or(Data::Empty))
                .collect();

            if self.config.skip_empty_rows && row.iter().all(|cell| matches!(cell, Data::Empty)) {
                continue;
            }

            raw_rows.push(row);
        }

        let column_types = if self.config.auto_detect_types {
            detect_column_types(&headers, &raw_rows)
        } else {
            vec![DataType::Text; headers.len()]
        };

        for (i, header) in headers.iter().enumerate() {
            let data_type = column_types.get(i).copied().unwrap_or(DataType::Text);
            data_source.add_column(ColumnDef::new(header.clone(), data_type));
        }

        for raw_row in raw_rows {
            let mut record = Record::new();
            for (i, cell) in raw_row.iter().enumerate() {
                if let Some(header) = headers.get(i) {
                    record.insert(header.clone(), self.cell_to_value(cell));
                }
            }
            data_source.add_record(record);
        }

        Ok(data_source)
    }

    /// Extract headers from the first row
    fn extract_headers(
        &self,
        range: &Range<Data>,
        row_idx: u32,
        start_col: u32,
        end_col: u32,
    ) -> Vec<String> {
        (start_col..=end_col)
            .enumerate()
            .map(|(i, col_idx)| match range.get_value((row_idx, col_idx)) {
                Some(Data::String(s)) => {
                    let header = if self.config.trim_whitespace {
                        s.trim().to_string()
                    } else {
                        s.clone()
                    };
                    if header.is_empty() {
                        format!("Column{}", i + 1)
                    } else {
                        header
                    }
                }
                Some(Data::Int(n)) => n.to_string(),
                Some(Data::Float(n)) => format_number(*n),
                Some(Data::Bool(b)) => b.to_string(),
                Some(Data::DateTime(dt)) => {
                    excel_datetime_value(dt.as_f64(), dt.is_duration()).to_string_value()
                }
                Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.clone(),
                Some(Data::Error(e)) => format!("#ERROR:{:?}", e),
                Some(Data::Empty) | None => format!("Column{}", i + 1),
            })
            .collect()
    }

    /// Convert a cell to our Value type
    fn cell_to_value(&self, cell: &Data) -> Value {
        match cell {
            Data::Empty => Value::Null,
            Data::String(s) => {
                let text = if self.config.trim_whitespace {
                    s.trim().to_string()
                } else {
                    s.clone()
                };

                if self.config.auto_detect_types && is_null_like(&text) {
                    Value::Null
                } else {
                    Value::Text(text)
                }
            }
            Data::Int(n) => Value::Number(*n as f64),
            // Floats stay numbers even when they look like date serials
            Data::Float(n) => Value::Number(*n),
            Data::Bool(b) => Value::Boolean(*b),
            Data::DateTime(dt) => excel_datetime_value(dt.as_f64(), dt.is_duration()),
            Data::DateTimeIso(s) => match try_parse_iso_datetime(s) {
                Some(datetime) => datetime_value(datetime),
                None => Value::Text(s.clone()),
            },
            Data::DurationIso(s) => Value::Text(s.clone()),
            Data::Error(e) => Value::Text(format!("#ERROR:{:?}", e)),
        }
    }
}

fn is_null_like(text: &str) -> bool {
    text.is_empty()
        || text.eq_ignore_ascii_case("null")
        || text.eq_ignore_ascii_case("na")
        || text.eq_ignore_ascii_case("n/a")
        || text.eq_ignore_ascii_case("#n/a")
}

/// Detect column types from raw data
fn detect_column_types(headers: &[String], rows: &[Vec<Data>]) -> Vec<DataType> {
    (0..headers.len())
        .map(|col_idx| detect_column_type(rows, col_idx))
        .collect()
}

/// Detect the data type for a single column
fn detect_column_type(rows: &[Vec<Data>], col_idx: usize) -> DataType {
    let mut has_number = false;
    let mut has_date = false;
    let mut has_boolean = false;
    let mut has_text = false;

    for cell in rows.iter().filter_map(|row| row.get(col_idx)) {
        match cell {
            Data::Empty => {}
            Data::String(s) => {
                if !is_null_like(s.trim()) {
                    has_text = true;
                }
            }
            Data::Int(_) | Data::Float(_) => has_number = true,
            Data::Bool(_) => has_boolean = true,
            Data::DateTime(_) | Data::DateTimeIso(_) => has_date = true,
            Data::DurationIso(_) | Data::Error(_) => has_text = true,
        }
    }

    match (has_text, has_number, has_date, has_boolean) {
        (false, true, false, false) => DataType::Number,
        (false, false, true, false) => DataType::Date,
        (false, false, false, true) => DataType::Boolean,
        // Empty and mixed columns are text
        _ => DataType::Text,
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert an Excel serial (1900 date system) to a date and time of day.
///
/// Returns `None` for negative, non-finite or out-of-range serials.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial >= i64::MAX as f64 {
        return None;
    }
    let days = serial.floor() as i64;
    let seconds = ((serial - serial.floor()) * SECONDS_PER_DAY).round() as i64;

    // Serials past 60 count the fictitious 1900-02-29
    let excel_epoch = if days > 60 {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    };
    excel_epoch
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

/// Value of a date-formatted numeric cell.
///
/// Serials below one day are times of day, whole serials are dates and the
/// rest keep both parts. Durations render as elapsed `h:mm:ss`. Serials that
/// map to no representable date stay numbers.
fn excel_datetime_value(serial: f64, is_duration: bool) -> Value {
    if is_duration {
        return match format_duration(serial) {
            Some(text) => Value::Text(text),
            None => Value::Number(serial),
        };
    }
    match excel_serial_to_datetime(serial) {
        Some(datetime) if serial < 1.0 => Value::Time(datetime.time()),
        Some(datetime) => datetime_value(datetime),
        None => Value::Number(serial),
    }
}

/// A date when the time part is midnight, otherwise a datetime
fn datetime_value(datetime: NaiveDateTime) -> Value {
    if datetime.time() == NaiveTime::MIN {
        Value::Date(datetime.date())
    } else {
        Value::DateTime(datetime)
    }
}

/// Format a duration given in days as `h:mm:ss`
fn format_duration(days: f64) -> Option<String> {
    let seconds = days * SECONDS_PER_DAY;
    if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
        return None;
    }
    let total = seconds.round() as i64;
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    Some(format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total / 60) % 60,
        total % 60
    ))
}

/// Try to parse an ISO date or datetime string
fn try_parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
    ];
    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            s.split('T')
                .next()
                .and_then(|date_part| NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Get list of sheet names from a workbook file
pub fn get_sheet_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MailMergeError::FileNotFound(path.display().to_string()));
    }

    let workbook = open_workbook_auto(path).map_err(|e| {
        MailMergeError::SpreadsheetParse(format!("Failed to open workbook: {}", e))
    })?;

    Ok(workbook.sheet_names())
}

/// Get list of sheet names from workbook bytes
pub fn get_sheet_names_from_bytes(data: &[u8]) -> Result<Vec<String>> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(data)).map_err(|e| {
        MailMergeError::SpreadsheetParse(format!("Failed to read workbook from bytes: {}", e))
    })?;

    Ok(workbook.sheet_names())
}
